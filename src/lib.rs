// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心数据结构、域名注册表和服务接口
pub mod domain;

/// 引擎模块
///
/// 抓取策略、分页、升级判断与编排
pub mod engines;

/// 提取器模块
///
/// 按站点家族构建URL并从文档中提取条目
pub mod extractors;

/// 基础设施模块
///
/// 限流、进度上报与指标
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和中间件
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
