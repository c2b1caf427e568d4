// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：任务、结果与域名配置
/// - 服务（services）：域名注册表、限流与进度接口
///
/// 领域层不依赖任何具体的抓取或传输实现。
pub mod models;
pub mod services;
