// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 域名配置注册表（domain_registry）：站点到选择器和选项的映射
/// - 内置站点目录（builtin_domains）
/// - 限流服务接口（rate_limiting_service）：入站请求的准入控制
/// - 进度上报接口（progress）：抓取过程中的进度事件
pub mod builtin_domains;
pub mod domain_registry;
pub mod progress;
pub mod rate_limiting_service;

pub use domain_registry::DomainRegistry;
