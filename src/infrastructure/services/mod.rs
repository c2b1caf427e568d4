// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供领域服务接口的进程内实现
pub mod rate_limiting_service_impl;

pub use rate_limiting_service_impl::InMemoryRateLimiter;
