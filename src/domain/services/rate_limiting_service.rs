// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 限流配置（滑动窗口计数器）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// 是否启用限流
    pub enabled: bool,
    /// 每个窗口允许的请求数
    pub limit: u32,
    /// 窗口长度（毫秒）
    pub interval_ms: u64,
    /// 清理阈值（毫秒），窗口起点早于该时长的记录会被回收
    pub cleanup_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 100,
            interval_ms: 60_000,
            cleanup_ms: 300_000,
        }
    }
}

impl RateLimitConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn cleanup_horizon(&self) -> Duration {
        Duration::from_millis(self.cleanup_ms)
    }
}

/// 限流服务接口
#[async_trait]
pub trait RateLimitingService: Send + Sync {
    /// 检查并计数一次请求
    ///
    /// # 参数
    ///
    /// * `key` - 客户端标识（通常是IP）
    ///
    /// # 返回值
    ///
    /// 计数未超过上限时返回 true
    async fn check_rate_limit(&self, key: &str) -> bool;
}
