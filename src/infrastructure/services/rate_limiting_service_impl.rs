// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Instant;
use tracing::warn;

use crate::domain::services::rate_limiting_service::{RateLimitConfig, RateLimitingService};

/// 单个客户端的窗口记录
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// 进程内滑动窗口限流器
///
/// 每个键独立加锁（DashMap 分片锁），不同键的调用互不阻塞；
/// 清理与计数都在分片锁内完成，不会删除正在递增的记录
pub struct InMemoryRateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    config: RateLimitConfig,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// 以给定时间点执行一次检查
    ///
    /// # 参数
    ///
    /// * `key` - 客户端标识
    /// * `now` - 当前时间
    ///
    /// # 返回值
    ///
    /// 当前窗口内计数不超过上限时返回 true
    pub fn check_rate_limit_at(&self, key: &str, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        self.cleanup_expired(now);

        let interval = self.config.interval();
        let count = {
            let mut entry = self
                .entries
                .entry(key.to_string())
                .or_insert(RateLimitEntry {
                    count: 0,
                    window_start: now,
                });
            if now.saturating_duration_since(entry.window_start) > interval {
                entry.count = 1;
                entry.window_start = now;
            } else {
                entry.count = entry.count.saturating_add(1);
            }
            entry.count
        };

        let allowed = count <= self.config.limit;
        if !allowed {
            warn!(
                "Rate limit exceeded for {}: {} requests in current window (limit {})",
                key, count, self.config.limit
            );
            metrics::counter!("rate_limit_rejections_total").increment(1);
        }
        allowed
    }

    /// 回收窗口起点早于清理阈值的记录
    fn cleanup_expired(&self, now: Instant) {
        let horizon = self.config.cleanup_horizon();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) <= horizon);
    }

    /// 当前跟踪的客户端数
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl RateLimitingService for InMemoryRateLimiter {
    async fn check_rate_limit(&self, key: &str) -> bool {
        self.check_rate_limit_at(key, Instant::now())
    }
}
