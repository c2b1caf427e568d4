// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeflow::domain::services::rate_limiting_service::{RateLimitConfig, RateLimitingService};
use scrapeflow::infrastructure::services::InMemoryRateLimiter;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn limiter(limit: u32, interval_ms: u64) -> InMemoryRateLimiter {
    InMemoryRateLimiter::new(RateLimitConfig {
        enabled: true,
        limit,
        interval_ms,
        cleanup_ms: 300_000,
    })
}

#[test]
fn sixth_call_rejected_until_window_elapses() {
    let limiter = limiter(5, 10_000);
    let start = Instant::now();

    for i in 0..5 {
        assert!(limiter.check_rate_limit_at("client", start + Duration::from_millis(i * 100)));
    }
    assert!(!limiter.check_rate_limit_at("client", start + Duration::from_millis(600)));
    assert!(limiter.check_rate_limit_at("client", start + Duration::from_millis(10_001)));
}

#[tokio::test]
async fn concurrent_clients_have_independent_windows() {
    let limiter = Arc::new(limiter(20, 60_000));

    let handles: Vec<_> = (0..8)
        .map(|client| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let key = format!("10.0.0.{client}");
                let mut allowed = 0;
                for _ in 0..25 {
                    if limiter.check_rate_limit(&key).await {
                        allowed += 1;
                    }
                }
                allowed
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 20);
    }
    assert_eq!(limiter.tracked_keys(), 8);
}
