// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::domain::models::StrategyType;
use crate::engines::escalation::EscalationReason;

/// 安装 Prometheus 导出器
///
/// 端口被占用等安装失败只记录告警，不影响抓取
pub fn init_metrics(listen_address: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = listen_address.parse()?;

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return Ok(());
    }

    describe_counter!("scrape_jobs_total", "Strategy runs started, by strategy");
    describe_counter!(
        "scrape_escalations_total",
        "Escalations from lightweight to rendered, by reason"
    );
    describe_counter!("scrape_failures_total", "Failed strategy runs, by strategy");
    describe_counter!("scrape_items_total", "Items returned by completed jobs");
    describe_histogram!("scrape_duration_ms", "End-to-end job duration in milliseconds");
    describe_counter!(
        "rate_limit_rejections_total",
        "Admission checks rejected by the rate limiter"
    );

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

pub fn record_job_started(strategy: StrategyType) {
    metrics::counter!("scrape_jobs_total", "strategy" => strategy.as_str()).increment(1);
}

pub fn record_escalation(reason: &EscalationReason) {
    metrics::counter!("scrape_escalations_total", "reason" => reason.label()).increment(1);
}

pub fn record_failure(strategy: StrategyType) {
    metrics::counter!("scrape_failures_total", "strategy" => strategy.as_str()).increment(1);
}

/// 记录一次完成的抓取
pub fn record_completion(item_count: usize, duration_ms: u64) {
    metrics::counter!("scrape_items_total").increment(item_count as u64);
    metrics::histogram!("scrape_duration_ms").record(duration_ms as f64);
}
