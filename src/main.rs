// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use scrapeflow::config::settings::Settings;
use scrapeflow::domain::services::rate_limiting_service::RateLimitingService;
use scrapeflow::domain::services::DomainRegistry;
use scrapeflow::engines::ScrapeOrchestrator;
use scrapeflow::infrastructure::metrics;
use scrapeflow::infrastructure::progress::TracingProgressReporter;
use scrapeflow::infrastructure::services::InMemoryRateLimiter;
use scrapeflow::presentation::routes;
use scrapeflow::utils::telemetry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Arc::new(Settings::new()?);

    // 2. Initialize logging
    telemetry::init_telemetry(settings.logging.json);
    info!("Starting scrapeflow...");

    // 3. Initialize Prometheus Metrics
    if settings.metrics.enabled {
        metrics::init_metrics(&settings.metrics.listen_address)?;
    }

    // 4. Domain registry: built-in catalogue plus configured domains
    let registry = Arc::new(DomainRegistry::new());
    for config in settings.domains.iter().cloned() {
        registry.register_domain(config);
    }
    info!("Registered domains: {}", registry.list_domains().join(", "));

    // 5. Engine
    let orchestrator = Arc::new(ScrapeOrchestrator::from_settings(
        &settings,
        registry,
        Arc::new(TracingProgressReporter),
    )?);

    // 6. Rate limiter
    let rate_limiter: Arc<dyn RateLimitingService> =
        Arc::new(InMemoryRateLimiter::new(settings.rate_limiting.clone()));
    info!(
        "Rate limiter initialized ({} requests per {}ms, enabled: {})",
        settings.rate_limiting.limit,
        settings.rate_limiting.interval_ms,
        settings.rate_limiting.enabled
    );

    // 7. Start HTTP server
    let app = routes::app(orchestrator.clone(), settings.clone(), rate_limiter);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    // 8. Release the shared browser session
    orchestrator.cleanup().await;
    info!("Shutdown complete");

    served.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
