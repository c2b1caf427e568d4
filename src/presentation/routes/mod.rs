// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::settings::Settings;
use crate::domain::services::rate_limiting_service::RateLimitingService;
use crate::engines::ScrapeOrchestrator;
use crate::presentation::handlers::scrape_handler;
use crate::presentation::middleware::rate_limit_middleware::rate_limit_middleware;

/// 创建应用路由
///
/// 抓取端点受限流中间件保护，健康检查不受限
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let protected_routes = Router::new()
        .route("/v1/scrape", post(scrape_handler::scrape))
        .layer(axum::middleware::from_fn(rate_limit_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// 装配完整应用：路由、共享状态与请求追踪
pub fn app(
    orchestrator: Arc<ScrapeOrchestrator>,
    settings: Arc<Settings>,
    rate_limiter: Arc<dyn RateLimitingService>,
) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .layer(Extension(orchestrator))
        .layer(Extension(settings))
        .layer(Extension(rate_limiter))
}

/// 健康检查端点
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
