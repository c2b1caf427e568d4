// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{ConnectInfo, Extension, Request},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::domain::services::rate_limiting_service::RateLimitingService;

/// 客户端标识：`X-Forwarded-For` 的第一跳，否则为对端地址
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// 速率限制中间件
///
/// 超出窗口配额时返回 429
///
/// # 参数
///
/// * `rate_limiter` - 速率限制服务扩展
/// * `request` - HTTP请求
/// * `next` - 下一个中间件
pub async fn rate_limit_middleware(
    Extension(rate_limiter): Extension<Arc<dyn RateLimitingService>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    if !rate_limiter.check_rate_limit(&key).await {
        warn!("Rejecting request from {}: rate limit exceeded", key);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "success": false, "error": "Too many requests" })),
        )
            .into_response();
    }

    next.run(request).await
}
