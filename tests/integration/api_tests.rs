// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{items, FixedStrategy, RecordingReporter};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use scrapeflow::config::settings::Settings;
use scrapeflow::domain::models::StrategyType;
use scrapeflow::domain::services::rate_limiting_service::{RateLimitConfig, RateLimitingService};
use scrapeflow::domain::services::DomainRegistry;
use scrapeflow::engines::{ScrapeOrchestrator, Strategies};
use scrapeflow::infrastructure::services::InMemoryRateLimiter;
use scrapeflow::presentation::routes;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    lightweight: Arc<FixedStrategy>,
}

fn test_app(limit: u32) -> TestApp {
    let lightweight = FixedStrategy::new(StrategyType::Lightweight, items(3));
    let orchestrator = ScrapeOrchestrator::new(
        Arc::new(DomainRegistry::new()),
        Strategies {
            lightweight: lightweight.clone(),
            rendered: FixedStrategy::new(StrategyType::Rendered, items(5)),
            direct_api: FixedStrategy::new(StrategyType::DirectApi, items(1)),
        },
        Arc::new(RecordingReporter::default()),
    );
    let rate_limiter: Arc<dyn RateLimitingService> = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        limit,
        ..Default::default()
    }));
    let settings = Arc::new(Settings::defaults().unwrap());

    TestApp {
        router: routes::app(Arc::new(orchestrator), settings, rate_limiter),
        lightweight,
    }
}

fn scrape_request(body: Value, client: &str) -> Request<Body> {
    Request::builder()
        .uri("/v1/scrape")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("X-Forwarded-For", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 健康检查测试
#[tokio::test]
async fn health_check_works() {
    let app = test_app(10);

    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn scrape_endpoint_returns_scraped_data() {
    let app = test_app(10);

    let response = app
        .router
        .oneshot(scrape_request(
            json!({ "source": "shop.test", "query": "velo", "pageCount": 2 }),
            "198.51.100.1",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["metadata"]["strategyUsed"], "lightweight");
    assert_eq!(body["metadata"]["source"], "shop.test");
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert_eq!(app.lightweight.calls(), 1);
}

#[tokio::test]
async fn scrape_endpoint_rejects_invalid_page_count() {
    let app = test_app(10);

    let response = app
        .router
        .oneshot(scrape_request(
            json!({ "source": "shop.test", "pageCount": 0 }),
            "198.51.100.2",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.lightweight.calls(), 0);
}

#[tokio::test]
async fn scrape_endpoint_rate_limits_per_client() {
    let app = test_app(1);

    let first = app
        .router
        .clone()
        .oneshot(scrape_request(json!({ "source": "shop.test" }), "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .router
        .clone()
        .oneshot(scrape_request(json!({ "source": "shop.test" }), "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_client = app
        .router
        .oneshot(scrape_request(json!({ "source": "shop.test" }), "203.0.113.10"))
        .await
        .unwrap();
    assert_eq!(other_client.status(), StatusCode::OK);
}
