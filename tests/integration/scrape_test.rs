// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{RecordingReporter, StaticRenderer};
use scrapeflow::config::settings::{BrowserSettings, ScrapeSettings};
use scrapeflow::domain::models::{
    DelayRange, DomainConfig, DomainOptions, RenderOptions, ScrapeJob, Selectors, StrategyType,
};
use scrapeflow::domain::services::progress::ProgressStatus;
use scrapeflow::domain::services::DomainRegistry;
use scrapeflow::engines::api_strategy::DirectApiStrategy;
use scrapeflow::engines::lightweight_strategy::LightweightStrategy;
use scrapeflow::engines::rendered_strategy::RenderedStrategy;
use scrapeflow::engines::reqwest_engine::ReqwestFetcher;
use scrapeflow::engines::{ScrapeOrchestrator, Strategies};
use scrapeflow::extractors::ExtractorChain;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATIC_SHELL: &str = r#"<html><head><title>Shop</title></head><body>
<div class="listing"><div class="card"><h2>Server rendered teaser</h2></div></div>
</body></html>"#;

fn rendered_listing() -> String {
    let cards: String = (0..4)
        .map(|i| format!(r#"<div class="card"><h2>Bike {i}</h2><a href="/bike/{i}">see</a><span class="price">1 2{i}0,00 €</span></div>"#))
        .collect();
    format!(r#"<html><head><title>Shop</title></head><body><div class="listing">{cards}</div></body></html>"#)
}

struct World {
    server: MockServer,
    renderer: StaticRenderer,
    reporter: Arc<RecordingReporter>,
    orchestrator: ScrapeOrchestrator,
}

async fn world(rendered_pages: impl FnOnce(&str) -> HashMap<String, String>) -> World {
    let server = MockServer::start().await;
    let settings = ScrapeSettings {
        lightweight_page_delay: DelayRange::new(0, 0),
        rendered_page_delay: DelayRange::new(0, 0),
        ..Default::default()
    };

    let host = server.uri().trim_start_matches("http://").to_string();
    let registry = Arc::new(DomainRegistry::new());
    registry.register_domain(
        DomainConfig::new(
            host,
            Selectors {
                title: Some("h2".into()),
                url: Some("a".into()),
                price: Some(".price".into()),
                ..Selectors::new(".card")
            },
        )
        .with_options(DomainOptions {
            render: Some(RenderOptions {
                scroll_delay_ms: 0,
                pause_after_scroll_ms: 0,
                ..Default::default()
            }),
            ..Default::default()
        }),
    );

    let renderer = StaticRenderer::new(rendered_pages(&server.uri()));
    let fetcher = Arc::new(ReqwestFetcher::new(&settings.user_agent).unwrap());
    let extractors = Arc::new(ExtractorChain::default());
    let reporter = Arc::new(RecordingReporter::default());
    let orchestrator = ScrapeOrchestrator::new(
        registry,
        Strategies {
            lightweight: Arc::new(LightweightStrategy::new(
                fetcher.clone(),
                extractors.clone(),
                settings.clone(),
            )),
            rendered: Arc::new(RenderedStrategy::new(
                Arc::new(renderer.clone()),
                extractors,
                settings.clone(),
                &BrowserSettings::default(),
            )),
            direct_api: Arc::new(DirectApiStrategy::new(fetcher, settings)),
        },
        reporter.clone(),
    )
    .with_renderer(Arc::new(renderer.clone()));

    World {
        server,
        renderer,
        reporter,
        orchestrator,
    }
}

#[tokio::test]
async fn test_client_rendered_shell_escalates_end_to_end() {
    let world = world(|uri| HashMap::from([(format!("{uri}/shop"), rendered_listing())])).await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATIC_SHELL))
        .expect(1)
        .mount(&world.server)
        .await;

    let job = ScrapeJob::new(format!("{}/shop", world.server.uri()));
    let data = world.orchestrator.scrape(&job).await.unwrap();

    assert_eq!(data.metadata.strategy_used, StrategyType::Rendered);
    assert_eq!(data.items.len(), 4);
    assert_eq!(data.title.as_deref(), Some("Shop"));
    assert_eq!(
        data.items[1].url.as_deref(),
        Some(format!("{}/bike/1", world.server.uri()).as_str())
    );
    assert_eq!(data.items[0].price.as_ref().and_then(|p| p.amount()), Some(1200.0));
    assert_eq!(world.renderer.opened.load(Ordering::SeqCst), 1);
    assert_eq!(world.renderer.closed.load(Ordering::SeqCst), 1);

    let statuses: Vec<ProgressStatus> = world
        .reporter
        .events
        .lock()
        .iter()
        .map(|e| e.status)
        .collect();
    assert!(statuses.contains(&ProgressStatus::Escalating));
    assert_eq!(statuses.last(), Some(&ProgressStatus::Completed));
}

#[tokio::test]
async fn test_static_listing_stays_lightweight() {
    let world = world(|_| HashMap::new()).await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rendered_listing()))
        .mount(&world.server)
        .await;

    let job = ScrapeJob::new(format!("{}/shop", world.server.uri()));
    let data = world.orchestrator.scrape(&job).await.unwrap();

    assert_eq!(data.metadata.strategy_used, StrategyType::Lightweight);
    assert_eq!(data.items.len(), 4);
    assert_eq!(data.metadata.pages_scraped, 1);
    assert_eq!(world.renderer.opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blocked_static_fetch_falls_back_to_browser() {
    let world = world(|uri| HashMap::from([(format!("{uri}/shop"), rendered_listing())])).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&world.server)
        .await;

    let job = ScrapeJob::new(format!("{}/shop", world.server.uri()));
    let data = world.orchestrator.scrape(&job).await.unwrap();

    assert_eq!(data.metadata.strategy_used, StrategyType::Rendered);
    assert_eq!(data.items.len(), 4);
}

#[tokio::test]
async fn test_both_attempts_failing_surfaces_render_error() {
    let world = world(|_| HashMap::new()).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&world.server)
        .await;

    let job = ScrapeJob::new(format!("{}/shop", world.server.uri()));
    let err = world.orchestrator.scrape(&job).await.unwrap_err();

    assert_eq!(err.kind(), "render_failed");
    assert_eq!(world.renderer.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cleanup_closes_browser_once() {
    let world = world(|_| HashMap::new()).await;
    world.orchestrator.cleanup().await;
    world.orchestrator.cleanup().await;
    assert_eq!(world.renderer.shutdowns.load(Ordering::SeqCst), 1);
}
