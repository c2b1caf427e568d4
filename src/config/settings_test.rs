// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::StrategyType;
use std::io::Write;

#[test]
fn test_defaults_are_complete() {
    let settings = Settings::defaults().unwrap();
    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.scrape.http_timeout_ms, 10_000);
    assert_eq!(settings.scrape.lightweight_page_delay, DelayRange::new(1000, 1500));
    assert_eq!(settings.scrape.rendered_page_delay, DelayRange::new(1000, 2000));
    assert_eq!(
        settings.browser.blocked_resource_types,
        vec!["image", "font", "media"]
    );
    assert!(settings.browser.remote_debugging_url.is_none());
    assert_eq!(settings.rate_limiting, RateLimitConfig::default());
    assert!(settings.domains.is_empty());
}

#[test]
fn test_file_overrides_defaults_and_registers_domains() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[scrape]
http_timeout_ms = 2500
strict_selector_wait = true

[scrape.rendered_page_delay]
min_ms = 10
max_ms = 20

[rate_limiting]
limit = 5
interval_ms = 10000

[[domains]]
domain = "shop.test"
requiresJavascript = true
defaultStrategy = "rendered"

[domains.selectors]
container = ".tile"
title = "h4"
nextPage = "a.next"
sku = ".sku"
"#
    )
    .unwrap();

    let settings = Settings::from_file(file.path()).unwrap();
    assert_eq!(settings.scrape.http_timeout_ms, 2500);
    assert!(settings.scrape.strict_selector_wait);
    assert_eq!(settings.scrape.rendered_page_delay, DelayRange::new(10, 20));
    assert_eq!(settings.rate_limiting.limit, 5);
    assert_eq!(settings.rate_limiting.cleanup_ms, 300_000);

    assert_eq!(settings.domains.len(), 1);
    let domain = &settings.domains[0];
    assert_eq!(domain.domain, "shop.test");
    assert!(domain.requires_javascript);
    assert_eq!(domain.default_strategy, StrategyType::Rendered);
    assert_eq!(domain.selectors.next_page(), Some("a.next"));
    assert_eq!(domain.selectors.extra("sku"), Some(".sku"));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Settings::from_file("/nonexistent/scrapeflow.toml").is_err());
}
