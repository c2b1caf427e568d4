// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeflow::config::settings::Settings;
use scrapeflow::domain::models::StrategyType;
use scrapeflow::domain::services::DomainRegistry;
use scrapeflow::utils::url_utils::normalize_domain;
use std::io::Write;

#[test]
fn unknown_domains_fall_back_to_generic() {
    let registry = DomainRegistry::new();
    for source in ["unknown-shop.io", "https://nothing.example/x", "", "localhost"] {
        assert_eq!(registry.get_config(source).domain, "*", "source {source}");
    }
}

#[test]
fn builtin_catalogue_resolves_aliases_and_subdomains() {
    let registry = DomainRegistry::new();
    assert_eq!(registry.get_config("ebay").domain, "ebay.fr");
    assert_eq!(registry.get_config("https://www.ebay.com/sch").domain, "ebay.com");
    assert_eq!(registry.get_config("m.autoscout24.fr").domain, "autoscout24.fr");
    assert_eq!(
        registry.get_config("leboncoin").default_strategy,
        StrategyType::DirectApi
    );
    assert!(registry.get_config("amazon").requires_javascript);
}

#[test]
fn configured_domains_are_registered_on_top_of_catalogue() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[[domains]]
domain = "https://www.Velos.test/"
requiresJavascript = true
defaultStrategy = "rendered"

[domains.selectors]
container = ".bike"
title = "h3"
nextPage = "a.next"
"#
    )
    .unwrap();

    let settings = Settings::from_file(file.path()).unwrap();
    let registry = DomainRegistry::new();
    for config in settings.domains {
        registry.register_domain(config);
    }

    let config = registry.get_config("shop.velos.test");
    assert_eq!(config.domain, "velos.test");
    assert_eq!(config.selectors.next_page(), Some("a.next"));
    assert!(registry.list_domains().contains(&"velos.test".to_string()));
    assert!(registry.list_domains().contains(&"amazon.fr".to_string()));
}

#[test]
fn normalization_is_idempotent() {
    for input in ["https://www.Example.com/search?q=1", "HTTP://shop.test", "www.a.b/c"] {
        let once = normalize_domain(input);
        assert_eq!(normalize_domain(&once), once);
    }
    assert_eq!(normalize_domain("https://www.Example.com/search?q=1"), "example.com");
}
