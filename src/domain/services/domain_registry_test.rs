// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::{Selectors, StrategyType};

#[test]
fn test_exact_match_after_normalization() {
    let registry = DomainRegistry::new();
    let config = registry.get_config("https://www.eBay.fr/sch/i.html?_nkw=velo");
    assert_eq!(config.domain, "ebay.fr");
    assert_eq!(config.selectors.next_page(), Some(".pagination__next"));
}

#[test]
fn test_bare_alias_resolves_to_tld_variant() {
    let registry = DomainRegistry::new();
    assert_eq!(registry.get_config("autoscout24").domain, "autoscout24.fr");
    assert_eq!(registry.get_config("ebay").domain, "ebay.fr");
    assert_eq!(registry.get_config("LEBONCOIN").domain, "leboncoin.fr");
}

#[test]
fn test_subdomain_suffix_match() {
    let registry = DomainRegistry::new();
    let config = registry.get_config("m.autoscout24.fr/lst");
    assert_eq!(config.domain, "autoscout24.fr");
    assert!(config.requires_javascript);
}

#[test]
fn test_longest_key_wins_on_substring_match() {
    let registry = DomainRegistry::empty();
    registry.register_domain(DomainConfig::new("shop.test", Selectors::new(".a")));
    registry.register_domain(DomainConfig::new("eu.shop.test", Selectors::new(".b")));

    let config = registry.get_config("fr.eu.shop.test");
    assert_eq!(config.domain, "eu.shop.test");
}

#[test]
fn test_unknown_domain_gets_generic_fallback() {
    let registry = DomainRegistry::new();
    for source in ["unknown-site.org", "", "https://nothing.example/path"] {
        let config = registry.get_config(source);
        assert_eq!(config.domain, "*");
        assert!(config.selectors.container.contains("article"));
        assert_eq!(config.default_strategy, StrategyType::Lightweight);
    }
}

#[test]
fn test_register_domain_is_idempotent_upsert() {
    let registry = DomainRegistry::empty();
    let config = DomainConfig::new("https://www.Shop.test/", Selectors::new(".card"));
    registry.register_domain(config.clone());
    registry.register_domain(config);
    assert_eq!(registry.list_domains(), vec!["shop.test".to_string()]);

    registry.register_domain(DomainConfig::new("shop.test", Selectors::new(".tile")));
    assert_eq!(registry.get_config("shop.test").selectors.container, ".tile");
    assert_eq!(registry.list_domains().len(), 1);
}

#[test]
fn test_leboncoin_is_direct_api() {
    let registry = DomainRegistry::new();
    let config = registry.get_config("leboncoin.fr");
    assert!(config.is_direct_api());
    assert_eq!(config.options.api.as_ref().map(|a| a.page_size), Some(35));
}

#[test]
fn test_list_domains_contains_builtin_catalogue() {
    let registry = DomainRegistry::new();
    assert_eq!(
        registry.list_domains(),
        vec!["amazon.fr", "autoscout24.fr", "ebay.com", "ebay.fr", "leboncoin.fr"]
    );
}
