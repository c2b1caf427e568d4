// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde_json::{json, Value};
use url::Url;

use super::generic::absolute_search_url;
use super::{compile, element_text, extract_standard_fields, fill_extra_fields, first, CompiledSelectors, Extractor};
use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedItem, Selectors};
use crate::utils::url_utils::normalize_domain;

static RATING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+[.,]?\d*)").expect("valid regex"));

/// Amazon 提取器
pub struct AmazonExtractor;

/// 解析评分文本，例如 "4,5 sur 5 étoiles"
pub(crate) fn parse_rating(text: &str) -> Value {
    RATING
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .map(|v| json!(v))
        .unwrap_or_else(|| Value::String(text.to_string()))
}

impl Extractor for AmazonExtractor {
    fn name(&self) -> &'static str {
        "amazon"
    }

    fn can_handle(&self, source: &str) -> bool {
        source.contains("amazon")
    }

    fn build_url(
        &self,
        source: &str,
        query: &str,
        page: u32,
        _job: &ScrapeJob,
        config: &DomainConfig,
    ) -> String {
        if let Some(url) = absolute_search_url(source, query, page, "k", "page") {
            return url;
        }

        let domain = normalize_domain(source);
        let host = if domain.contains('.') {
            domain
        } else {
            config.domain.clone()
        };
        let url = format!("https://www.{}/s?k={}", host, urlencoding::encode(query));
        if page > 1 {
            format!("{}&page={}", url, page)
        } else {
            url
        }
    }

    fn extract_items(&self, document: &Html, selectors: &Selectors, page_url: &Url) -> Vec<ScrapedItem> {
        let compiled = CompiledSelectors::new(selectors);
        let rating = compile(selectors.extra("rating"));

        compiled
            .containers(document)
            .into_iter()
            .map(|container| {
                let mut item = extract_standard_fields(container, &compiled, page_url);
                if let Some(element) = first(container, rating.as_ref()) {
                    let text = element
                        .value()
                        .attr("aria-label")
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .or_else(|| element_text(element));
                    if let Some(text) = text {
                        item.set_field("rating", parse_rating(&text));
                    }
                }
                fill_extra_fields(container, &compiled, &mut item);
                item
            })
            .filter(ScrapedItem::is_meaningful)
            .collect()
    }
}
