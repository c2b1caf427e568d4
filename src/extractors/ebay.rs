// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Html;
use url::Url;

use super::generic::absolute_search_url;
use super::{extract_standard_fields, fill_extra_fields, CompiledSelectors, Extractor};
use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedItem, Selectors};
use crate::utils::url_utils::normalize_domain;

/// eBay 提取器
pub struct EbayExtractor;

impl EbayExtractor {
    fn host(source: &str) -> String {
        let domain = normalize_domain(source);
        if domain.contains('.') {
            domain
        } else {
            "ebay.fr".to_string()
        }
    }
}

impl Extractor for EbayExtractor {
    fn name(&self) -> &'static str {
        "ebay"
    }

    fn can_handle(&self, source: &str) -> bool {
        source.contains("ebay")
    }

    fn build_url(
        &self,
        source: &str,
        query: &str,
        page: u32,
        job: &ScrapeJob,
        _config: &DomainConfig,
    ) -> String {
        if let Some(url) = absolute_search_url(source, query, page, "_nkw", "_pgn") {
            return url;
        }

        let mut url = format!(
            "https://www.{}/sch/i.html?_nkw={}",
            Self::host(source),
            urlencoding::encode(query)
        );
        if let Some(zip) = job.zip() {
            url.push_str(&format!("&_stpos={}", urlencoding::encode(zip)));
            if let Some(radius) = job.zip_radius() {
                url.push_str(&format!("&_sadis={}", urlencoding::encode(radius)));
            }
        }
        if page > 1 {
            url.push_str(&format!("&_pgn={}", page));
        }
        url
    }

    fn extract_items(&self, document: &Html, selectors: &Selectors, page_url: &Url) -> Vec<ScrapedItem> {
        let compiled = CompiledSelectors::new(selectors);
        compiled
            .containers(document)
            .into_iter()
            .map(|container| {
                let mut item = extract_standard_fields(container, &compiled, page_url);
                fill_extra_fields(container, &compiled, &mut item);
                item
            })
            .filter(ScrapedItem::is_meaningful)
            .collect()
    }
}
