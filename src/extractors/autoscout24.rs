// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::generic::absolute_search_url;
use super::{
    compile, element_image, element_link, element_text, fill_extra_fields, first,
    CompiledSelectors, Extractor,
};
use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedItem, Selectors};
use crate::utils::price::{clean_price, parse_amount};
use crate::utils::url_utils::normalize_domain;

static PAGE_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"([&?])page=\d+").expect("valid regex"));
static DEALER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)(?:\s+•\s+(?:FR-(\d+)\s+)?(.*))?$").expect("valid regex")
});

/// AutoScout24 提取器
///
/// 分页通过修改URL中的页码完成，不依赖“下一页”按钮
pub struct AutoScout24Extractor;

/// 卖家信息，例如 "Victor Lenoble • FR-01630 SAINT-GENIS-POUILLY"
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DealerInfo {
    pub fullname: String,
    pub postal_code: String,
    pub city: String,
}

pub(crate) fn split_dealer_line(line: &str) -> DealerInfo {
    let line = line.trim();
    match DEALER_LINE.captures(line) {
        Some(caps) => {
            let group = |i: usize| caps.get(i).map(|m| m.as_str().trim()).unwrap_or("");
            let city = group(3);
            DealerInfo {
                fullname: group(1).to_string(),
                postal_code: group(2).to_string(),
                city: if city.is_empty() { line } else { city }.to_string(),
            }
        }
        None => DealerInfo {
            fullname: String::new(),
            postal_code: String::new(),
            city: line.to_string(),
        },
    }
}

fn append_geo(url: &mut String, job: &ScrapeJob) {
    if let Some(zip) = job.zip() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&format!("zip={}", urlencoding::encode(zip)));
        if let Some(radius) = job.zip_radius() {
            url.push_str(&format!("&zipr={}", urlencoding::encode(radius)));
        }
    }
}

impl Extractor for AutoScout24Extractor {
    fn name(&self) -> &'static str {
        "autoscout24"
    }

    fn can_handle(&self, source: &str) -> bool {
        source.contains("autoscout24")
    }

    fn build_url(
        &self,
        source: &str,
        query: &str,
        page: u32,
        job: &ScrapeJob,
        config: &DomainConfig,
    ) -> String {
        if let Some(url) = absolute_search_url(source, query, page, "q", "page") {
            return url;
        }

        if query.is_empty() {
            if let Some(default_url) = config.options.default_search_url.as_deref() {
                let mut url = default_url.to_string();
                append_geo(&mut url, job);
                if page > 1 {
                    url = PAGE_PARAM
                        .replace(&url, format!("${{1}}page={}", page).as_str())
                        .into_owned();
                }
                debug!("AutoScout24 default search url: {}", url);
                return url;
            }
        }

        let domain = normalize_domain(source);
        let host = if domain.contains('.') {
            domain
        } else {
            config.domain.clone()
        };

        if !query.is_empty() {
            let mut url = format!("https://www.{}/lst?q={}", host, urlencoding::encode(query));
            append_geo(&mut url, job);
            if page > 1 {
                url.push_str(&format!("&page={}", page));
            }
            return url;
        }

        let mut url = config
            .options
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://www.{}/lst", host));
        append_geo(&mut url, job);
        if page > 1 {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&format!("page={}", page));
        }
        url
    }

    fn extract_items(&self, document: &Html, selectors: &Selectors, page_url: &Url) -> Vec<ScrapedItem> {
        let compiled = CompiledSelectors::new(selectors);
        let fallback_title = compile(selectors.extra("fallbackTitle"));
        let fallback_price = compile(selectors.extra("fallbackPrice"));
        let mileage = compile(selectors.extra("mileage"));
        let city = compile(selectors.extra("city"));
        let any_link = compile(Some("a[href]"));

        compiled
            .containers(document)
            .into_iter()
            .filter_map(|container| {
                let mut item = ScrapedItem::default();

                if compiled.title.is_some() {
                    if let Some(title_el) = first(container, compiled.title.as_ref())
                        .or_else(|| first(container, fallback_title.as_ref()))
                    {
                        item.title = element_text(title_el);
                        if title_el.value().name() == "a" {
                            item.url = element_link(title_el, page_url);
                        }
                    }
                }

                if compiled.price.is_some() {
                    item.price = first(container, compiled.price.as_ref())
                        .or_else(|| first(container, fallback_price.as_ref()))
                        .and_then(element_text)
                        .and_then(|text| clean_price(&text));
                }

                if item.url.is_none() && compiled.url.is_some() {
                    item.url = first(container, compiled.url.as_ref())
                        .or_else(|| first(container, any_link.as_ref()))
                        .and_then(|e| element_link(e, page_url));
                }

                item.image = first(container, compiled.image.as_ref())
                    .and_then(|e| element_image(e, page_url));
                item.description = first(container, compiled.description.as_ref())
                    .and_then(element_text);

                if let Some(text) = first(container, mileage.as_ref()).and_then(element_text) {
                    let value = parse_amount(&text)
                        .map(|km| json!(km))
                        .unwrap_or(Value::String(text));
                    item.set_field("mileage", value);
                }

                if let Some(line) = first(container, city.as_ref()).and_then(element_text) {
                    let dealer = split_dealer_line(&line);
                    item.set_field("originalDealer", line);
                    item.set_field("fullname", dealer.fullname);
                    item.set_field("postalCode", dealer.postal_code);
                    item.set_field("city", dealer.city);
                }

                fill_extra_fields(container, &compiled, &mut item);

                item.is_meaningful().then_some(item)
            })
            .collect()
    }

    fn handle_pagination(&self, current_page: u32, page_count: u32, _job: &ScrapeJob) -> bool {
        if current_page < page_count {
            debug!("AutoScout24: url pagination to page {}", current_page + 1);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "autoscout24_test.rs"]
mod tests;
