// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Html;
use url::Url;

use super::{extract_standard_fields, fill_extra_fields, CompiledSelectors, Extractor};
use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedItem, Selectors};
use crate::utils::url_utils::{is_absolute_http, normalize_domain};

/// 通用提取器
///
/// 任何 source 都能处理，放在责任链最后
pub struct GenericExtractor;

/// 在绝对URL上写入查询词和页码
///
/// 同名参数会被替换，空查询保留URL中原有的查询词；第 1 页不带页码参数
fn paginate_absolute(
    url: &str,
    query_key: &str,
    query: &str,
    page_key: &str,
    page: u32,
) -> Option<String> {
    let mut url = Url::parse(url.trim()).ok()?;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != page_key && (query.is_empty() || k != query_key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !query.is_empty() {
        pairs.push((query_key.to_string(), query.to_string()));
    }
    if page > 1 {
        pairs.push((page_key.to_string(), page.to_string()));
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    Some(url.to_string())
}

/// source 或 query 为完整URL时的分页URL
///
/// # 参数
///
/// * `query_key` - 站点的查询词参数名
/// * `page_key` - 站点的页码参数名
///
/// # 返回值
///
/// 两者都不是可解析的绝对URL时返回 None
pub(crate) fn absolute_search_url(
    source: &str,
    query: &str,
    page: u32,
    query_key: &str,
    page_key: &str,
) -> Option<String> {
    if is_absolute_http(source) {
        if let Some(url) = paginate_absolute(source, query_key, query, page_key, page) {
            return Some(url);
        }
    }
    if is_absolute_http(query) {
        return paginate_absolute(query, query_key, "", page_key, page);
    }
    None
}

/// 带分页参数的通用搜索URL
pub(crate) fn generic_search_url(source: &str, query: &str, page: u32) -> String {
    if let Some(url) = absolute_search_url(source, query, page, "q", "page") {
        return url;
    }

    let url = format!(
        "https://{}/search?q={}",
        normalize_domain(source),
        urlencoding::encode(query)
    );
    if page > 1 {
        format!("{}&page={}", url, page)
    } else {
        url
    }
}

impl Extractor for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn can_handle(&self, _source: &str) -> bool {
        true
    }

    fn build_url(
        &self,
        source: &str,
        query: &str,
        page: u32,
        _job: &ScrapeJob,
        _config: &DomainConfig,
    ) -> String {
        generic_search_url(source, query, page)
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
