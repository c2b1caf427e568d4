// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 提取器模块
///
/// 每个站点家族一个实现，负责：
/// - 构造搜索/列表页URL（含分页与地理参数）
/// - 从解析后的文档中按选择器提取条目
///
/// 通过首个匹配的责任链选择，最具体的家族在前，通用提取器兜底
pub mod amazon;
pub mod autoscout24;
pub mod ebay;
pub mod generic;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedItem, Selectors};
use crate::utils::price::clean_price;
use crate::utils::url_utils::resolve_href;

pub use amazon::AmazonExtractor;
pub use autoscout24::AutoScout24Extractor;
pub use ebay::EbayExtractor;
pub use generic::GenericExtractor;

/// 站点提取器特质
pub trait Extractor: Send + Sync {
    /// 提取器名称
    fn name(&self) -> &'static str;

    /// 廉价的子串判断
    fn can_handle(&self, source: &str) -> bool;

    /// 构造指定页的URL
    ///
    /// 纯函数：相同输入得到相同URL，页码从1开始
    ///
    /// # 参数
    ///
    /// * `source` - 任务的原始 source
    /// * `query` - 去除空白后的查询
    /// * `page` - 页码（>= 1）
    /// * `job` - 任务（地理参数）
    /// * `config` - 解析得到的域名配置
    fn build_url(
        &self,
        source: &str,
        query: &str,
        page: u32,
        job: &ScrapeJob,
        config: &DomainConfig,
    ) -> String;

    /// 从文档中提取条目
    ///
    /// 缺失的选择器或字段直接省略，不会报错
    fn extract_items(&self, document: &Html, selectors: &Selectors, page_url: &Url)
        -> Vec<ScrapedItem>;

    /// 提取器是否自行推进分页（例如只改URL中的页码）
    ///
    /// 返回 true 时跳过“下一页”按钮检测
    fn handle_pagination(&self, _current_page: u32, _page_count: u32, _job: &ScrapeJob) -> bool {
        false
    }
}

/// 提取器责任链
pub struct ExtractorChain {
    extractors: Vec<Box<dyn Extractor>>,
    fallback: GenericExtractor,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(AutoScout24Extractor),
            Box::new(EbayExtractor),
            Box::new(AmazonExtractor),
        ])
    }
}

impl ExtractorChain {
    /// 使用给定的站点提取器创建责任链，通用提取器总是最后一环
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self {
            extractors,
            fallback: GenericExtractor,
        }
    }

    /// 选出第一个能处理该 source 的提取器
    pub fn select(&self, source: &str) -> &dyn Extractor {
        let lowered = source.to_lowercase();
        let extractor = self
            .extractors
            .iter()
            .map(|e| e.as_ref())
            .find(|e| e.can_handle(&lowered))
            .unwrap_or(&self.fallback);
        debug!("Selected extractor {} for {}", extractor.name(), source);
        extractor
    }
}

/// 编译选择器，非法选择器视为未配置
pub(crate) fn compile(raw: Option<&str>) -> Option<Selector> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!("Ignoring invalid selector {:?}: {:?}", raw, e);
            None
        }
    }
}

/// 编译后的常用字段选择器
pub(crate) struct CompiledSelectors {
    pub container: Option<Selector>,
    pub title: Option<Selector>,
    pub description: Option<Selector>,
    pub price: Option<Selector>,
    pub url: Option<Selector>,
    pub image: Option<Selector>,
    pub extras: Vec<(String, Selector)>,
}

impl CompiledSelectors {
    pub fn new(selectors: &Selectors) -> Self {
        Self {
            container: compile(Some(&selectors.container)),
            title: compile(selectors.title.as_deref()),
            description: compile(selectors.description.as_deref()),
            price: compile(selectors.price.as_deref()),
            url: compile(selectors.url.as_deref()),
            image: compile(selectors.image.as_deref()),
            extras: selectors
                .field_extras()
                .filter_map(|(key, raw)| compile(Some(raw)).map(|s| (key.to_string(), s)))
                .collect(),
        }
    }

    /// 所有条目容器
    pub fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        match &self.container {
            Some(selector) => document.select(selector).collect(),
            None => Vec::new(),
        }
    }
}

/// 容器内第一个匹配元素
pub(crate) fn first<'a>(scope: ElementRef<'a>, selector: Option<&Selector>) -> Option<ElementRef<'a>> {
    selector.and_then(|s| scope.select(s).next())
}

/// 元素文本（合并空白），为空时返回 None
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 链接：元素自身的 href，或其内第一个带 href 的链接
pub(crate) fn element_link(element: ElementRef<'_>, base: &Url) -> Option<String> {
    if let Some(href) = element.value().attr("href") {
        return resolve_href(base, href);
    }
    let anchor = Selector::parse("a[href]").ok()?;
    element
        .select(&anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_href(base, href))
}

/// 图片地址：src、data-src，最后取 srcset 中的第一个地址
pub(crate) fn element_image(element: ElementRef<'_>, base: &Url) -> Option<String> {
    let img = if element.value().name() == "img" {
        element
    } else {
        let selector = Selector::parse("img").ok()?;
        element.select(&selector).next()?
    };
    let attrs = img.value();
    attrs
        .attr("src")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| attrs.attr("data-src").filter(|s| !s.trim().is_empty()))
        .or_else(|| {
            attrs
                .attr("srcset")
                .and_then(|set| set.split(',').next())
                .and_then(|first| first.split_whitespace().next())
        })
        .and_then(|src| resolve_href(base, src))
}

/// 按通用规则填充标准字段
pub(crate) fn extract_standard_fields(
    container: ElementRef<'_>,
    compiled: &CompiledSelectors,
    base: &Url,
) -> ScrapedItem {
    ScrapedItem {
        title: first(container, compiled.title.as_ref()).and_then(element_text),
        description: first(container, compiled.description.as_ref()).and_then(element_text),
        price: first(container, compiled.price.as_ref())
            .and_then(element_text)
            .and_then(|text| clean_price(&text)),
        url: first(container, compiled.url.as_ref()).and_then(|e| element_link(e, base)),
        image: first(container, compiled.image.as_ref()).and_then(|e| element_image(e, base)),
        ..Default::default()
    }
}

/// 把站点特有选择器的文本写入条目，已有的字段不覆盖
pub(crate) fn fill_extra_fields(
    container: ElementRef<'_>,
    compiled: &CompiledSelectors,
    item: &mut ScrapedItem,
) {
    for (key, selector) in &compiled.extras {
        if item.fields.contains_key(key) {
            continue;
        }
        if let Some(text) = first(container, Some(selector)).and_then(element_text) {
            item.fields.insert(key.clone(), Value::String(text));
        }
    }
}

/// 文档中是否存在匹配元素
pub fn has_element(document: &Html, selector: &str) -> bool {
    compile(Some(selector)).is_some_and(|s| document.select(&s).next().is_some())
}

/// 文档 `<title>`
pub fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document.select(&selector).next().and_then(element_text)
}
