// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// 抓取策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// 静态抓取 + 解析
    #[default]
    Lightweight,
    /// 无头浏览器渲染
    Rendered,
    /// 直连上游 JSON API
    DirectApi,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Lightweight => "lightweight",
            StrategyType::Rendered => "rendered",
            StrategyType::DirectApi => "direct_api",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 选择器集合
///
/// `container` 必填，其余字段选择器可选；站点特有的选择器保存在 `extra` 中
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selectors {
    /// 条目容器
    pub container: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 下一页按钮
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    /// 站点特有的选择器
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Selectors {
    /// 只用于结构判断、不作为条目字段导出的键
    pub const STRUCTURAL_KEYS: &'static [&'static str] =
        &["pagination", "fallbackTitle", "fallbackPrice"];

    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Default::default()
        }
    }

    /// 读取站点特有的选择器，空串视为未配置
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// 需要作为条目字段导出的额外选择器
    pub fn field_extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extra
            .iter()
            .filter(|(k, v)| !Self::STRUCTURAL_KEYS.contains(&k.as_str()) && !v.trim().is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 非空的下一页选择器
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// 随机延迟区间（毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayRange {
    #[serde(alias = "min_ms")]
    pub min_ms: u64,
    #[serde(alias = "max_ms")]
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// 保证 min <= max
    pub fn normalized(self) -> Self {
        if self.min_ms <= self.max_ms {
            self
        } else {
            Self::new(self.max_ms, self.min_ms)
        }
    }
}

/// 浏览器渲染调优参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// 每次滚动的像素
    pub scroll_distance: u32,
    /// 最大滚动次数
    pub max_scrolls: u32,
    /// 两次滚动之间的间隔
    pub scroll_delay_ms: u64,
    /// 滚动结束后的等待
    pub pause_after_scroll_ms: u64,
    /// 累计滚动距离上限
    pub max_scroll_height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scroll_distance: 100,
            max_scrolls: 80,
            scroll_delay_ms: 200,
            pause_after_scroll_ms: 1000,
            max_scroll_height: 8000,
        }
    }
}

fn default_api_page_size() -> u32 {
    35
}

fn default_api_delay_ms() -> u64 {
    1000
}

/// 直连 API 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// 搜索接口地址
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// 请求头 Origin / Referer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// 每页条数（查询未指定 limit 时使用）
    #[serde(default = "default_api_page_size")]
    pub page_size: u32,
    /// 条目链接模板，`{id}` 会被替换
    pub item_url_template: String,
    #[serde(default = "default_api_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_api_delay_ms")]
    pub pass_delay_ms: u64,
}

/// 域名选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_search_url: Option<String>,
    /// 页数上限，超出的请求会被截断
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_between_pages: Option<DelayRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiOptions>,
    /// 其它自由格式选项
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 域名抓取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    /// 规范化后的域名
    pub domain: String,
    pub selectors: Selectors,
    #[serde(default)]
    pub requires_javascript: bool,
    #[serde(default)]
    pub default_strategy: StrategyType,
    #[serde(default)]
    pub options: DomainOptions,
}

impl DomainConfig {
    pub fn new(domain: impl Into<String>, selectors: Selectors) -> Self {
        Self {
            domain: domain.into(),
            selectors,
            requires_javascript: false,
            default_strategy: StrategyType::Lightweight,
            options: DomainOptions::default(),
        }
    }

    /// 标记需要浏览器渲染
    pub fn rendered(mut self) -> Self {
        self.requires_javascript = true;
        self.default_strategy = StrategyType::Rendered;
        self
    }

    pub fn with_options(mut self, options: DomainOptions) -> Self {
        self.options = options;
        self
    }

    /// 是否只走直连 API
    pub fn is_direct_api(&self) -> bool {
        self.default_strategy == StrategyType::DirectApi
    }

    /// 没有缓存时的初始策略
    pub fn initial_strategy(&self) -> StrategyType {
        if self.requires_javascript {
            StrategyType::Rendered
        } else {
            StrategyType::Lightweight
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        self.options.render.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_extra_fields_are_flattened() {
        let selectors: Selectors = serde_json::from_value(serde_json::json!({
            "container": "article",
            "title": "h2",
            "nextPage": ".next",
            "mileage": "[data-testid=mileage]",
            "fallbackTitle": "h3"
        }))
        .unwrap();

        assert_eq!(selectors.next_page(), Some(".next"));
        assert_eq!(selectors.extra("fallbackTitle"), Some("h3"));
        let extras: Vec<_> = selectors.field_extras().collect();
        assert_eq!(extras, vec![("mileage", "[data-testid=mileage]")]);
    }

    #[test]
    fn test_initial_strategy_follows_js_flag() {
        let config = DomainConfig::new("example.com", Selectors::new("article"));
        assert_eq!(config.initial_strategy(), StrategyType::Lightweight);
        assert_eq!(config.rendered().initial_strategy(), StrategyType::Rendered);
    }

    #[test]
    fn test_delay_range_normalized() {
        assert_eq!(DelayRange::new(500, 100).normalized(), DelayRange::new(100, 500));
    }

    #[test]
    fn test_strategy_type_serde() {
        let v = serde_json::to_value(StrategyType::DirectApi).unwrap();
        assert_eq!(v, "direct_api");
    }
}
