// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain_config::StrategyType;

/// 价格：能解析成数字时为数值，否则保留原始文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Text(String),
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(v) => Some(*v),
            Price::Text(_) => None,
        }
    }
}

/// 单个抓取条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// 绝对地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 站点特有字段
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ScrapedItem {
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    /// 至少有一个字段非空
    pub fn is_meaningful(&self) -> bool {
        self.has_title()
            || self.has_url()
            || self.description.as_deref().is_some_and(|d| !d.is_empty())
            || self.price.is_some()
            || self.image.as_deref().is_some_and(|i| !i.is_empty())
            || self.fields.values().any(|v| !v.is_null())
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// 抓取元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMetadata {
    /// 原始的 source
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// 实际产出结果的策略
    pub strategy_used: StrategyType,
    pub execution_time_ms: u64,
    /// 实际抓取的页数
    pub pages_scraped: u32,
}

/// 一次抓取的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedData {
    /// 第一页的标题
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<ScrapedItem>,
    pub metadata: ScrapeMetadata,
}

impl ScrapedData {
    /// 创建空结果，执行时间在策略结束时回填
    pub fn empty(source: impl Into<String>, query: Option<String>, strategy: StrategyType) -> Self {
        Self {
            title: None,
            items: Vec::new(),
            metadata: ScrapeMetadata {
                source: source.into(),
                query,
                timestamp: Utc::now(),
                strategy_used: strategy,
                execution_time_ms: 0,
                pages_scraped: 0,
            },
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_untagged_serialization() {
        assert_eq!(serde_json::to_value(Price::Amount(12.5)).unwrap(), 12.5);
        assert_eq!(
            serde_json::to_value(Price::Text("Sur demande".into())).unwrap(),
            "Sur demande"
        );
    }

    #[test]
    fn test_item_fields_are_flattened() {
        let mut item = ScrapedItem {
            title: Some("Golf".into()),
            ..Default::default()
        };
        item.set_field("mileage", "12 000 km");
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["title"], "Golf");
        assert_eq!(v["mileage"], "12 000 km");
        assert!(v.get("url").is_none());
    }

    #[test]
    fn test_blank_title_is_not_title() {
        let item = ScrapedItem {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert!(!item.has_title());
        assert!(!item.is_meaningful());
    }

    #[test]
    fn test_metadata_camel_case() {
        let data = ScrapedData::empty("ebay.fr", None, StrategyType::Rendered);
        let v = serde_json::to_value(&data).unwrap();
        assert_eq!(v["metadata"]["strategyUsed"], "rendered");
        assert_eq!(v["metadata"]["pagesScraped"], 0);
    }
}
