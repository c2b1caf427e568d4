// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn default_page_count() -> u32 {
    1
}

/// 抓取任务
///
/// 由外部队列创建并交给引擎，引擎在一次 `scrape` 调用中只读消费它
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeJob {
    /// 任务ID（用于进度事件）
    #[serde(default = "Uuid::new_v4")]
    pub job_id: Uuid,
    /// 站点标识或URL
    pub source: String,
    /// 查询内容，自由文本或策略相关的结构化文本（例如 JSON）
    #[serde(default)]
    pub query: Option<String>,
    /// 请求的页数预算（>= 1）
    #[serde(default = "default_page_count")]
    pub page_count: u32,
    /// 邮政编码
    #[serde(default)]
    pub zip: Option<String>,
    /// 邮政编码周边半径（公里）
    #[serde(default)]
    pub zipr: Option<String>,
    /// 直连 API 策略的子查询，每个子查询执行一轮
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_queries: Vec<Value>,
}

impl ScrapeJob {
    /// 创建新的抓取任务
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            source: source.into(),
            query: None,
            page_count: 1,
            zip: None,
            zipr: None,
            sub_queries: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count;
        self
    }

    /// 设置地理范围（邮编 + 半径）
    pub fn with_geo(mut self, zip: impl Into<String>, zipr: Option<String>) -> Self {
        self.zip = Some(zip.into());
        self.zipr = zipr;
        self
    }

    pub fn with_sub_queries(mut self, sub_queries: Vec<Value>) -> Self {
        self.sub_queries = sub_queries;
        self
    }

    /// 去除首尾空白后的查询，未设置时返回空串
    pub fn query_str(&self) -> &str {
        self.query.as_deref().map(str::trim).unwrap_or("")
    }

    /// 实际使用的页数，至少为1
    pub fn effective_page_count(&self) -> u32 {
        self.page_count.max(1)
    }

    /// 非空的邮编
    pub fn zip(&self) -> Option<&str> {
        self.zip.as_deref().map(str::trim).filter(|z| !z.is_empty())
    }

    /// 非空的半径
    pub fn zip_radius(&self) -> Option<&str> {
        self.zipr.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}
