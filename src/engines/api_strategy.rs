// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::settings::ScrapeSettings;
use crate::domain::models::{
    ApiOptions, DomainConfig, Price, ScrapeJob, ScrapedData, ScrapedItem, StrategyType,
};
use crate::engines::traits::{EngineError, FetchRequest, HttpFetcher, ScrapeStrategy};

const MAX_ERROR_BODY: usize = 300;

/// 直连上游搜索 API 的策略
///
/// 查询本身是上游参数的 JSON 对象；每个子查询合并进基础参数后单独分页一遍。
pub struct DirectApiStrategy {
    fetcher: Arc<dyn HttpFetcher>,
    settings: ScrapeSettings,
}

/// 递归合并 JSON 对象，`patch` 中的非对象值覆盖 `base`
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// 解析任务查询为参数对象，空查询视为空对象
fn parse_params(query: &str) -> Result<Map<String, Value>, EngineError> {
    if query.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(query) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(other) => Err(EngineError::InvalidQuery(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(EngineError::InvalidQuery(e.to_string())),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// 把上游广告映射为条目
pub fn map_ad(ad: &Value, api: &ApiOptions, sub_query: Option<usize>) -> ScrapedItem {
    let mut item = ScrapedItem::default();

    let id = match ad.get("list_id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };

    item.title = str_at(ad, "/subject").map(String::from);
    item.description = str_at(ad, "/body").map(String::from);
    item.price = ad
        .pointer("/price/0")
        .and_then(Value::as_f64)
        .map(Price::Amount);
    item.url = id
        .as_ref()
        .map(|id| api.item_url_template.replace("{id}", id))
        .or_else(|| str_at(ad, "/url").map(String::from));

    let images: Vec<Value> = ad
        .pointer("/images/urls")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    item.image = images
        .first()
        .and_then(Value::as_str)
        .or_else(|| str_at(ad, "/images/thumb_url"))
        .map(String::from);

    if let Some(id) = id {
        item.set_field("id", id);
    }
    item.set_field("images", images);
    for (field, pointer) in [
        ("category", "/category_name"),
        ("publishedAt", "/first_publication_date"),
        ("expiresAt", "/expiration_date"),
        ("status", "/status"),
        ("city", "/location/city"),
        ("postalCode", "/location/zipcode"),
    ] {
        if let Some(value) = str_at(ad, pointer) {
            item.set_field(field, value);
        }
    }
    if let Some(index) = sub_query {
        item.set_field("subQuery", index);
    }
    item
}

impl DirectApiStrategy {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, settings: ScrapeSettings) -> Self {
        Self { fetcher, settings }
    }

    fn headers(&self, api: &ApiOptions) -> HashMap<String, String> {
        let mut headers = HashMap::from([
            ("Accept".to_string(), "*/*".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.settings.user_agent.clone()),
            (
                "Accept-Language".to_string(),
                self.settings.accept_language.clone(),
            ),
        ]);
        if let Some(key) = &api.api_key {
            headers.insert("api_key".to_string(), key.clone());
        }
        if let Some(origin) = &api.origin {
            headers.insert("Origin".to_string(), origin.clone());
            headers.insert("Referer".to_string(), format!("{}/", origin.trim_end_matches('/')));
        }
        headers
    }

    /// 单次请求，返回本页的广告列表
    async fn fetch_ads(
        &self,
        api: &ApiOptions,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> Result<Vec<Value>, EngineError> {
        let request = FetchRequest {
            url: api.endpoint.clone(),
            headers: headers.clone(),
            timeout: self.settings.http_timeout(),
        };
        let response = self.fetcher.post_json(&request, body).await?;
        if !response.is_success() {
            return Err(EngineError::UpstreamApi {
                status: response.status_code,
                message: truncate(&response.content),
            });
        }

        let payload: Value = serde_json::from_str(&response.content).map_err(|e| {
            EngineError::UpstreamApi {
                status: response.status_code,
                message: format!("invalid JSON: {}", e),
            }
        })?;
        Ok(payload
            .get("ads")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// 可取消的等待，返回 false 表示已取消
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[async_trait]
impl ScrapeStrategy for DirectApiStrategy {
    async fn scrape(
        &self,
        job: &ScrapeJob,
        config: &DomainConfig,
        cancel: &CancellationToken,
    ) -> Result<ScrapedData, EngineError> {
        let start = Instant::now();
        let api = config.options.api.as_ref().ok_or_else(|| EngineError::UpstreamApi {
            status: 0,
            message: format!("no API endpoint configured for {}", config.domain),
        })?;

        let mut base = parse_params(job.query_str())?;
        let limit = match base.get("limit").and_then(Value::as_u64) {
            Some(limit) if limit > 0 => limit,
            _ => {
                base.insert("limit".to_string(), Value::from(api.page_size));
                u64::from(api.page_size.max(1))
            }
        };
        let base = Value::Object(base);

        let passes: Vec<(Option<usize>, Value)> = if job.sub_queries.is_empty() {
            vec![(None, base.clone())]
        } else {
            job.sub_queries
                .iter()
                .enumerate()
                .map(|(index, sub_query)| {
                    let mut params = base.clone();
                    deep_merge(&mut params, sub_query);
                    (Some(index), params)
                })
                .collect()
        };

        let mut budget = job.effective_page_count();
        if let Some(max) = config.options.max_pages.filter(|max| *max > 0) {
            budget = budget.min(max);
        }
        let headers = self.headers(api);
        let page_delay = Duration::from_millis(api.page_delay_ms);
        let pass_delay = Duration::from_millis(api.pass_delay_ms);

        let mut data = ScrapedData::empty(job.source.clone(), job.query.clone(), self.strategy_type());
        let mut requests = 0u32;

        'passes: for (pass, (sub_query, params)) in passes.iter().enumerate() {
            if pass > 0 && !pause(pass_delay, cancel).await {
                info!("Job {} cancelled between API passes", job.job_id);
                break;
            }

            for page in 0..budget {
                if cancel.is_cancelled() {
                    info!("Job {} cancelled before API page {}", job.job_id, page + 1);
                    break 'passes;
                }

                let mut body = params.clone();
                if let Value::Object(map) = &mut body {
                    map.insert("offset".to_string(), Value::from(u64::from(page) * limit));
                }
                debug!(
                    "API request for {} (pass {}, page {}): {}",
                    job.source,
                    pass + 1,
                    page + 1,
                    body
                );

                let ads = match self.fetch_ads(api, &headers, &body).await {
                    Ok(ads) => ads,
                    Err(e) if requests == 0 => return Err(e),
                    Err(e) => {
                        warn!(
                            "API page {} of pass {} failed for {}, keeping {} item(s): {}",
                            page + 1,
                            pass + 1,
                            job.source,
                            data.items.len(),
                            e
                        );
                        break;
                    }
                };
                requests += 1;

                let count = ads.len();
                data.items
                    .extend(ads.iter().map(|ad| map_ad(ad, api, *sub_query)));

                if (count as u64) < limit {
                    debug!("API page returned {} < {} ads, pass complete", count, limit);
                    break;
                }
                if page + 1 < budget && !pause(page_delay, cancel).await {
                    info!("Job {} cancelled during API page delay", job.job_id);
                    break 'passes;
                }
            }
        }

        data.metadata.pages_scraped = requests;
        data.metadata.execution_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Direct API scrape of {} finished: {} item(s) over {} request(s)",
            job.source,
            data.items.len(),
            requests
        );
        Ok(data)
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::DirectApi
    }
}

#[cfg(test)]
#[path = "api_strategy_test.rs"]
mod tests;
