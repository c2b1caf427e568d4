// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::config::settings::Settings;
use crate::domain::models::{ScrapeJob, ScrapedData};
use crate::engines::ScrapeOrchestrator;
use crate::presentation::errors::AppError;

fn validate_source(source: &str) -> Result<(), ValidationError> {
    if source.trim().is_empty() {
        return Err(ValidationError::new("source cannot be empty"));
    }
    Ok(())
}

/// 抓取请求
///
/// `query` 可以是字符串，也可以是直连 API 所需的 JSON 对象
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequestDto {
    #[serde(default)]
    pub job_id: Option<Uuid>,
    #[validate(custom(function = "validate_source"))]
    pub source: String,
    #[serde(default)]
    pub query: Option<Value>,
    #[validate(range(min = 1, max = 50))]
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub zipr: Option<String>,
    #[serde(default)]
    pub sub_queries: Vec<Value>,
}

impl ScrapeRequestDto {
    pub fn into_job(self) -> ScrapeJob {
        let mut job = ScrapeJob::new(self.source.trim())
            .with_page_count(self.page_count.unwrap_or(1))
            .with_sub_queries(self.sub_queries);
        if let Some(job_id) = self.job_id {
            job.job_id = job_id;
        }
        match self.query {
            Some(Value::String(query)) => job = job.with_query(query),
            Some(Value::Null) | None => {}
            Some(other) => job = job.with_query(other.to_string()),
        }
        if let Some(zip) = self.zip {
            job = job.with_geo(zip, self.zipr);
        }
        job
    }
}

/// 同步执行一个抓取任务
///
/// 任务超时由一个延时取消的令牌实现，超时后返回已累积的部分结果
///
/// # 返回值
///
/// * `Ok(Json<ScrapedData>)` - 抓取结果
/// * `Err(AppError)` - 校验失败或最终一次尝试失败
pub async fn scrape(
    Extension(orchestrator): Extension<Arc<ScrapeOrchestrator>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(payload): Json<ScrapeRequestDto>,
) -> Result<Json<ScrapedData>, AppError> {
    payload.validate()?;
    let job = payload.into_job();
    info!(
        "Received scrape job {} for {} ({} page(s))",
        job.job_id,
        job.source,
        job.effective_page_count()
    );

    let cancel = CancellationToken::new();
    let timeout = settings.scrape.job_timeout();
    let timer = {
        let cancel = cancel.clone();
        let job_id = job.job_id;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!("Job {} reached its {:?} timeout", job_id, timeout);
            cancel.cancel();
        })
    };

    let result = orchestrator.scrape_with_cancel(&job, cancel).await;
    timer.abort();
    Ok(Json(result?))
}
