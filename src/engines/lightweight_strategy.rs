// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::settings::ScrapeSettings;
use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedData, StrategyType};
use crate::engines::pagination::{PageSource, PaginationController, RawPage};
use crate::engines::traits::{EngineError, FetchRequest, HttpFetcher, ScrapeStrategy};
use crate::extractors::ExtractorChain;

/// 静态抓取策略
///
/// 普通 GET + 静态解析，非 2xx 直接失败
pub struct LightweightStrategy {
    fetcher: Arc<dyn HttpFetcher>,
    extractors: Arc<ExtractorChain>,
    settings: ScrapeSettings,
}

impl LightweightStrategy {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        extractors: Arc<ExtractorChain>,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            fetcher,
            extractors,
            settings,
        }
    }

    fn headers(&self) -> HashMap<String, String> {
        HashMap::from([
            ("User-Agent".to_string(), self.settings.user_agent.clone()),
            (
                "Accept".to_string(),
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            ),
            (
                "Accept-Language".to_string(),
                self.settings.accept_language.clone(),
            ),
            ("Cache-Control".to_string(), "no-cache".to_string()),
            ("Pragma".to_string(), "no-cache".to_string()),
        ])
    }
}

struct HttpPageSource<'a> {
    fetcher: &'a dyn HttpFetcher,
    headers: HashMap<String, String>,
    timeout: Duration,
}

#[async_trait]
impl PageSource for HttpPageSource<'_> {
    async fn fetch_page(&mut self, url: &str, _page: u32) -> Result<RawPage, EngineError> {
        let request = FetchRequest {
            url: url.to_string(),
            headers: self.headers.clone(),
            timeout: self.timeout,
        };
        let response = self.fetcher.get(&request).await?;
        if !response.is_success() {
            return Err(EngineError::HttpStatus {
                url: url.to_string(),
                status: response.status_code,
            });
        }
        Ok(RawPage {
            html: response.content,
            url: response.final_url,
        })
    }
}

#[async_trait]
impl ScrapeStrategy for LightweightStrategy {
    async fn scrape(
        &self,
        job: &ScrapeJob,
        config: &DomainConfig,
        cancel: &CancellationToken,
    ) -> Result<ScrapedData, EngineError> {
        let start = Instant::now();
        let extractor = self.extractors.select(&job.source);
        let controller =
            PaginationController::new(extractor, config, self.settings.lightweight_page_delay);
        let mut source = HttpPageSource {
            fetcher: self.fetcher.as_ref(),
            headers: self.headers(),
            timeout: self.settings.http_timeout(),
        };

        let outcome = controller.run(job, &mut source, cancel).await?;

        let mut data = ScrapedData::empty(job.source.clone(), job.query.clone(), self.strategy_type());
        data.title = outcome.title;
        data.items = outcome.items;
        data.metadata.pages_scraped = outcome.pages_scraped;
        data.metadata.execution_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Lightweight scrape of {} finished: {} item(s) over {} page(s)",
            job.source,
            data.items.len(),
            data.metadata.pages_scraped
        );
        Ok(data)
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::Lightweight
    }
}
