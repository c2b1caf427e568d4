// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use rand::Rng;
use scraper::Html;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::models::{DelayRange, DomainConfig, ScrapeJob, ScrapedItem};
use crate::engines::traits::EngineError;
use crate::extractors::{has_element, page_title, Extractor};

/// 单页抓取结果
#[derive(Debug, Clone)]
pub struct RawPage {
    pub html: String,
    /// 最终地址（用于解析相对链接）
    pub url: String,
}

/// 页面来源：静态抓取或浏览器渲染
#[async_trait]
pub trait PageSource: Send {
    async fn fetch_page(&mut self, url: &str, page: u32) -> Result<RawPage, EngineError>;
}

/// 分页结果
#[derive(Debug, Default)]
pub struct PaginationOutcome {
    /// 第一页的标题
    pub title: Option<String>,
    pub items: Vec<ScrapedItem>,
    /// 实际抓取的页数
    pub pages_scraped: u32,
    /// 是否因取消而提前结束
    pub cancelled: bool,
}

struct PageEvaluation {
    title: Option<String>,
    items: Vec<ScrapedItem>,
    has_next: bool,
}

/// 分页控制器
///
/// 状态：START -> FETCH_PAGE -> EVALUATE -> (CONTINUE | STOP)。
/// 页面严格顺序处理，累积结果只追加不丢弃。
pub struct PaginationController<'a> {
    extractor: &'a dyn Extractor,
    config: &'a DomainConfig,
    delay: DelayRange,
}

impl<'a> PaginationController<'a> {
    /// 创建控制器
    ///
    /// # 参数
    ///
    /// * `extractor` - 选中的提取器
    /// * `config` - 域名配置，配置了页间延迟时覆盖默认值
    /// * `default_delay` - 策略默认的页间延迟
    pub fn new(extractor: &'a dyn Extractor, config: &'a DomainConfig, default_delay: DelayRange) -> Self {
        let delay = config
            .options
            .delay_between_pages
            .unwrap_or(default_delay)
            .normalized();
        Self {
            extractor,
            config,
            delay,
        }
    }

    /// 实际页数预算，受域名的 maxPages 限制
    pub fn page_budget(&self, job: &ScrapeJob) -> u32 {
        let requested = job.effective_page_count();
        match self.config.options.max_pages {
            Some(max) if max > 0 && requested > max => {
                info!(
                    "Requested {} pages for {}, capped at {}",
                    requested, self.config.domain, max
                );
                max
            }
            _ => requested,
        }
    }

    /// 页码对应的URL
    pub fn page_url(&self, job: &ScrapeJob, page: u32) -> String {
        self.extractor
            .build_url(&job.source, job.query_str(), page, job, self.config)
    }

    /// 执行分页循环
    ///
    /// 第一页失败返回错误；后续页失败记录告警并返回已累积的结果。
    /// 取消信号在每次抓取前检查，并与页间延迟竞争。
    pub async fn run(
        &self,
        job: &ScrapeJob,
        source: &mut dyn PageSource,
        cancel: &CancellationToken,
    ) -> Result<PaginationOutcome, EngineError> {
        let budget = self.page_budget(job);
        let mut outcome = PaginationOutcome::default();
        let mut page = 1;

        loop {
            if cancel.is_cancelled() {
                info!("Job {} cancelled before page {}", job.job_id, page);
                outcome.cancelled = true;
                break;
            }

            let url = self.page_url(job, page);
            info!("Scraping page {}/{} for {}: {}", page, budget, job.source, url);

            let raw = match source.fetch_page(&url, page).await {
                Ok(raw) => raw,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(
                        "Page {} failed for {}, keeping {} item(s) from earlier pages: {}",
                        page,
                        job.source,
                        outcome.items.len(),
                        e
                    );
                    break;
                }
            };

            let evaluation = self.evaluate_page(&raw, &url);
            debug!(
                "Page {} yielded {} item(s), next page present: {}",
                page,
                evaluation.items.len(),
                evaluation.has_next
            );
            if page == 1 {
                outcome.title = evaluation.title;
            }
            outcome.items.extend(evaluation.items);
            outcome.pages_scraped += 1;

            if page >= budget {
                break;
            }

            if !self.extractor.handle_pagination(page, budget, job) {
                if self.config.selectors.next_page().is_none() {
                    info!("No nextPage selector for {}, stopping pagination", job.source);
                    break;
                }
                if !evaluation.has_next {
                    info!("No next page button on page {}, stopping pagination", page);
                    break;
                }
            }

            let wait = self.jitter();
            debug!("Waiting {:?} before page {}", wait, page + 1);
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Job {} cancelled during inter-page delay", job.job_id);
                    outcome.cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            page += 1;
        }

        Ok(outcome)
    }

    /// 在同步作用域内解析文档，Html 不跨越 await
    fn evaluate_page(&self, raw: &RawPage, requested_url: &str) -> PageEvaluation {
        let base = Url::parse(&raw.url)
            .or_else(|_| Url::parse(requested_url))
            .or_else(|_| Url::parse("about:blank"));
        let document = Html::parse_document(&raw.html);

        let items = match &base {
            Ok(base) => self
                .extractor
                .extract_items(&document, &self.config.selectors, base),
            Err(e) => {
                warn!("Cannot resolve page url {}: {}", raw.url, e);
                Vec::new()
            }
        };
        let has_next = self
            .config
            .selectors
            .next_page()
            .is_some_and(|selector| has_element(&document, selector));

        PageEvaluation {
            title: page_title(&document),
            items,
            has_next,
        }
    }

    fn jitter(&self) -> Duration {
        let DelayRange { min_ms, max_ms } = self.delay;
        let ms = if max_ms > min_ms {
            rand::rng().random_range(min_ms..=max_ms)
        } else {
            min_ms
        };
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
