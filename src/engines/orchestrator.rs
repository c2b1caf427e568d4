// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedData, StrategyType};
use crate::domain::services::progress::{ProgressEvent, ProgressReporter, ProgressStatus};
use crate::domain::services::DomainRegistry;
use crate::engines::api_strategy::DirectApiStrategy;
use crate::engines::chromium_renderer::ChromiumRenderer;
use crate::engines::escalation::{escalation_reason, EscalationReason};
use crate::engines::lightweight_strategy::LightweightStrategy;
use crate::engines::reqwest_engine::ReqwestFetcher;
use crate::engines::rendered_strategy::RenderedStrategy;
use crate::engines::strategy_cache::StrategyCache;
use crate::engines::traits::{EngineError, Renderer, ScrapeStrategy};
use crate::extractors::ExtractorChain;
use crate::infrastructure::metrics;
use crate::utils::url_utils::normalize_domain;

/// 三种策略的集合
pub struct Strategies {
    pub lightweight: Arc<dyn ScrapeStrategy>,
    pub rendered: Arc<dyn ScrapeStrategy>,
    pub direct_api: Arc<dyn ScrapeStrategy>,
}

/// 单次任务的上下文
struct JobRun<'a> {
    job: &'a ScrapeJob,
    config: &'a DomainConfig,
    cache_key: String,
    cancel: &'a CancellationToken,
    start: Instant,
}

/// 抓取编排器
///
/// 负责选择初始策略、在静态抓取不足或失败时升级到渲染策略、
/// 记录成功策略并在各检查点上报进度。
pub struct ScrapeOrchestrator {
    registry: Arc<DomainRegistry>,
    strategies: Strategies,
    cache: StrategyCache,
    reporter: Arc<dyn ProgressReporter>,
    renderer: Option<Arc<dyn Renderer>>,
    cleaned: AtomicBool,
}

impl ScrapeOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    ///
    /// * `registry` - 域名配置注册表
    /// * `strategies` - 三种抓取策略
    /// * `reporter` - 进度上报
    pub fn new(
        registry: Arc<DomainRegistry>,
        strategies: Strategies,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            registry,
            strategies,
            cache: StrategyCache::new(),
            reporter,
            renderer: None,
            cleaned: AtomicBool::new(false),
        }
    }

    /// 关联共享的浏览器会话，`cleanup` 时关闭
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// 按配置装配 reqwest 抓取器、chromium 渲染器和全部策略
    pub fn from_settings(
        settings: &Settings,
        registry: Arc<DomainRegistry>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<Self, EngineError> {
        let fetcher = Arc::new(ReqwestFetcher::new(&settings.scrape.user_agent)?);
        let extractors = Arc::new(ExtractorChain::default());
        let renderer: Arc<dyn Renderer> = Arc::new(ChromiumRenderer::new(
            settings.browser.clone(),
            settings.scrape.navigation_timeout(),
        ));

        let strategies = Strategies {
            lightweight: Arc::new(LightweightStrategy::new(
                fetcher.clone(),
                extractors.clone(),
                settings.scrape.clone(),
            )),
            rendered: Arc::new(RenderedStrategy::new(
                renderer.clone(),
                extractors,
                settings.scrape.clone(),
                &settings.browser,
            )),
            direct_api: Arc::new(DirectApiStrategy::new(fetcher, settings.scrape.clone())),
        };

        Ok(Self::new(registry, strategies, reporter).with_renderer(renderer))
    }

    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    pub fn strategy_cache(&self) -> &StrategyCache {
        &self.cache
    }

    /// 执行抓取任务（不可取消）
    pub async fn scrape(&self, job: &ScrapeJob) -> Result<ScrapedData, EngineError> {
        self.scrape_with_cancel(job, CancellationToken::new()).await
    }

    /// 执行抓取任务
    ///
    /// 取消信号在页边界生效：任务中途取消时返回已累积的部分结果，且不再升级。
    ///
    /// # 参数
    ///
    /// * `job` - 抓取任务
    /// * `cancel` - 外部取消/超时信号
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapedData)` - 结果，空列表也是成功
    /// * `Err(EngineError)` - 最终一次尝试的错误；开始前已取消时为 `Cancelled`
    pub async fn scrape_with_cancel(
        &self,
        job: &ScrapeJob,
        cancel: CancellationToken,
    ) -> Result<ScrapedData, EngineError> {
        let start = Instant::now();
        if cancel.is_cancelled() {
            self.report(job, 0, ProgressStatus::Failed, "Job cancelled before start");
            return Err(EngineError::Cancelled);
        }
        self.report(job, 0, ProgressStatus::Started, format!("Scraping {}", job.source));

        let config = self.registry.get_config(&job.source);
        let cache_key = if config.domain == "*" {
            normalize_domain(&job.source)
        } else {
            config.domain.clone()
        };
        let run = JobRun {
            job,
            config: &config,
            cache_key,
            cancel: &cancel,
            start,
        };

        if config.is_direct_api() {
            return self.run_direct_api(&run).await;
        }

        let initial = match self.cache.get(&run.cache_key) {
            Some(cached) => {
                info!("Using cached strategy {} for {}", cached, run.cache_key);
                cached
            }
            None => config.initial_strategy(),
        };
        self.report(
            job,
            10,
            ProgressStatus::StrategySelected,
            format!("Selected {} strategy", initial),
        );
        metrics::record_job_started(initial);

        if initial != StrategyType::Lightweight {
            self.report(job, 35, ProgressStatus::Running, format!("Running {} strategy", initial));
            let data = match self.strategy(initial).scrape(job, &config, &cancel).await {
                Ok(data) => data,
                Err(e) => return Err(self.fail(job, initial, e)),
            };
            self.report_result(job, 85, &data);
            return Ok(self.finish(&run, data, initial));
        }

        self.report(job, 35, ProgressStatus::Running, "Running lightweight strategy");
        let reason = match self
            .strategies
            .lightweight
            .scrape(job, &config, &cancel)
            .await
        {
            Ok(data) => {
                self.report_result(job, 85, &data);
                if cancel.is_cancelled() {
                    info!("Job {} cancelled, skipping escalation check", job.job_id);
                    return Ok(self.finish(&run, data, StrategyType::Lightweight));
                }
                match escalation_reason(&data) {
                    None => return Ok(self.finish(&run, data, StrategyType::Lightweight)),
                    Some(reason) => reason,
                }
            }
            Err(e) => {
                warn!(
                    "Lightweight strategy failed for {}, retrying with rendered: {}",
                    job.source, e
                );
                metrics::record_failure(StrategyType::Lightweight);
                if cancel.is_cancelled() {
                    return Err(self.fail(job, StrategyType::Lightweight, e));
                }
                EscalationReason::LightweightFailed
            }
        };

        self.escalate(&run, reason).await
    }

    async fn run_direct_api(&self, run: &JobRun<'_>) -> Result<ScrapedData, EngineError> {
        let job = run.job;
        self.report(job, 10, ProgressStatus::StrategySelected, "Selected direct_api strategy");
        metrics::record_job_started(StrategyType::DirectApi);
        self.report(job, 35, ProgressStatus::Running, "Running direct_api strategy");

        match self
            .strategies
            .direct_api
            .scrape(job, run.config, run.cancel)
            .await
        {
            Ok(data) => {
                self.report_result(job, 85, &data);
                Ok(self.finish(run, data, StrategyType::DirectApi))
            }
            Err(e) => Err(self.fail(job, StrategyType::DirectApi, e)),
        }
    }

    /// 丢弃静态抓取的结果，改用渲染策略重跑
    async fn escalate(
        &self,
        run: &JobRun<'_>,
        reason: EscalationReason,
    ) -> Result<ScrapedData, EngineError> {
        let job = run.job;
        info!("Escalating {} to rendered strategy: {}", job.source, reason);
        metrics::record_escalation(&reason);
        self.report(
            job,
            60,
            ProgressStatus::Escalating,
            format!("Escalating to rendered strategy: {}", reason),
        );
        metrics::record_job_started(StrategyType::Rendered);
        self.report(job, 70, ProgressStatus::Running, "Running rendered strategy");

        match self
            .strategies
            .rendered
            .scrape(job, run.config, run.cancel)
            .await
        {
            Ok(data) => {
                self.report_result(job, 90, &data);
                Ok(self.finish(run, data, StrategyType::Rendered))
            }
            Err(e) => Err(self.fail(job, StrategyType::Rendered, e)),
        }
    }

    fn strategy(&self, strategy: StrategyType) -> &Arc<dyn ScrapeStrategy> {
        match strategy {
            StrategyType::Lightweight => &self.strategies.lightweight,
            StrategyType::Rendered => &self.strategies.rendered,
            StrategyType::DirectApi => &self.strategies.direct_api,
        }
    }

    /// 过滤无标题且无链接的条目，写入缓存并上报完成
    fn finish(&self, run: &JobRun<'_>, mut data: ScrapedData, strategy: StrategyType) -> ScrapedData {
        let before = data.items.len();
        data.items.retain(|item| item.has_title() || item.has_url());
        if data.items.len() < before {
            info!(
                "Dropped {} item(s) without title or url for {}",
                before - data.items.len(),
                run.job.source
            );
        }
        data.metadata.strategy_used = strategy;
        data.metadata.execution_time_ms = run.start.elapsed().as_millis() as u64;

        if strategy != StrategyType::DirectApi {
            self.cache.record(&run.cache_key, strategy);
        }
        metrics::record_completion(data.items.len(), data.metadata.execution_time_ms);

        info!(
            "Job {} completed with {} strategy: {} item(s) in {}ms",
            run.job.job_id,
            strategy,
            data.items.len(),
            data.metadata.execution_time_ms
        );
        self.reporter.report_progress(
            ProgressEvent::new(
                run.job.job_id,
                100,
                ProgressStatus::Completed,
                format!("Completed with {} strategy", strategy),
            )
            .with_item_count(data.items.len()),
        );
        data
    }

    fn fail(&self, job: &ScrapeJob, strategy: StrategyType, error: EngineError) -> EngineError {
        warn!("Job {} failed with {} strategy: {}", job.job_id, strategy, error);
        metrics::record_failure(strategy);
        self.report(job, 100, ProgressStatus::Failed, error.to_string());
        error
    }

    fn report(&self, job: &ScrapeJob, percent: u8, status: ProgressStatus, message: impl Into<String>) {
        self.reporter
            .report_progress(ProgressEvent::new(job.job_id, percent, status, message));
    }

    fn report_result(&self, job: &ScrapeJob, percent: u8, data: &ScrapedData) {
        self.reporter.report_progress(
            ProgressEvent::new(
                job.job_id,
                percent,
                ProgressStatus::ResultAvailable,
                format!("{} strategy returned", data.metadata.strategy_used),
            )
            .with_item_count(data.items.len()),
        );
    }

    /// 关闭共享浏览器并清空策略缓存，只执行一次
    pub async fn cleanup(&self) {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Cleaning up scrape orchestrator");
        if let Some(renderer) = &self.renderer {
            renderer.shutdown().await;
        }
        self.cache.clear();
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
