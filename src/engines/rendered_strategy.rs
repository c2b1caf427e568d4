// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::settings::{BrowserSettings, ScrapeSettings};
use crate::domain::models::{DomainConfig, RenderOptions, ScrapeJob, ScrapedData, StrategyType};
use crate::engines::pagination::{PageSource, PaginationController, RawPage};
use crate::engines::traits::{EngineError, PageOptions, RenderedPage, Renderer, ScrapeStrategy};
use crate::extractors::ExtractorChain;

/// 浏览器渲染策略
///
/// 每个任务独占一个页面，分页在同一页面内顺序导航，结束时无论成败都关闭页面。
pub struct RenderedStrategy {
    renderer: Arc<dyn Renderer>,
    extractors: Arc<ExtractorChain>,
    settings: ScrapeSettings,
    blocked_resource_types: Vec<String>,
}

impl RenderedStrategy {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        extractors: Arc<ExtractorChain>,
        settings: ScrapeSettings,
        browser: &BrowserSettings,
    ) -> Self {
        Self {
            renderer,
            extractors,
            settings,
            blocked_resource_types: browser.blocked_resource_types.clone(),
        }
    }

    fn page_options(&self) -> PageOptions {
        PageOptions {
            user_agent: self.settings.user_agent.clone(),
            headers: HashMap::from([(
                "Accept-Language".to_string(),
                self.settings.accept_language.clone(),
            )]),
            blocked_resource_types: self.blocked_resource_types.clone(),
        }
    }
}

fn scroll_script(distance: u32) -> String {
    format!(
        "(() => {{ window.scrollBy(0, {}); return {{ bottom: window.scrollY + window.innerHeight, height: document.body.scrollHeight }}; }})()",
        distance
    )
}

struct BrowserPageSource<'a> {
    page: &'a dyn RenderedPage,
    container: &'a str,
    render: RenderOptions,
    navigation_timeout: Duration,
    selector_timeout: Duration,
    strict_selector_wait: bool,
}

impl BrowserPageSource<'_> {
    /// 逐步滚动以触发懒加载，受次数与总距离双重限制
    async fn auto_scroll(&self) -> Result<(), EngineError> {
        let RenderOptions {
            scroll_distance,
            max_scrolls,
            scroll_delay_ms,
            pause_after_scroll_ms,
            max_scroll_height,
        } = self.render;

        let mut scrolled: u64 = 0;
        let mut ticks = 0;
        while ticks < max_scrolls && scrolled < u64::from(max_scroll_height) {
            let position = self.page.evaluate(&scroll_script(scroll_distance)).await?;
            ticks += 1;
            scrolled += u64::from(scroll_distance);

            let bottom = position.get("bottom").and_then(|v| v.as_f64());
            let height = position.get("height").and_then(|v| v.as_f64());
            if let (Some(bottom), Some(height)) = (bottom, height) {
                if bottom >= height {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(scroll_delay_ms)).await;
        }
        debug!("Auto-scroll finished after {} tick(s), {}px", ticks, scrolled);

        tokio::time::sleep(Duration::from_millis(pause_after_scroll_ms)).await;
        Ok(())
    }
}

#[async_trait]
impl PageSource for BrowserPageSource<'_> {
    async fn fetch_page(&mut self, url: &str, _page: u32) -> Result<RawPage, EngineError> {
        self.page.navigate(url, self.navigation_timeout).await?;

        let found = self
            .page
            .wait_for_selector(self.container, self.selector_timeout)
            .await?;
        if !found {
            if self.strict_selector_wait {
                return Err(EngineError::RenderTimeout {
                    stage: format!("selector {}", self.container),
                    timeout_ms: self.selector_timeout.as_millis() as u64,
                });
            }
            warn!(
                "Container {} did not appear on {} within {:?}, extracting anyway",
                self.container, url, self.selector_timeout
            );
        }

        self.auto_scroll().await?;

        let html = self.page.content().await?;
        let final_url = match self.page.current_url().await {
            Ok(current) if !current.is_empty() => current,
            _ => url.to_string(),
        };
        Ok(RawPage {
            html,
            url: final_url,
        })
    }
}

#[async_trait]
impl ScrapeStrategy for RenderedStrategy {
    async fn scrape(
        &self,
        job: &ScrapeJob,
        config: &DomainConfig,
        cancel: &CancellationToken,
    ) -> Result<ScrapedData, EngineError> {
        let start = Instant::now();
        let extractor = self.extractors.select(&job.source);
        let controller =
            PaginationController::new(extractor, config, self.settings.rendered_page_delay);

        let page = self.renderer.open_page(&self.page_options()).await?;
        let outcome = {
            let mut source = BrowserPageSource {
                page: page.as_ref(),
                container: &config.selectors.container,
                render: config.render_options(),
                navigation_timeout: self.settings.navigation_timeout(),
                selector_timeout: self.settings.selector_timeout(),
                strict_selector_wait: self.settings.strict_selector_wait,
            };
            controller.run(job, &mut source, cancel).await
        };
        page.close().await;
        let outcome = outcome?;

        let mut data = ScrapedData::empty(job.source.clone(), job.query.clone(), self.strategy_type());
        data.title = outcome.title;
        data.items = outcome.items;
        data.metadata.pages_scraped = outcome.pages_scraped;
        data.metadata.execution_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Rendered scrape of {} finished: {} item(s) over {} page(s)",
            job.source,
            data.items.len(),
            data.metadata.pages_scraped
        );
        Ok(data)
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::Rendered
    }
}

#[cfg(test)]
#[path = "rendered_strategy_test.rs"]
mod tests;
