// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::Mutex;
use scrapeflow::domain::models::{DomainConfig, ScrapeJob, ScrapedData, ScrapedItem, StrategyType};
use scrapeflow::domain::services::progress::{ProgressEvent, ProgressReporter};
use scrapeflow::engines::traits::{
    EngineError, PageOptions, RenderedPage, Renderer, ScrapeStrategy,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 收集所有进度事件
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressReporter for RecordingReporter {
    fn report_progress(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}

/// 返回固定条目的策略
pub struct FixedStrategy {
    kind: StrategyType,
    items: Vec<ScrapedItem>,
    pub calls: AtomicUsize,
}

impl FixedStrategy {
    pub fn new(kind: StrategyType, items: Vec<ScrapedItem>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            items,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScrapeStrategy for FixedStrategy {
    async fn scrape(
        &self,
        job: &ScrapeJob,
        _config: &DomainConfig,
        _cancel: &CancellationToken,
    ) -> Result<ScrapedData, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut data = ScrapedData::empty(job.source.clone(), job.query.clone(), self.kind);
        data.items = self.items.clone();
        data.metadata.pages_scraped = 1;
        Ok(data)
    }

    fn strategy_type(&self) -> StrategyType {
        self.kind
    }
}

pub fn items(n: usize) -> Vec<ScrapedItem> {
    (0..n)
        .map(|i| ScrapedItem {
            title: Some(format!("Item {i}")),
            url: Some(format!("https://shop.test/item/{i}")),
            ..Default::default()
        })
        .collect()
}

/// 按 URL 返回固定 HTML 的渲染器
#[derive(Clone, Default)]
pub struct StaticRenderer {
    pages: Arc<HashMap<String, String>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub shutdowns: Arc<AtomicUsize>,
}

impl StaticRenderer {
    pub fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages: Arc::new(pages),
            ..Default::default()
        }
    }
}

struct StaticPage {
    pages: Arc<HashMap<String, String>>,
    current: Mutex<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderedPage for StaticPage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), EngineError> {
        if !self.pages.contains_key(url) {
            return Err(EngineError::RenderFailed(format!("no page for {url}")));
        }
        *self.current.lock() = url.to_string();
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> Result<bool, EngineError> {
        Ok(true)
    }

    async fn evaluate(&self, _script: &str) -> Result<Value, EngineError> {
        Ok(json!({ "bottom": 1000, "height": 1000 }))
    }

    async fn content(&self) -> Result<String, EngineError> {
        let current = self.current.lock().clone();
        Ok(self.pages.get(&current).cloned().unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        Ok(self.current.lock().clone())
    }

    async fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn open_page(&self, _options: &PageOptions) -> Result<Box<dyn RenderedPage>, EngineError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticPage {
            pages: self.pages.clone(),
            current: Mutex::new(String::new()),
            closed: self.closed.clone(),
        }))
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
