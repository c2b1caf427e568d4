// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetBlockedUrLsParams, SetExtraHttpHeadersParams,
};
use chromiumoxide::page::Page;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{EngineError, PageOptions, RenderedPage, Renderer};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 资源类型对应的拦截 URL 模式
fn blocked_patterns(resource_types: &[String]) -> Vec<String> {
    let mut patterns = Vec::new();
    for kind in resource_types {
        let extensions: &[&str] = match kind.to_ascii_lowercase().as_str() {
            "image" => &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "avif"],
            "font" => &["woff", "woff2", "ttf", "otf", "eot"],
            "media" => &["mp4", "webm", "mp3", "ogg", "wav", "m3u8"],
            "stylesheet" => &["css"],
            other => {
                debug!("Unknown resource type to block: {}", other);
                &[]
            }
        };
        patterns.extend(extensions.iter().map(|ext| format!("*.{}*", ext)));
    }
    patterns
}

/// 浏览器进程的启动、开页与关闭
#[async_trait]
pub(crate) trait BrowserBackend: Send + Sync {
    type Session: Send + Sync;
    type Page: Send;

    /// 启动浏览器，返回会话和它的事件循环任务
    async fn launch(&self) -> Result<(Self::Session, JoinHandle<()>), EngineError>;

    async fn new_page(&self, session: &Self::Session) -> Result<Self::Page, EngineError>;

    /// 设置 UA、额外请求头和资源拦截
    async fn prepare_page(&self, page: &Self::Page, options: &PageOptions) -> Result<(), EngineError>;

    async fn close_page(&self, page: Self::Page);

    async fn close(&self, session: Self::Session);
}

struct LiveSession<S> {
    session: S,
    event_loop: JoinHandle<()>,
}

impl<S> LiveSession<S> {
    fn is_alive(&self) -> bool {
        !self.event_loop.is_finished()
    }
}

/// 进程内共享的浏览器会话
///
/// 第一次开页时懒启动。事件循环退出或开页失败时丢弃旧会话并重新启动一次。
pub(crate) struct SharedBrowser<B: BrowserBackend> {
    backend: B,
    live: Mutex<Option<LiveSession<B::Session>>>,
}

impl<B: BrowserBackend> SharedBrowser<B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            live: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<LiveSession<B::Session>, EngineError> {
        let (session, event_loop) = self.backend.launch().await?;
        Ok(LiveSession { session, event_loop })
    }

    async fn new_page(&self) -> Result<B::Page, EngineError> {
        let mut guard = self.live.lock().await;
        let mut live = match guard.take() {
            Some(live) if live.is_alive() => live,
            Some(stale) => {
                warn!("Browser connection lost, relaunching");
                self.backend.close(stale.session).await;
                self.launch().await?
            }
            None => self.launch().await?,
        };

        let page = match self.backend.new_page(&live.session).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Opening a page failed, relaunching browser: {}", e);
                self.backend.close(live.session).await;
                live = self.launch().await?;
                match self.backend.new_page(&live.session).await {
                    Ok(page) => page,
                    Err(e) => {
                        *guard = Some(live);
                        return Err(e);
                    }
                }
            }
        };
        *guard = Some(live);
        Ok(page)
    }

    /// 打开并配置一个页面，配置失败时关闭该页面
    pub(crate) async fn open_page(&self, options: &PageOptions) -> Result<B::Page, EngineError> {
        let page = self.new_page().await?;
        if let Err(e) = self.backend.prepare_page(&page, options).await {
            self.backend.close_page(page).await;
            return Err(e);
        }
        Ok(page)
    }

    pub(crate) async fn shutdown(&self) {
        let Some(live) = self.live.lock().await.take() else {
            return;
        };
        info!("Closing browser session");
        self.backend.close(live.session).await;
    }
}

/// chromiumoxide 后端
pub(crate) struct ChromiumBackend {
    settings: BrowserSettings,
    navigation_timeout: Duration,
}

#[async_trait]
impl BrowserBackend for ChromiumBackend {
    type Session = Browser;
    type Page = Page;

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), EngineError> {
        let (browser, mut handler) = if let Some(url) = &self.settings.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url.as_str())
                .await
                .map_err(|e| EngineError::RenderFailed(format!("connect to {}: {}", url, e)))?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(self.navigation_timeout)
                .window_size(self.settings.window_width, self.settings.window_height)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage");
            if !self.settings.headless {
                builder = builder.with_head();
            }
            let config = builder.build().map_err(EngineError::RenderFailed)?;

            info!("Launching Chromium (headless: {})", self.settings.headless);
            Browser::launch(config)
                .await
                .map_err(|e| EngineError::RenderFailed(format!("launch: {}", e)))?
        };

        let event_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser event loop stopped: {}", e);
                    break;
                }
            }
        });

        Ok((browser, event_loop))
    }

    async fn new_page(&self, browser: &Browser) -> Result<Page, EngineError> {
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::RenderFailed(format!("new page: {}", e)))
    }

    async fn prepare_page(&self, page: &Page, options: &PageOptions) -> Result<(), EngineError> {
        if !options.user_agent.is_empty() {
            page.set_user_agent(options.user_agent.as_str())
                .await
                .map_err(|e| EngineError::RenderFailed(format!("user agent: {}", e)))?;
        }

        if !options.headers.is_empty() {
            let headers = serde_json::to_value(&options.headers)
                .map_err(|e| EngineError::RenderFailed(e.to_string()))?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
                .await
                .map_err(|e| EngineError::RenderFailed(format!("extra headers: {}", e)))?;
        }

        let patterns = blocked_patterns(&options.blocked_resource_types);
        if !patterns.is_empty() {
            if let Err(e) = page.execute(SetBlockedUrLsParams::new(patterns)).await {
                warn!("Could not enable resource blocking: {}", e);
            }
        }
        Ok(())
    }

    async fn close_page(&self, page: Page) {
        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
    }

    async fn close(&self, mut browser: Browser) {
        let closed = tokio::time::timeout(self.navigation_timeout, browser.close()).await;
        match closed {
            Ok(Ok(_)) => {
                if let Err(e) = browser.wait().await {
                    warn!("Failed to wait for browser exit: {}", e);
                }
            }
            Ok(Err(e)) => warn!("Failed to close browser: {}", e),
            Err(_) => warn!("Timed out closing browser"),
        }
    }
}

/// 基于 chromiumoxide 的渲染器
///
/// 浏览器在第一次开页时懒启动，之后整个进程共享；`shutdown` 之后再次开页会重新启动。
pub struct ChromiumRenderer {
    browser: SharedBrowser<ChromiumBackend>,
}

impl ChromiumRenderer {
    pub fn new(settings: BrowserSettings, navigation_timeout: Duration) -> Self {
        Self {
            browser: SharedBrowser::new(ChromiumBackend {
                settings,
                navigation_timeout,
            }),
        }
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_page(&self, options: &PageOptions) -> Result<Box<dyn RenderedPage>, EngineError> {
        let page = self.browser.open_page(options).await?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&self) {
        self.browser.shutdown().await;
    }
}

/// 单个任务独占的浏览器页面
pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl RenderedPage for ChromiumPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), EngineError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(EngineError::RenderFailed(format!("navigate to {}: {}", url, e))),
            Err(_) => Err(EngineError::RenderTimeout {
                stage: "navigation".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::RenderFailed(format!("script: {}", e)))?;
        result
            .into_value()
            .map_err(|e| EngineError::RenderFailed(format!("script result: {:?}", e)))
    }

    async fn content(&self) -> Result<String, EngineError> {
        self.page
            .content()
            .await
            .map_err(|e| EngineError::RenderFailed(format!("content: {}", e)))
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| EngineError::RenderFailed(format!("url: {}", e)))?;
        Ok(url.unwrap_or_default())
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.page.close().await {
            debug!("Failed to close page: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "chromium_renderer_test.rs"]
mod tests;
