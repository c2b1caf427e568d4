// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::models::{DomainConfig, ScrapeJob, ScrapedData, StrategyType};

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 网络错误或无法获取页面
    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },
    /// 非 2xx 响应
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    /// 浏览器启动、开页或导航失败
    #[error("Render failed: {0}")]
    RenderFailed(String),
    /// 浏览器阶段超时
    #[error("Render timed out during {stage} after {timeout_ms}ms")]
    RenderTimeout { stage: String, timeout_ms: u64 },
    /// 上游 API 返回错误
    #[error("Upstream API error (status {status}): {message}")]
    UpstreamApi { status: u16, message: String },
    /// 查询无法被策略理解
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// 任务在开始前被取消
    #[error("Cancelled")]
    Cancelled,
    /// 请求失败
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Request(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            EngineError::FetchFailed { .. } => true,
            EngineError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            EngineError::RenderFailed(_) | EngineError::RenderTimeout { .. } => true,
            EngineError::UpstreamApi { status, .. } => *status == 429 || *status >= 500,
            EngineError::InvalidQuery(_) | EngineError::Cancelled => false,
        }
    }

    /// 指标与日志使用的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::FetchFailed { .. } | EngineError::Request(_) => "fetch_failed",
            EngineError::HttpStatus { .. } => "http_status",
            EngineError::RenderFailed(_) => "render_failed",
            EngineError::RenderTimeout { .. } => "render_timeout",
            EngineError::UpstreamApi { .. } => "upstream_api",
            EngineError::InvalidQuery(_) => "invalid_query",
            EngineError::Cancelled => "cancelled",
        }
    }
}

/// 抓取策略特质
///
/// 三种变体：静态抓取、浏览器渲染、直连 API
#[async_trait]
pub trait ScrapeStrategy: Send + Sync {
    /// 执行抓取
    ///
    /// # 参数
    ///
    /// * `job` - 抓取任务
    /// * `config` - 已解析的域名配置
    /// * `cancel` - 在页边界检查的取消信号
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapedData)` - 聚合后的结果，空列表也是成功
    /// * `Err(EngineError)` - 策略级失败
    async fn scrape(
        &self,
        job: &ScrapeJob,
        config: &DomainConfig,
        cancel: &CancellationToken,
    ) -> Result<ScrapedData, EngineError>;

    /// 策略类型
    fn strategy_type(&self) -> StrategyType;
}

/// HTTP 请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 请求头
    pub headers: HashMap<String, String>,
    /// 超时时间
    pub timeout: Duration,
}

/// HTTP 响应
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub content: String,
    /// 重定向后的最终URL
    pub final_url: String,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// HTTP 抓取能力
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// 带自定义请求头和超时的 GET
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError>;

    /// 以 JSON 作为请求体的 POST
    async fn post_json(&self, request: &FetchRequest, body: &Value)
        -> Result<FetchResponse, EngineError>;
}

/// 打开页面时的参数
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub user_agent: String,
    /// 额外请求头
    pub headers: HashMap<String, String>,
    /// 需要拦截的资源类型（image、font、media ...）
    pub blocked_resource_types: Vec<String>,
}

/// 浏览器中的一个页面
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// 导航并等待加载
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), EngineError>;

    /// 等待选择器出现，超时返回 Ok(false)
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool, EngineError>;

    /// 执行一段脚本并返回 JSON 结果
    async fn evaluate(&self, script: &str) -> Result<Value, EngineError>;

    /// 当前 DOM 的 HTML
    async fn content(&self) -> Result<String, EngineError>;

    /// 当前地址
    async fn current_url(&self) -> Result<String, EngineError>;

    /// 关闭页面
    async fn close(self: Box<Self>);
}

/// 浏览器渲染能力
///
/// 进程内共享同一个浏览器会话，每个任务独占自己的页面
#[async_trait]
pub trait Renderer: Send + Sync {
    /// 打开一个新页面（必要时先启动浏览器）
    async fn open_page(&self, options: &PageOptions) -> Result<Box<dyn RenderedPage>, EngineError>;

    /// 关闭浏览器会话
    async fn shutdown(&self);
}
