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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::models::{DelayRange, DomainConfig};
use crate::domain::services::rate_limiting_service::RateLimitConfig;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7";

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 抓取配置
    pub scrape: ScrapeSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitConfig,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub logging: LoggingSettings,
    /// 启动时额外注册的域名配置
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeSettings {
    pub user_agent: String,
    pub accept_language: String,
    /// 静态抓取的请求超时（毫秒）
    pub http_timeout_ms: u64,
    /// 浏览器导航超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 等待容器选择器的超时（毫秒）
    pub selector_timeout_ms: u64,
    /// 单个任务的总超时（秒），由调用方施加
    pub job_timeout_secs: u64,
    /// 容器选择器超时是否视为渲染失败
    pub strict_selector_wait: bool,
    pub lightweight_page_delay: DelayRange,
    pub rendered_page_delay: DelayRange,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            http_timeout_ms: 10_000,
            navigation_timeout_ms: 30_000,
            selector_timeout_ms: 30_000,
            job_timeout_secs: 300,
            strict_selector_wait: false,
            lightweight_page_delay: DelayRange::new(1000, 1500),
            rendered_page_delay: DelayRange::new(1000, 2000),
        }
    }
}

impl ScrapeSettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 远程 DevTools 地址，设置后不再本地启动浏览器
    #[serde(default)]
    pub remote_debugging_url: Option<String>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// 拦截的资源类型
    pub blocked_resource_types: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            remote_debugging_url: None,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            blocked_resource_types: vec!["image".into(), "font".into(), "media".into()],
        }
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_address: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 是否输出 JSON 格式
    pub json: bool,
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let scrape = ScrapeSettings::default();
    let browser = BrowserSettings::default();
    let rate_limiting = RateLimitConfig::default();

    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("scrape.user_agent", scrape.user_agent)?
        .set_default("scrape.accept_language", scrape.accept_language)?
        .set_default("scrape.http_timeout_ms", scrape.http_timeout_ms)?
        .set_default("scrape.navigation_timeout_ms", scrape.navigation_timeout_ms)?
        .set_default("scrape.selector_timeout_ms", scrape.selector_timeout_ms)?
        .set_default("scrape.job_timeout_secs", scrape.job_timeout_secs)?
        .set_default("scrape.strict_selector_wait", scrape.strict_selector_wait)?
        .set_default("scrape.lightweight_page_delay.min_ms", scrape.lightweight_page_delay.min_ms)?
        .set_default("scrape.lightweight_page_delay.max_ms", scrape.lightweight_page_delay.max_ms)?
        .set_default("scrape.rendered_page_delay.min_ms", scrape.rendered_page_delay.min_ms)?
        .set_default("scrape.rendered_page_delay.max_ms", scrape.rendered_page_delay.max_ms)?
        .set_default("browser.headless", browser.headless)?
        .set_default("browser.window_width", browser.window_width)?
        .set_default("browser.window_height", browser.window_height)?
        .set_default("browser.blocked_resource_types", browser.blocked_resource_types)?
        .set_default("rate_limiting.enabled", rate_limiting.enabled)?
        .set_default("rate_limiting.limit", rate_limiting.limit)?
        .set_default("rate_limiting.interval_ms", rate_limiting.interval_ms)?
        .set_default("rate_limiting.cleanup_ms", rate_limiting.cleanup_ms)?
        .set_default("metrics.enabled", true)?
        .set_default("metrics.listen_address", "0.0.0.0:9000")?
        .set_default("logging.json", false)
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加：内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`、
    /// 以 `SCRAPEFLOW__` 为前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SCRAPEFLOW").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 在默认值之上加载指定文件
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        with_defaults()?
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("SCRAPEFLOW").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅由内置默认值构成的配置
    pub fn defaults() -> Result<Self, ConfigError> {
        with_defaults()?.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
