// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了引擎的核心数据结构，包括：
/// - 抓取任务（scrape_job）：一次抓取请求的输入
/// - 抓取结果（scraped_data）：条目、价格与元数据
/// - 域名配置（domain_config）：选择器、策略与站点选项
pub mod domain_config;
pub mod scrape_job;
pub mod scraped_data;

pub use domain_config::{
    ApiOptions, DelayRange, DomainConfig, DomainOptions, RenderOptions, Selectors, StrategyType,
};
pub use scrape_job::ScrapeJob;
pub use scraped_data::{Price, ScrapeMetadata, ScrapedData, ScrapedItem};
