// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 抓取引擎模块
///
/// - 能力抽象（traits）：HTTP 抓取、浏览器渲染、抓取策略
/// - 三种策略：静态抓取、浏览器渲染、直连 API
/// - 分页控制、JS 依赖判断、策略缓存与编排
pub mod api_strategy;
pub mod chromium_renderer;
pub mod escalation;
pub mod lightweight_strategy;
pub mod orchestrator;
pub mod pagination;
pub mod reqwest_engine;
pub mod rendered_strategy;
pub mod strategy_cache;
pub mod traits;

pub use orchestrator::{ScrapeOrchestrator, Strategies};
