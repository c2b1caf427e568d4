// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::models::StrategyType;

/// 域名到上次成功策略的缓存
///
/// 只影响初始策略的选择，缺失时重新按配置计算
#[derive(Default)]
pub struct StrategyCache {
    entries: RwLock<HashMap<String, StrategyType>>,
}

impl StrategyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: &str) -> Option<StrategyType> {
        self.entries.read().get(domain).copied()
    }

    pub fn record(&self, domain: &str, strategy: StrategyType) {
        self.entries.write().insert(domain.to_string(), strategy);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
