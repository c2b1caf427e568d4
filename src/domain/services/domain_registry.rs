// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::builtin_domains::{builtin_configs, generic_config, DOMAIN_ALIASES};
use crate::domain::models::DomainConfig;
use crate::utils::url_utils::normalize_domain;

/// 域名配置注册表
///
/// 启动时注册，之后以读为主；任何输入都能解析出一个配置
pub struct DomainRegistry {
    configs: RwLock<HashMap<String, Arc<DomainConfig>>>,
    aliases: HashMap<String, String>,
    generic: Arc<DomainConfig>,
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainRegistry {
    /// 创建带内置目录的注册表
    pub fn new() -> Self {
        let registry = Self::empty();
        for config in builtin_configs() {
            registry.register_domain(config);
        }
        registry
    }

    /// 只有通用兜底配置和别名的注册表
    pub fn empty() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
            aliases: DOMAIN_ALIASES
                .iter()
                .map(|(alias, target)| (alias.to_string(), target.to_string()))
                .collect(),
            generic: Arc::new(generic_config()),
        }
    }

    /// 注册或覆盖一个域名配置
    ///
    /// 以规范化后的域名为键，重复注册同一配置结果不变
    pub fn register_domain(&self, mut config: DomainConfig) {
        let key = normalize_domain(&config.domain);
        config.domain = key.clone();
        debug!("Registering domain config for {}", key);
        self.configs.write().insert(key, Arc::new(config));
    }

    /// 解析域名配置
    ///
    /// 依次尝试：精确匹配、裸站点别名、后缀/子串匹配（最长键优先）、通用兜底。
    ///
    /// # 参数
    ///
    /// * `domain` - 站点标识或URL，内部会先规范化
    ///
    /// # 返回值
    ///
    /// 永远返回一个配置
    pub fn get_config(&self, domain: &str) -> Arc<DomainConfig> {
        let key = normalize_domain(domain);
        let configs = self.configs.read();

        if let Some(config) = configs.get(&key) {
            return config.clone();
        }

        if !key.contains('.') {
            if let Some(config) = self.aliases.get(&key).and_then(|t| configs.get(t)) {
                return config.clone();
            }
        }

        if !key.is_empty() {
            let matched = configs
                .iter()
                .filter(|(registered, _)| {
                    key.ends_with(&format!(".{}", registered)) || key.contains(registered.as_str())
                })
                .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)));
            if let Some((registered, config)) = matched {
                debug!("Domain {} matched registered key {}", key, registered);
                return config.clone();
            }
        }

        debug!("No specific config for {}, using generic fallback", key);
        self.generic.clone()
    }

    /// 通用兜底配置
    pub fn generic(&self) -> Arc<DomainConfig> {
        self.generic.clone()
    }

    /// 已注册的域名键（排序后）
    pub fn list_domains(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.configs.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
#[path = "domain_registry_test.rs"]
mod tests;
