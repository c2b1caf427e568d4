// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

use crate::domain::models::ScrapedData;

/// 少于该数量的结果被认为可能依赖 JS 渲染
pub const MIN_EXPECTED_ITEMS: usize = 3;

/// 升级到渲染策略的原因
///
/// 只用于日志和指标，不会作为错误返回
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    /// 没有任何条目
    NoItems,
    /// 条目过少
    TooFewItems(usize),
    /// 超过一半的条目既没有标题也没有链接
    MostlyIncomplete { incomplete: usize, total: usize },
    /// 静态抓取本身失败
    LightweightFailed,
}

impl EscalationReason {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            EscalationReason::NoItems => "no_items",
            EscalationReason::TooFewItems(_) => "too_few_items",
            EscalationReason::MostlyIncomplete { .. } => "mostly_incomplete",
            EscalationReason::LightweightFailed => "lightweight_failed",
        }
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationReason::NoItems => write!(f, "no items extracted"),
            EscalationReason::TooFewItems(n) => write!(f, "only {} item(s) extracted", n),
            EscalationReason::MostlyIncomplete { incomplete, total } => write!(
                f,
                "{}/{} items missing both title and url",
                incomplete, total
            ),
            EscalationReason::LightweightFailed => write!(f, "lightweight strategy failed"),
        }
    }
}

/// 判断静态抓取的结果是否不足
///
/// 纯函数，不访问网络
///
/// # 返回值
///
/// 需要升级时返回原因
pub fn escalation_reason(result: &ScrapedData) -> Option<EscalationReason> {
    let total = result.items.len();
    if total == 0 {
        return Some(EscalationReason::NoItems);
    }
    if total < MIN_EXPECTED_ITEMS {
        return Some(EscalationReason::TooFewItems(total));
    }
    let incomplete = result
        .items
        .iter()
        .filter(|item| !item.has_title() && !item.has_url())
        .count();
    if incomplete * 2 > total {
        return Some(EscalationReason::MostlyIncomplete { incomplete, total });
    }
    None
}

/// 是否需要升级到渲染策略
pub fn needs_escalation(result: &ScrapedData) -> bool {
    escalation_reason(result).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ScrapedItem, StrategyType};

    fn data(items: Vec<ScrapedItem>) -> ScrapedData {
        let mut data = ScrapedData::empty("shop.example", None, StrategyType::Lightweight);
        data.items = items;
        data
    }

    fn complete(i: usize) -> ScrapedItem {
        ScrapedItem {
            title: Some(format!("item {}", i)),
            url: Some(format!("https://shop.example/{}", i)),
            ..Default::default()
        }
    }

    fn hollow() -> ScrapedItem {
        ScrapedItem {
            description: Some("x".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_result_escalates() {
        assert_eq!(escalation_reason(&data(vec![])), Some(EscalationReason::NoItems));
        assert!(needs_escalation(&data(vec![])));
    }

    #[test]
    fn test_fewer_than_three_items_escalates() {
        let single = ScrapedItem {
            title: Some("only".into()),
            url: None,
            ..Default::default()
        };
        assert_eq!(
            escalation_reason(&data(vec![single])),
            Some(EscalationReason::TooFewItems(1))
        );
        assert!(needs_escalation(&data(vec![complete(1), complete(2)])));
    }

    #[test]
    fn test_enough_complete_items_do_not_escalate() {
        assert!(!needs_escalation(&data((0..3).map(complete).collect())));
        assert!(!needs_escalation(&data(vec![
            complete(1),
            complete(2),
            hollow(),
            hollow()
        ])));
    }

    #[test]
    fn test_majority_incomplete_escalates() {
        let result = data(vec![complete(1), hollow(), hollow()]);
        assert_eq!(
            escalation_reason(&result),
            Some(EscalationReason::MostlyIncomplete {
                incomplete: 2,
                total: 3
            })
        );
    }

    #[test]
    fn test_title_or_url_alone_counts_as_complete() {
        let title_only = ScrapedItem {
            title: Some("t".into()),
            ..Default::default()
        };
        let url_only = ScrapedItem {
            url: Some("https://x/1".into()),
            ..Default::default()
        };
        assert!(!needs_escalation(&data(vec![
            title_only.clone(),
            url_only,
            title_only
        ])));
    }
}
