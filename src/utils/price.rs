// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::models::Price;

static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.,]").expect("valid regex"));
static LEADING_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d+)?|\.\d+)").expect("valid regex"));

/// 清洗价格文本
///
/// 去掉数字与分隔符以外的字符，把第一个逗号视作小数点，
/// 然后解析开头的浮点数。解析失败时保留原始文本（去除首尾空白）。
///
/// # 参数
///
/// * `raw` - 页面上的价格文本
///
/// # 返回值
///
/// 文本为空时返回 None
pub fn clean_price(raw: &str) -> Option<Price> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_amount(trimmed) {
        Some(amount) => Some(Price::Amount(amount)),
        None => Some(Price::Text(trimmed.to_string())),
    }
}

/// 解析数值部分，无数字时返回 None
pub fn parse_amount(raw: &str) -> Option<f64> {
    let stripped = NON_NUMERIC.replace_all(raw, "");
    let normalized = stripped.replacen(',', ".", 1);
    LEADING_FLOAT
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// 提取文本中所有数字（例如里程 "12 345 km" -> "12345"）
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
