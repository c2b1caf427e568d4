// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 解析失败时返回 None，空串同样视为无效
pub fn resolve_href(base_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    resolve_url(base_url, href).ok().map(String::from)
}

/// 规范化站点标识
///
/// 小写、去掉协议和前导 `www.`，并在第一个 `/` 处截断。
/// 规范化是幂等的。
///
/// # 参数
///
/// * `source` - 站点标识或完整URL
///
/// # 返回值
///
/// 规范化后的域名键
pub fn normalize_domain(source: &str) -> String {
    let lower = source.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let mut host = without_scheme.split('/').next().unwrap_or_default().trim();
    while let Some(rest) = host.strip_prefix("www.") {
        host = rest.trim_start();
    }
    host.to_string()
}

/// source 是否是完整的 http(s) URL
pub fn is_absolute_http(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
