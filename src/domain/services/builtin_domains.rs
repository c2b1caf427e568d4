// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内置的站点配置目录

use std::collections::BTreeMap;

use crate::domain::models::{
    ApiOptions, DelayRange, DomainConfig, DomainOptions, RenderOptions, Selectors, StrategyType,
};

/// 裸站点名到常用顶级域的映射
pub const DOMAIN_ALIASES: &[(&str, &str)] = &[
    ("autoscout24", "autoscout24.fr"),
    ("ebay", "ebay.fr"),
    ("amazon", "amazon.fr"),
    ("leboncoin", "leboncoin.fr"),
];

const AUTOSCOUT24_DEFAULT_SEARCH_URL: &str = "https://www.autoscout24.fr/lst?atype=C&cy=F&desc=0&kmto=90000&mmmv=47%7C%7C%7C%2C13%7C%7C%7C%2C9%7C%7C%7C&page=1&powertype=kw&pricefrom=5000&priceto=100000&search_id=1wz8gihtx2n&sort=standard&source=listpage_pagination&ustate=N%2CU";

fn selectors(container: &str, fields: &[(&str, &str)]) -> Selectors {
    let mut selectors = Selectors::new(container);
    let mut extra = BTreeMap::new();
    for (key, value) in fields {
        let value = Some(value.to_string());
        match *key {
            "title" => selectors.title = value,
            "description" => selectors.description = value,
            "price" => selectors.price = value,
            "url" => selectors.url = value,
            "image" => selectors.image = value,
            "nextPage" => selectors.next_page = value,
            other => {
                extra.insert(other.to_string(), value.unwrap_or_default());
            }
        }
    }
    selectors.extra = extra;
    selectors
}

/// 通用兜底配置，不注册为键
pub fn generic_config() -> DomainConfig {
    DomainConfig::new(
        "*",
        selectors(
            r#"article, .product, .item, .card, div[class*="product"], div[class*="item"]"#,
            &[
                ("title", r#"h1, h2, h3, .title, [class*="title"]"#),
                ("description", r#"p, .description, [class*="description"]"#),
                ("price", r#".price, [class*="price"]"#),
                ("url", "a"),
                ("image", "img"),
            ],
        ),
    )
}

fn amazon() -> DomainConfig {
    DomainConfig::new(
        "amazon.fr",
        selectors(
            ".s-result-item",
            &[
                ("title", ".a-text-normal"),
                ("description", ".a-size-base"),
                ("price", ".a-price .a-offscreen"),
                ("url", ".a-link-normal"),
                ("image", ".s-image"),
                ("rating", r#"[aria-label*="sur 5"]"#),
            ],
        ),
    )
    .rendered()
}

fn ebay(domain: &str) -> DomainConfig {
    DomainConfig::new(
        domain,
        selectors(
            ".s-item__info",
            &[
                ("title", ".s-item__title"),
                ("price", ".s-item__price"),
                ("url", ".s-item__link"),
                ("image", ".s-item__image-img"),
                ("nextPage", ".pagination__next"),
            ],
        ),
    )
}

fn autoscout24() -> DomainConfig {
    DomainConfig::new(
        "autoscout24.fr",
        selectors(
            "article",
            &[
                ("title", ".ListItem_title__znV2I"),
                ("price", r#"[data-testid="regular-price"]"#),
                ("url", "a.ListItem_title__znV2I"),
                ("image", "img.CardImage_img__nbdLB"),
                (
                    "nextPage",
                    r#".scr-pagination a[data-testid="pagination-nav-next"]"#,
                ),
                ("pagination", ".scr-pagination"),
                ("mileage", r#"[data-testid="VehicleDetails-mileage_road"]"#),
                ("description", ".VehicleDetailTable_container__mUUbY"),
                (
                    "city",
                    r#"[data-testid="sellerinfo-address"], [class^="SellerInfo_private_"]"#,
                ),
                ("fallbackTitle", "h2"),
                ("fallbackPrice", r#"[data-testid="price"]"#),
            ],
        ),
    )
    .rendered()
    .with_options(DomainOptions {
        base_url: Some("https://www.autoscout24.fr/lst".to_string()),
        default_search_url: Some(AUTOSCOUT24_DEFAULT_SEARCH_URL.to_string()),
        max_pages: Some(15),
        render: Some(RenderOptions {
            scroll_distance: 100,
            max_scrolls: 50,
            scroll_delay_ms: 100,
            pause_after_scroll_ms: 1000,
            max_scroll_height: 8000,
        }),
        delay_between_pages: Some(DelayRange::new(1500, 2500)),
        ..Default::default()
    })
}

fn leboncoin() -> DomainConfig {
    let mut config = DomainConfig::new(
        "leboncoin.fr",
        selectors(r#"[data-qa-id="aditem_container"]"#, &[]),
    )
    .with_options(DomainOptions {
        api: Some(ApiOptions {
            endpoint: "https://api.leboncoin.fr/finder/search".to_string(),
            api_key: Some("ba0c2dad52b3ec".to_string()),
            origin: Some("https://www.leboncoin.fr".to_string()),
            page_size: 35,
            item_url_template: "https://www.leboncoin.fr/voitures/{id}.htm".to_string(),
            page_delay_ms: 1000,
            pass_delay_ms: 1000,
        }),
        ..Default::default()
    });
    config.default_strategy = StrategyType::DirectApi;
    config
}

/// 内置站点配置
pub fn builtin_configs() -> Vec<DomainConfig> {
    vec![
        amazon(),
        ebay("ebay.com"),
        ebay("ebay.fr"),
        autoscout24(),
        leboncoin(),
    ]
}
