//! Amazon product-page adapter.
//!
//! Amazon serves many page layouts depending on locale, category, and A/B
//! bucket, so every field is extracted through a prioritized selector list
//! with progressively looser fallbacks. Login walls and dead listings are
//! detected before extraction so they surface as their own error variants
//! rather than a generic missing-title failure.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use shopfeed_core::Marketplace;

use crate::error::{ExtractField, ImportError};
use crate::html::{collect_attr, element_text, select_first_text, texts_by_attr_value};
use crate::types::{RawProduct, RawReview, RawVariant};

use super::{FetchMode, SiteAdapter};

const TITLE_SELECTORS: &[&str] = &[
    "#productTitle",
    ".product-title-word-break",
    "h1.a-size-large",
    "#title",
    ".a-size-extra-large",
    r#"[data-feature-name="title"]"#,
];

const PRICE_SELECTORS: &[&str] = &[
    "#priceblock_ourprice",
    "#price_inside_buybox",
    ".a-price .a-offscreen",
    ".a-price-whole",
    "#price",
    ".price3P",
    "#newBuyBoxPrice",
    r#"[data-feature-name="price"]"#,
    ".product-price",
    ".price-value",
    ".selling-price",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    "#productDescription",
    "#feature-bullets",
    "#aplus",
    ".a-expander-content",
    "#bookDescription_feature_div",
];

fn product_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^https?://(?:www\.)?amazon\.(?:com|ca|co\.uk|de|fr|es|it|co\.jp|com\.au|in)(?:/.*)?/(?:dp|gp/product)/[A-Z0-9]{10}",
        )
        .unwrap_or_else(|_| unreachable!())
    })
}

pub struct AmazonAdapter;

impl SiteAdapter for AmazonAdapter {
    fn site(&self) -> Marketplace {
        Marketplace::Amazon
    }

    fn matches(&self, url: &str) -> bool {
        url.to_ascii_lowercase().contains("amazon.")
    }

    fn validate(&self, url: &str) -> Result<(), ImportError> {
        if product_url_re().is_match(url) {
            Ok(())
        } else {
            Err(ImportError::InvalidUrl {
                site: Marketplace::Amazon,
                url: url.to_owned(),
            })
        }
    }

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::ProxiedHtml
    }

    fn parse_html(&self, html: &str) -> Result<RawProduct, ImportError> {
        let document = Html::parse_document(html);

        if is_login_page(&document) {
            return Err(ImportError::LoginRedirect {
                site: Marketplace::Amazon,
            });
        }
        if is_unavailable(&document) {
            return Err(ImportError::Unavailable {
                site: Marketplace::Amazon,
            });
        }

        let title = extract_title(&document).ok_or(ImportError::MissingField {
            site: Marketplace::Amazon,
            field: ExtractField::Title,
        })?;
        let price_text = select_first_text(&document, PRICE_SELECTORS).unwrap_or_default();
        let description = select_first_text(&document, DESCRIPTION_SELECTORS).unwrap_or_default();

        Ok(RawProduct {
            title,
            description,
            price_text,
            images: extract_images(&document),
            variants: extract_variants(&document),
            reviews: extract_reviews(&document),
            sku: None,
            stock: None,
            category: None,
        })
    }

    fn referer(&self) -> Option<&'static str> {
        Some("https://www.amazon.com/")
    }
}

fn has_match(document: &Html, selector: &str) -> bool {
    Selector::parse(selector)
        .map(|s| document.select(&s).next().is_some())
        .unwrap_or(false)
}

fn is_login_page(document: &Html) -> bool {
    has_match(document, r#"form[name="signIn"]"#) || has_match(document, r#"input[name="email"]"#)
}

fn is_unavailable(document: &Html) -> bool {
    let availability = select_first_text(document, &["#availability"]).unwrap_or_default();
    if availability.to_ascii_lowercase().contains("unavailable") {
        return true;
    }
    if has_match(document, "#outOfStock") {
        return true;
    }
    select_first_text(document, &[".a-color-price"])
        .is_some_and(|t| t.to_ascii_lowercase().contains("currently unavailable"))
}

fn extract_title(document: &Html) -> Option<String> {
    if let Some(title) = select_first_text(document, TITLE_SELECTORS) {
        return Some(title);
    }
    // Fallback 1: any h1 with real content that is not a login prompt.
    if let Ok(selector) = Selector::parse("h1") {
        for element in document.select(&selector) {
            let text = element_text(element);
            if text.len() > 10 && !text.to_ascii_lowercase().contains("sign in") {
                return Some(text);
            }
        }
    }
    // Fallback 2: any element whose class/id/data attribute mentions a
    // title, with the same length and sign-in filters.
    for text in texts_by_attr_value(document, "title") {
        if text.len() > 10 && !text.to_ascii_lowercase().contains("sign in") {
            return Some(text);
        }
    }
    // Fallback 3: first plausibly-sized section heading, same sign-in filter.
    if let Ok(selector) = Selector::parse(".a-section, section") {
        for element in document.select(&selector) {
            let text = element_text(element);
            if (10..=200).contains(&text.len()) && !text.to_ascii_lowercase().contains("sign in") {
                return Some(text);
            }
        }
    }
    None
}

fn extract_images(document: &Html) -> Vec<String> {
    let mut images = Vec::new();
    images.extend(collect_attr(document, "#landingImage", "src"));
    images.extend(collect_attr(document, "#imgBlkFront", "src"));
    // High-resolution source kept in a data attribute on the main image.
    images.extend(collect_attr(document, "[data-old-hires]", "data-old-hires"));

    // The main gallery often lives in a dynamic-image JSON attribute keyed
    // by URL.
    for blob in collect_attr(document, "[data-a-dynamic-image]", "data-a-dynamic-image") {
        if let Ok(map) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&blob) {
            images.extend(map.keys().cloned());
        }
    }

    images.extend(collect_attr(document, "#altImages img", "src"));
    images.extend(collect_attr(document, "#imageBlock img", "src"));

    images.retain(|url| {
        let lower = url.to_ascii_lowercase();
        !lower.contains("spinner") && !lower.contains("overlay") && !lower.contains("play-button")
    });
    images
}

fn extract_variants(document: &Html) -> Vec<RawVariant> {
    let Ok(selector) = Selector::parse("#variation_color_name li, #variation_size_name li") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| {
            let title = element
                .value()
                .attr("title")
                .map(|t| t.trim_start_matches("Click to select ").trim().to_owned())
                .filter(|t| !t.is_empty())?;
            let price_text = element
                .value()
                .attr("data-price")
                .map(str::to_owned)
                .filter(|p| !p.is_empty());
            let key = if title.to_ascii_lowercase().contains("color") {
                "color"
            } else {
                "size"
            };
            let mut options = BTreeMap::new();
            options.insert(key.to_owned(), title.clone());
            Some(RawVariant {
                title,
                price_text,
                sku: None,
                stock: None,
                options,
            })
        })
        .collect()
}

fn leading_rating(text: &str) -> Option<u8> {
    let digits: String = text.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn extract_reviews(document: &Html) -> Vec<RawReview> {
    let Ok(review_sel) = Selector::parse(".review") else {
        return Vec::new();
    };
    document
        .select(&review_sel)
        .filter_map(|review| {
            let fragment = Html::parse_fragment(&review.html());
            let rating_text =
                select_first_text(&fragment, &[".a-icon-star", ".rating"]).unwrap_or_default();
            let rating = leading_rating(rating_text.trim())?;
            let comment =
                select_first_text(&fragment, &[".review-text", ".review-text-content"])
                    .unwrap_or_default();
            let author =
                select_first_text(&fragment, &[".a-profile-name"]).unwrap_or_default();
            if comment.is_empty() || author.is_empty() {
                return None;
            }
            let date = select_first_text(&fragment, &[".review-date"]);
            let verified = select_first_text(&fragment, &[".avp-badge", ".verified-purchase"])
                .is_some();
            Some(RawReview {
                rating,
                comment,
                author,
                date,
                verified,
                helpful: 0,
            })
        })
        .collect()
}
