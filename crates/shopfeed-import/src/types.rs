use std::collections::BTreeMap;

use serde::Deserialize;

/// Product fields as extracted from a page or feed, before normalization.
///
/// Prices stay textual at this stage; currency symbols and separator
/// conventions are resolved by the normalizer.
#[derive(Debug, Clone, Default)]
pub struct RawProduct {
    pub title: String,
    pub description: String,
    pub price_text: String,
    pub images: Vec<String>,
    pub variants: Vec<RawVariant>,
    pub reviews: Vec<RawReview>,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVariant {
    pub title: String,
    #[serde(default)]
    pub price_text: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RawReview {
    pub rating: u8,
    pub comment: String,
    pub author: String,
    pub date: Option<String>,
    pub verified: bool,
    pub helpful: i32,
}
