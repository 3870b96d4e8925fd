use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source marketplace a product was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Amazon,
    AliExpress,
    Shopify,
    Temu,
    Shein,
    /// Local file import; carries no source URL.
    Csv,
}

impl Marketplace {
    /// Stable identifier stored in `metadata.source`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Marketplace::Amazon => "amazon",
            Marketplace::AliExpress => "aliexpress",
            Marketplace::Shopify => "shopify",
            Marketplace::Temu => "temu",
            Marketplace::Shein => "shein",
            Marketplace::Csv => "csv",
        }
    }
}

impl std::fmt::Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance for an imported product.
///
/// `source_url` is always present for remote imports and always absent for
/// CSV imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub source: Marketplace,
    pub source_url: Option<String>,
    pub imported_at: DateTime<Utc>,
}

impl ProductMetadata {
    #[must_use]
    pub fn remote(source: Marketplace, source_url: &str) -> Self {
        Self {
            source,
            source_url: Some(source_url.to_owned()),
            imported_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn csv() -> Self {
        Self {
            source: Marketplace::Csv,
            source_url: None,
            imported_at: Utc::now(),
        }
    }
}

/// A purchasable sub-option of a product (specific size, color, ...).
///
/// `options` keys are free-form attribute names ("color", "size"); no
/// canonical enumeration is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub title: String,
    pub price: Decimal,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    pub options: BTreeMap<String, String>,
}

/// A customer review scraped alongside a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReview {
    /// Star rating, 1 through 5.
    pub rating: u8,
    pub comment: String,
    pub author: String,
    pub date: String,
    pub verified: bool,
    pub helpful: i32,
}

/// SEO fields generated by the enrichment pass before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoFields {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// The normalized output unit of the import pipeline.
///
/// Constructed transiently during one import invocation, optionally enriched,
/// then inserted in a batch; never mutated afterwards within this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    /// HTML or plain text, whichever the source provided.
    pub description: String,
    pub price: Decimal,
    /// Ordered, deduplicated image URLs. Never empty for a persisted record.
    pub images: Vec<String>,
    pub variants: Option<Vec<ProductVariant>>,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub metadata: ProductMetadata,
    pub reviews: Option<Vec<ProductReview>>,
    pub seo: Option<SeoFields>,
}

impl ProductRecord {
    /// Checks the persistence invariants: non-empty title, positive price,
    /// at least one image, and a source URL whenever the source is remote.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when any invariant is violated.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is empty".to_owned());
        }
        if self.price <= Decimal::ZERO {
            return Err(format!("price {} is not positive", self.price));
        }
        if self.images.is_empty() {
            return Err("record has no images".to_owned());
        }
        match self.metadata.source {
            Marketplace::Csv => {}
            source => {
                if self.metadata.source_url.is_none() {
                    return Err(format!("remote import from {source} has no source URL"));
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if at least one variant is present.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        self.variants.as_ref().is_some_and(|v| !v.is_empty())
    }
}
