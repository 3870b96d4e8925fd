//! Shopify storefront adapter.
//!
//! Shopify exposes a public JSON document for every product at the product
//! URL with a `.json` suffix, so no proxying or HTML scraping is needed.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use shopfeed_core::Marketplace;

use crate::error::{ExtractField, ImportError};
use crate::types::{RawProduct, RawVariant};

use super::{FetchMode, SiteAdapter};

fn product_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://[^/]*(?:\.myshopify\.com|shopify\.com)/.*/?products/[^/?#]+")
            .unwrap_or_else(|_| unreachable!())
    })
}

#[derive(Deserialize)]
struct ShopifyEnvelope {
    product: ShopifyProduct,
}

#[derive(Deserialize)]
struct ShopifyProduct {
    title: String,
    #[serde(default)]
    body_html: String,
    #[serde(default)]
    product_type: String,
    #[serde(default)]
    images: Vec<ShopifyImage>,
    #[serde(default)]
    variants: Vec<ShopifyVariant>,
}

#[derive(Deserialize)]
struct ShopifyImage {
    src: String,
}

#[derive(Deserialize)]
struct ShopifyVariant {
    title: String,
    price: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    inventory_quantity: Option<i32>,
}

pub struct ShopifyAdapter;

impl SiteAdapter for ShopifyAdapter {
    fn site(&self) -> Marketplace {
        Marketplace::Shopify
    }

    fn matches(&self, url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        lower.contains(".myshopify.com") || lower.contains("shopify.com")
    }

    fn validate(&self, url: &str) -> Result<(), ImportError> {
        if product_url_re().is_match(url) {
            Ok(())
        } else {
            Err(ImportError::InvalidUrl {
                site: Marketplace::Shopify,
                url: url.to_owned(),
            })
        }
    }

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::ProductJson
    }

    fn product_json_url(&self, url: &str) -> Option<String> {
        let base = url.split(['?', '#']).next()?;
        let base = base.trim_end_matches('/');
        if base.ends_with(".json") {
            Some(base.to_owned())
        } else {
            Some(format!("{base}.json"))
        }
    }

    fn parse_json(&self, value: &serde_json::Value, url: &str) -> Result<RawProduct, ImportError> {
        let envelope: ShopifyEnvelope =
            serde_json::from_value(value.clone()).map_err(|source| ImportError::Deserialize {
                context: format!("product document from {url}"),
                source,
            })?;
        let product = envelope.product;

        // The listed price is the first variant's; a product document with
        // no variants carries no price at all.
        let price_text = product
            .variants
            .first()
            .map(|v| v.price.clone())
            .ok_or(ImportError::MissingField {
                site: Marketplace::Shopify,
                field: ExtractField::Price,
            })?;

        let variants = product
            .variants
            .into_iter()
            .map(|v| RawVariant {
                title: v.title,
                price_text: Some(v.price),
                sku: v.sku.filter(|s| !s.is_empty()),
                stock: v.inventory_quantity,
                options: std::collections::BTreeMap::new(),
            })
            .collect();

        Ok(RawProduct {
            title: product.title,
            description: product.body_html,
            price_text,
            images: product.images.into_iter().map(|i| i.src).collect(),
            variants,
            reviews: Vec::new(),
            sku: None,
            stock: None,
            category: if product.product_type.is_empty() {
                None
            } else {
                Some(product.product_type)
            },
        })
    }
}
