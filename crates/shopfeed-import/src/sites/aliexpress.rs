//! AliExpress product-page adapter.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use shopfeed_core::Marketplace;

use crate::error::{ExtractField, ImportError};
use crate::html::{collect_attr, select_first_text};
use crate::types::RawProduct;

use super::{FetchMode, SiteAdapter};

fn product_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://(?:[^/]*\.)?aliexpress\.com/item/")
            .unwrap_or_else(|_| unreachable!())
    })
}

pub struct AliExpressAdapter;

impl SiteAdapter for AliExpressAdapter {
    fn site(&self) -> Marketplace {
        Marketplace::AliExpress
    }

    fn matches(&self, url: &str) -> bool {
        url.to_ascii_lowercase().contains("aliexpress.com")
    }

    fn validate(&self, url: &str) -> Result<(), ImportError> {
        if product_url_re().is_match(url) {
            Ok(())
        } else {
            Err(ImportError::InvalidUrl {
                site: Marketplace::AliExpress,
                url: url.to_owned(),
            })
        }
    }

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::ProxiedHtml
    }

    fn parse_html(&self, html: &str) -> Result<RawProduct, ImportError> {
        let document = Html::parse_document(html);

        let title = select_first_text(&document, &[".product-title", "h1"]).ok_or(
            ImportError::MissingField {
                site: Marketplace::AliExpress,
                field: ExtractField::Title,
            },
        )?;
        let price_text =
            select_first_text(&document, &[".product-price-value", ".uniform-banner-box-price"])
                .unwrap_or_default();
        let description = description_html(&document);

        Ok(RawProduct {
            title,
            description,
            price_text,
            images: collect_attr(&document, ".images-view-item img", "src"),
            variants: Vec::new(),
            reviews: Vec::new(),
            sku: None,
            stock: None,
            category: None,
        })
    }
}

// Descriptions are kept as markup here since listings lean on formatted
// seller content.
fn description_html(document: &Html) -> String {
    let Ok(selector) = Selector::parse(".product-description") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|e| e.inner_html().trim().to_owned())
        .unwrap_or_default()
}
