//! Temu adapter: URL validation only.
//!
//! Temu renders product data client-side behind aggressive bot protection,
//! so there is no extraction path yet. The adapter still claims the domain
//! so callers get a clear unavailable error instead of an unsupported-site
//! one.

use std::sync::OnceLock;

use regex::Regex;
use shopfeed_core::Marketplace;

use crate::error::ImportError;

use super::{FetchMode, SiteAdapter};

fn product_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://(?:www\.)?temu\.com/(?:[a-z]{2}/)?[^/]+\.html")
            .unwrap_or_else(|_| unreachable!())
    })
}

pub struct TemuAdapter;

impl SiteAdapter for TemuAdapter {
    fn site(&self) -> Marketplace {
        Marketplace::Temu
    }

    fn matches(&self, url: &str) -> bool {
        url.to_ascii_lowercase().contains("temu.com")
    }

    fn validate(&self, url: &str) -> Result<(), ImportError> {
        if product_url_re().is_match(url) {
            Ok(())
        } else {
            Err(ImportError::InvalidUrl {
                site: Marketplace::Temu,
                url: url.to_owned(),
            })
        }
    }

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_product_urls_without_an_extraction_path() {
        let adapter = TemuAdapter;
        assert!(adapter
            .validate("https://www.temu.com/de/steel-widget-g-601099512345678.html")
            .is_ok());
        assert!(adapter.validate("https://www.temu.com/").is_err());
        assert_eq!(adapter.fetch_mode(), FetchMode::Unavailable);
    }
}
