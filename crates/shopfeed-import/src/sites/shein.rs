//! Shein adapter: URL validation only, like [`super::TemuAdapter`].

use std::sync::OnceLock;

use regex::Regex;
use shopfeed_core::Marketplace;

use crate::error::ImportError;

use super::{FetchMode, SiteAdapter};

fn product_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://(?:[^/]*\.)?shein\.com/[^?#]*-p-\d+")
            .unwrap_or_else(|_| unreachable!())
    })
}

pub struct SheinAdapter;

impl SiteAdapter for SheinAdapter {
    fn site(&self) -> Marketplace {
        Marketplace::Shein
    }

    fn matches(&self, url: &str) -> bool {
        url.to_ascii_lowercase().contains("shein.com")
    }

    fn validate(&self, url: &str) -> Result<(), ImportError> {
        if product_url_re().is_match(url) {
            Ok(())
        } else {
            Err(ImportError::InvalidUrl {
                site: Marketplace::Shein,
                url: url.to_owned(),
            })
        }
    }

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::Unavailable
    }
}
