//! Marketplace adapters and the dispatch registry.
//!
//! Each adapter knows how to recognize its marketplace's product URLs and
//! how to turn a fetched page or feed document into a [`RawProduct`]. The
//! fetch itself stays in the pipeline; adapters only declare which fetch
//! strategy they need, which keeps the trait object-safe and the parsers
//! testable against fixture files.

mod aliexpress;
mod amazon;
mod shein;
mod shopify;
mod temu;

pub use aliexpress::AliExpressAdapter;
pub use amazon::AmazonAdapter;
pub use shein::SheinAdapter;
pub use shopify::ShopifyAdapter;
pub use temu::TemuAdapter;

use shopfeed_core::Marketplace;

use crate::error::ImportError;
use crate::types::RawProduct;

/// How the pipeline obtains a document for an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Page HTML fetched through a CORS proxy, parsed with [`SiteAdapter::parse_html`].
    ProxiedHtml,
    /// A JSON endpoint derived from the product URL, parsed with
    /// [`SiteAdapter::parse_json`].
    ProductJson,
    /// URL shape is recognized but no extraction path exists yet.
    Unavailable,
}

pub trait SiteAdapter: Send + Sync {
    fn site(&self) -> Marketplace;

    /// Whether a URL belongs to this marketplace at all, regardless of
    /// whether it points at a product page.
    fn matches(&self, url: &str) -> bool;

    /// Checks that the URL has the shape of a product page.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidUrl`] when it does not.
    fn validate(&self, url: &str) -> Result<(), ImportError>;

    fn fetch_mode(&self) -> FetchMode {
        FetchMode::ProxiedHtml
    }

    /// Extracts raw product fields from page HTML.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::LoginRedirect`] or [`ImportError::Unavailable`]
    /// when the page is a login wall or a dead listing, and
    /// [`ImportError::MissingField`] when required fields cannot be found.
    fn parse_html(&self, html: &str) -> Result<RawProduct, ImportError> {
        let _ = html;
        Err(ImportError::AdapterUnavailable { site: self.site() })
    }

    /// JSON endpoint to fetch for a product URL, for [`FetchMode::ProductJson`]
    /// adapters.
    fn product_json_url(&self, url: &str) -> Option<String> {
        let _ = url;
        None
    }

    /// Extracts raw product fields from a feed document.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Deserialize`] when the document does not have
    /// the expected shape.
    fn parse_json(&self, value: &serde_json::Value, url: &str) -> Result<RawProduct, ImportError> {
        let _ = (value, url);
        Err(ImportError::AdapterUnavailable { site: self.site() })
    }

    /// Referer header to send with page fetches, when the marketplace
    /// expects one.
    fn referer(&self) -> Option<&'static str> {
        None
    }
}

/// Ordered adapter list; the first adapter whose [`SiteAdapter::matches`]
/// accepts a URL handles it.
pub struct SiteRegistry {
    adapters: Vec<Box<dyn SiteAdapter>>,
}

impl Default for SiteRegistry {
    fn default() -> Self {
        let mut registry = Self {
            adapters: Vec::new(),
        };
        registry.register(Box::new(ShopifyAdapter));
        registry.register(Box::new(AliExpressAdapter));
        registry.register(Box::new(AmazonAdapter));
        registry.register(Box::new(TemuAdapter));
        registry.register(Box::new(SheinAdapter));
        registry
    }
}

impl SiteRegistry {
    pub fn register(&mut self, adapter: Box<dyn SiteAdapter>) {
        self.adapters.push(adapter);
    }

    /// Finds the adapter for a product URL.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnsupportedMarketplace`] when no registered
    /// adapter recognizes the URL's domain.
    pub fn detect(&self, url: &str) -> Result<&dyn SiteAdapter, ImportError> {
        self.adapters
            .iter()
            .find(|a| a.matches(url))
            .map(AsRef::as_ref)
            .ok_or_else(|| ImportError::UnsupportedMarketplace {
                url: url.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_marketplace_by_domain() {
        let registry = SiteRegistry::default();
        let cases = [
            ("https://shop.myshopify.com/products/widget", Marketplace::Shopify),
            ("https://www.aliexpress.com/item/100500123.html", Marketplace::AliExpress),
            ("https://www.amazon.com/dp/B000000001", Marketplace::Amazon),
            ("https://www.temu.com/de/widget-601099512345678.html", Marketplace::Temu),
            ("https://us.shein.com/widget-p-123.html", Marketplace::Shein),
        ];
        for (url, expected) in cases {
            let adapter = registry.detect(url).unwrap();
            assert_eq!(adapter.site(), expected, "{url}");
        }
    }

    #[test]
    fn unknown_domain_is_unsupported() {
        let registry = SiteRegistry::default();
        let err = registry.detect("https://example.com/product/1").err().unwrap();
        assert!(matches!(err, ImportError::UnsupportedMarketplace { .. }));
    }
}
