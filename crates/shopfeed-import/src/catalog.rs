//! Catalog imports: discover product links on a listing page and import
//! them through a bounded worker pool.

use futures::StreamExt;
use reqwest::Url;
use scraper::{Html, Selector};
use shopfeed_core::ProductRecord;

use crate::error::ImportError;
use crate::pipeline::Importer;

/// Finds product links on a catalog or collection page.
///
/// Relative hrefs are resolved against `base`; duplicates keep their first
/// position so import order follows the page layout.
#[must_use]
pub fn extract_product_links(html: &str, base: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse(r#"a[href*="/products/"], a[href*="/item/"]"#) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }
    links
}

/// Outcome of a catalog run; failed products are skipped, not fatal.
#[derive(Debug)]
pub struct CatalogReport {
    pub products: Vec<ProductRecord>,
    pub discovered: usize,
    pub failed: usize,
}

impl Importer {
    /// Imports every product discovered on a catalog page, with bounded
    /// concurrency.
    ///
    /// Individual product failures are logged and skipped so one dead
    /// listing does not abort the run.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog URL itself is malformed or its
    /// page cannot be fetched.
    pub async fn import_catalog(&self, url: &str) -> Result<CatalogReport, ImportError> {
        if !url.starts_with("http") {
            return Err(ImportError::CatalogUrl {
                url: url.to_owned(),
            });
        }

        // Catalog pages are fetched directly; only product pages need the
        // proxy relay.
        let html = self.client().fetch_html(url, None).await?;
        let links = extract_product_links(&html, url);
        tracing::info!(url, count = links.len(), "discovered product links");

        let results: Vec<Result<ProductRecord, ImportError>> = futures::stream::iter(
            links.iter().map(|link| async move {
                self.import_url(link).await.map_err(|error| {
                    tracing::warn!(url = link.as_str(), %error, "skipping product");
                    error
                })
            }),
        )
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        let discovered = links.len();
        let mut products = Vec::new();
        let mut failed = 0;
        for result in results {
            match result {
                Ok(record) => products.push(record),
                Err(_) => failed += 1,
            }
        }
        Ok(CatalogReport {
            products,
            discovered,
            failed,
        })
    }
}
