//! Product import pipeline: marketplace detection, proxied fetching with
//! retry, field extraction, and normalization into validated records.

pub mod catalog;
pub mod csv_import;
pub mod error;
pub mod fetch;
pub mod html;
pub mod normalize;
pub mod pipeline;
pub mod proxy;
pub mod rate_limit;
pub mod retry;
pub mod sites;
pub mod types;

pub use catalog::{extract_product_links, CatalogReport};
pub use csv_import::{import_csv_file, parse_csv_products};
pub use error::{ExtractField, ImportError};
pub use fetch::ImportClient;
pub use normalize::{normalize_product, parse_price};
pub use pipeline::Importer;
pub use proxy::{proxied_url, ProxyPool, DEFAULT_PROXIES};
pub use rate_limit::RateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sites::{FetchMode, SiteAdapter, SiteRegistry};
pub use types::{RawProduct, RawReview, RawVariant};
