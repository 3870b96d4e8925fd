use shopfeed_core::Marketplace;
use thiserror::Error;

/// A product field the site parser failed to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractField {
    Title,
    Price,
    Images,
}

impl std::fmt::Display for ExtractField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractField::Title => write!(f, "title"),
            ExtractField::Price => write!(f, "price"),
            ExtractField::Images => write!(f, "images"),
        }
    }
}

/// Import pipeline errors.
///
/// Every variant carries a machine-readable kind so callers can branch
/// without string matching; [`ImportError::remediation`] exposes the
/// user-facing checklist text separately from the message.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid {site} URL: {url}")]
    InvalidUrl { site: Marketplace, url: String },

    #[error("unsupported marketplace URL: {url}")]
    UnsupportedMarketplace { url: String },

    #[error("catalog URL must be absolute (http/https): {url}")]
    CatalogUrl { url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("response from {url} was truncated ({len} bytes)")]
    TruncatedBody { url: String, len: usize },

    #[error("redirected to a {site} sign-in page")]
    LoginRedirect { site: Marketplace },

    #[error("product is no longer available on {site}")]
    Unavailable { site: Marketplace },

    #[error("could not find the product {field} on the {site} page")]
    MissingField {
        site: Marketplace,
        field: ExtractField,
    },

    #[error("scraping is not implemented for {site} yet")]
    AdapterUnavailable { site: Marketplace },

    #[error("no CORS proxy is currently available ({tried} probed)")]
    NoWorkingProxy { tried: usize },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not parse \"{raw}\" as a price")]
    InvalidPrice { raw: String },

    #[error("enrichment provider error: {0}")]
    Provider(#[from] shopfeed_enrich::EnrichError),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV record on line {line} is invalid: {reason}")]
    CsvRecord { line: u64, reason: String },
}

impl ImportError {
    /// Returns `true` if the error represents a transient condition worth
    /// retrying after a backoff delay.
    ///
    /// Validation, login-redirect, extraction, and provider errors are final:
    /// retrying them would return the same result and only burn budget.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ImportError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            ImportError::UnexpectedStatus { status, .. } => (500..600).contains(status),
            ImportError::RateLimited { .. }
            | ImportError::TruncatedBody { .. }
            | ImportError::NoWorkingProxy { .. } => true,
            ImportError::InvalidUrl { .. }
            | ImportError::UnsupportedMarketplace { .. }
            | ImportError::CatalogUrl { .. }
            | ImportError::LoginRedirect { .. }
            | ImportError::Unavailable { .. }
            | ImportError::MissingField { .. }
            | ImportError::AdapterUnavailable { .. }
            | ImportError::Deserialize { .. }
            | ImportError::InvalidPrice { .. }
            | ImportError::Provider(_)
            | ImportError::Csv(_)
            | ImportError::CsvRecord { .. } => false,
        }
    }

    /// User-facing checklist of likely causes and next steps, kept separate
    /// from the error message so UIs can render it without parsing.
    #[must_use]
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            ImportError::InvalidUrl { .. }
            | ImportError::UnsupportedMarketplace { .. }
            | ImportError::CatalogUrl { .. } => Some(
                "1. Check that the URL is a product page, not a search or category page\n\
                 2. Copy the URL directly from the browser address bar\n\
                 3. Supported marketplaces: Amazon, AliExpress, Shopify, Temu, Shein",
            ),
            ImportError::Http(e) if e.is_timeout() => Some(
                "1. Check your internet connection\n\
                 2. Retry in a few minutes\n\
                 3. If the problem persists, try another product URL",
            ),
            ImportError::Http(e) if e.is_connect() => Some(
                "1. Check your internet connection\n\
                 2. Disable your VPN if you are using one\n\
                 3. Retry in a few minutes",
            ),
            ImportError::RateLimited { .. } => Some(
                "1. Wait a few minutes before retrying\n\
                 2. Limit the number of products imported at once",
            ),
            ImportError::UnexpectedStatus { status, .. } if (500..600).contains(status) => Some(
                "1. The marketplace is temporarily unavailable\n\
                 2. Retry in a few minutes\n\
                 3. If the problem persists, try another product",
            ),
            ImportError::UnexpectedStatus { status: 403, .. } => Some(
                "1. Check that the URL is correct\n\
                 2. Disable your ad blocker\n\
                 3. Retry in a few minutes",
            ),
            ImportError::UnexpectedStatus { status: 404, .. } => Some(
                "1. Check that the URL is correct\n\
                 2. Check that the product is still listed\n\
                 3. Try another product",
            ),
            ImportError::MissingField { .. } => Some(
                "1. Check that the URL is correct\n\
                 2. Check that the product is still available\n\
                 3. Check that you are not being redirected to a sign-in page",
            ),
            ImportError::NoWorkingProxy { .. } => Some(
                "1. Check your internet connection\n\
                 2. Disable your ad blocker if you are using one\n\
                 3. Retry in a few minutes",
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_retriable() {
        let err = ImportError::RateLimited {
            domain: "amazon.com".to_owned(),
            retry_after_secs: 60,
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn server_error_status_is_retriable() {
        let err = ImportError::UnexpectedStatus {
            status: 503,
            url: "https://example.com".to_owned(),
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn forbidden_status_is_not_retriable() {
        let err = ImportError::UnexpectedStatus {
            status: 403,
            url: "https://example.com".to_owned(),
        };
        assert!(!err.is_retriable());
    }

    #[test]
    fn login_redirect_is_not_retriable() {
        let err = ImportError::LoginRedirect {
            site: Marketplace::Amazon,
        };
        assert!(!err.is_retriable());
    }

    #[test]
    fn missing_field_is_not_retriable_and_has_remediation() {
        let err = ImportError::MissingField {
            site: Marketplace::Amazon,
            field: ExtractField::Title,
        };
        assert!(!err.is_retriable());
        assert!(err.remediation().unwrap().contains("sign-in"));
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn no_working_proxy_is_retriable() {
        let err = ImportError::NoWorkingProxy { tried: 5 };
        assert!(err.is_retriable());
    }

    #[test]
    fn provider_error_is_not_retriable() {
        let err = ImportError::Provider(shopfeed_enrich::EnrichError::EmptyCompletion {
            context: "test".to_owned(),
        });
        assert!(!err.is_retriable());
    }
}
