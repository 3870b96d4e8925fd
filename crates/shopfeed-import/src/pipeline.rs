//! Single-product import pipeline: detect, fetch, parse, normalize, enrich.

use shopfeed_core::{AppConfig, PriceLocale, ProductRecord};
use shopfeed_enrich::{DescriptionRequest, EnrichClient, TitleOptions};

use crate::error::ImportError;
use crate::fetch::ImportClient;
use crate::normalize::normalize_product;
use crate::proxy::{proxied_url, ProxyPool};
use crate::rate_limit::RateLimiter;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::sites::{FetchMode, SiteRegistry};

/// Orchestrates product imports across all registered marketplaces.
///
/// One importer is built per run and shared across catalog workers; the
/// proxy pool and rate limiter inside it are the shared state that keeps
/// concurrent fetches polite.
pub struct Importer {
    client: ImportClient,
    proxies: ProxyPool,
    registry: SiteRegistry,
    limiter: RateLimiter,
    policy: RetryPolicy,
    locale: PriceLocale,
    enricher: Option<EnrichClient>,
    pub(crate) concurrency: usize,
}

impl Importer {
    /// Builds an importer from component parts. Most callers want
    /// [`Importer::from_config`]; this form exists so tests can point the
    /// proxy pool at a local server.
    #[must_use]
    pub fn new(
        client: ImportClient,
        proxies: ProxyPool,
        policy: RetryPolicy,
        locale: PriceLocale,
        enricher: Option<EnrichClient>,
        inter_request_delay_ms: u64,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            proxies,
            registry: SiteRegistry::default(),
            limiter: RateLimiter::new(inter_request_delay_ms),
            policy,
            locale,
            enricher,
            concurrency: concurrency.max(1),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        enricher: Option<EnrichClient>,
    ) -> Result<Self, ImportError> {
        let policy = RetryPolicy {
            retries: config.max_retries,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        };
        let client = ImportClient::new(config.http_timeout_secs, &config.user_agent, policy)?;
        let proxies = ProxyPool::new(
            crate::proxy::DEFAULT_PROXIES,
            "https://www.amazon.com",
            config.proxy_probe_timeout_secs,
        );
        Ok(Self::new(
            client,
            proxies,
            policy,
            config.price_locale,
            enricher,
            config.inter_request_delay_ms,
            config.catalog_concurrency,
        ))
    }

    pub(crate) fn client(&self) -> &ImportClient {
        &self.client
    }

    /// Imports one product from its marketplace URL.
    ///
    /// # Errors
    ///
    /// Surfaces URL validation, fetch, extraction, normalization, and
    /// enrichment failures; see [`ImportError`] for the full set.
    pub async fn import_url(&self, url: &str) -> Result<ProductRecord, ImportError> {
        let adapter = self.registry.detect(url)?;
        adapter.validate(url)?;
        tracing::info!(site = %adapter.site(), url, "importing product");

        let raw = match adapter.fetch_mode() {
            FetchMode::ProductJson => {
                let json_url = adapter
                    .product_json_url(url)
                    .ok_or(ImportError::AdapterUnavailable {
                        site: adapter.site(),
                    })?;
                self.limiter.acquire().await;
                let value = self.client.fetch_json(&json_url).await?;
                adapter.parse_json(&value, url)?
            }
            FetchMode::ProxiedHtml => {
                let prefix = retry_with_backoff(self.policy, || {
                    self.proxies.find_working_proxy(self.client.http())
                })
                .await?;
                let relayed = proxied_url(&prefix, url);
                self.limiter.acquire().await;
                let html = self.client.fetch_html(&relayed, adapter.referer()).await?;
                adapter.parse_html(&html)?
            }
            FetchMode::Unavailable => {
                return Err(ImportError::AdapterUnavailable {
                    site: adapter.site(),
                })
            }
        };

        let record = normalize_product(&raw, adapter.site(), Some(url), self.locale)?;
        self.enrich(record).await
    }

    /// Rewrites title and description through the enrichment provider when
    /// one is configured. Provider failures abort the import rather than
    /// passing an unenriched record through silently.
    pub(crate) async fn enrich(
        &self,
        mut record: ProductRecord,
    ) -> Result<ProductRecord, ImportError> {
        let Some(enricher) = &self.enricher else {
            return Ok(record);
        };
        let category = record.category.clone().unwrap_or_else(|| "general".to_owned());
        let options = TitleOptions::for_category(&category);
        record.title = enricher.optimize_title(&record.title, &options).await?;
        record.description = enricher
            .generate_description(&DescriptionRequest::new(&record.title, &category))
            .await?;
        Ok(record)
    }
}
