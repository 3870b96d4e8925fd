#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Decimal-separator convention assumed when parsing scraped price strings.
///
/// The scraped text carries no locale information, so the assumption is an
/// explicit configuration input rather than a hidden default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceLocale {
    /// `.` is the decimal separator; a trailing `,NN` group is still read as
    /// a decimal comma. Matches the historical importer behavior, including
    /// its known mis-parse of European `1.234,56` thousand-separator input.
    #[default]
    PointDecimal,
    /// `,` is the decimal separator and `.` groups thousands (European).
    CommaDecimal,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub proxy_probe_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub catalog_concurrency: usize,
    pub inter_request_delay_ms: u64,
    pub batch_size: usize,
    pub price_locale: PriceLocale,
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub ai_model: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("proxy_probe_timeout_secs", &self.proxy_probe_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("catalog_concurrency", &self.catalog_concurrency)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("batch_size", &self.batch_size)
            .field("price_locale", &self.price_locale)
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "[redacted]"))
            .field("ai_base_url", &self.ai_base_url)
            .field("ai_model", &self.ai_model)
            .finish()
    }
}
