pub mod app_config;
pub mod config;
pub mod product;

pub use app_config::{AppConfig, Environment, PriceLocale};
pub use config::{load_app_config, load_app_config_from_env};
pub use product::{
    Marketplace, ProductMetadata, ProductRecord, ProductReview, ProductVariant, SeoFields,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
