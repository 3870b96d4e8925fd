//! Client for the third-party text-generation API used to rewrite product
//! titles and descriptions before persistence.
//!
//! The provider sits behind a narrow interface: given input text and
//! constraints it returns replacement text, or fails with a typed
//! [`EnrichError`] that callers surface as a provider error.

pub mod client;
pub mod error;
pub mod types;

pub use client::EnrichClient;
pub use error::EnrichError;
pub use types::{DescriptionRequest, TitleOptions, WritingStyle};
