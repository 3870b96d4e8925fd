//! HTTP client for the chat-completion endpoint backing title, description,
//! and SEO enrichment.

use std::time::Duration;

use reqwest::{Client, Url};
use shopfeed_core::SeoFields;

use crate::error::EnrichError;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, DescriptionRequest, TitleOptions,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Client for the text-generation provider.
///
/// Use [`EnrichClient::new`] for production or [`EnrichClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct EnrichClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl EnrichClient {
    /// Creates a client pointed at the production provider endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, EnrichError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`EnrichError::Provider`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("shopfeed/0.1 (product-import)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| EnrichError::Provider {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
        })
    }

    /// Rewrites a product title for SEO within the given constraints.
    ///
    /// Returns the provider's rewrite, or the original title when the
    /// provider answers with an empty completion.
    ///
    /// # Errors
    ///
    /// - [`EnrichError::Provider`] on a non-2xx provider response.
    /// - [`EnrichError::Http`] on network failure.
    /// - [`EnrichError::Deserialize`] if the response shape is unexpected.
    pub async fn optimize_title(
        &self,
        title: &str,
        options: &TitleOptions,
    ) -> Result<String, EnrichError> {
        let keywords = if options.keywords.is_empty() {
            "none provided".to_owned()
        } else {
            options.keywords.join(", ")
        };
        let user = format!(
            "Optimize this product title for SEO and conversions:\n\
             Title: {title}\n\
             Category: {}\n\
             Target keywords: {keywords}\n\
             Maximum length: {} characters\n\
             Make it clear, compelling, and keyword-rich while maintaining readability.",
            options.category, options.max_length
        );

        let content = self
            .complete(
                "You are an SEO expert specializing in e-commerce product titles.",
                &user,
                "optimize_title",
            )
            .await?;

        if content.trim().is_empty() {
            return Ok(title.to_owned());
        }
        Ok(content.trim().to_owned())
    }

    /// Generates a product description from the title, category, and features.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EnrichClient::optimize_title`], plus
    /// [`EnrichError::EmptyCompletion`] when the provider returns no text.
    pub async fn generate_description(
        &self,
        request: &DescriptionRequest,
    ) -> Result<String, EnrichError> {
        let system = format!(
            "You are a professional e-commerce copywriter specializing in {} product descriptions. \
             Target audience: {}",
            request.style.as_str(),
            request.target_audience.as_deref().unwrap_or("general")
        );
        let user = format!(
            "Write a compelling product description for: {}\n\
             Category: {}\n\
             Key features: {}\n\
             Make it engaging, SEO-friendly, and highlight the value proposition.",
            request.title,
            request.category,
            request.features.join(", ")
        );

        let content = self
            .complete(&system, &user, "generate_description")
            .await?;
        if content.trim().is_empty() {
            return Err(EnrichError::EmptyCompletion {
                context: "generate_description".to_owned(),
            });
        }
        Ok(content.trim().to_owned())
    }

    /// Produces SEO title/description/keywords for a record about to be
    /// persisted.
    ///
    /// The provider is asked for a strict JSON object; the completion is
    /// parsed into [`SeoFields`].
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EnrichClient::optimize_title`], plus
    /// [`EnrichError::Deserialize`] when the completion is not the requested
    /// JSON shape.
    pub async fn optimize_for_seo(
        &self,
        title: &str,
        description: &str,
        category: &str,
    ) -> Result<SeoFields, EnrichError> {
        let user = format!(
            "Produce SEO metadata for this product as a JSON object with keys \
             \"title\", \"description\", and \"keywords\" (array of strings). \
             Respond with JSON only, no prose.\n\
             Title: {title}\n\
             Category: {category}\n\
             Description: {description}"
        );

        let content = self
            .complete(
                "You are an SEO expert for e-commerce product listings.",
                &user,
                "optimize_for_seo",
            )
            .await?;

        let payload = strip_code_fence(&content);
        serde_json::from_str::<SeoFields>(payload).map_err(|e| EnrichError::Deserialize {
            context: "optimize_for_seo completion".to_owned(),
            source: e,
        })
    }

    /// Sends one chat-completion request and returns the first choice's text.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        context: &str,
    ) -> Result<String, EnrichError> {
        let url = self
            .base_url
            .join("v1/chat/completions")
            .map_err(|e| EnrichError::Provider {
                status: 0,
                message: format!("invalid completion URL: {e}"),
            })?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_owned(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_owned(),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%status, context, "enrichment provider returned an error");
            return Err(EnrichError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed =
            serde_json::from_str::<ChatResponse>(&body).map_err(|e| EnrichError::Deserialize {
                context: context.to_owned(),
                source: e,
            })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Strips a Markdown code fence from a completion, if present. Providers
/// frequently wrap requested JSON in ```json fences despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .map_or(trimmed, str::trim)
}
