use serde::{Deserialize, Serialize};

/// Copywriting register requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingStyle {
    #[default]
    Professional,
    Casual,
    Luxury,
    Technical,
}

impl WritingStyle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WritingStyle::Professional => "professional",
            WritingStyle::Casual => "casual",
            WritingStyle::Luxury => "luxury",
            WritingStyle::Technical => "technical",
        }
    }
}

/// Constraints for a title rewrite.
#[derive(Debug, Clone)]
pub struct TitleOptions {
    pub category: String,
    pub keywords: Vec<String>,
    /// Maximum length in characters the provider is asked to respect.
    pub max_length: usize,
}

impl TitleOptions {
    #[must_use]
    pub fn for_category(category: &str) -> Self {
        Self {
            category: category.to_owned(),
            keywords: Vec::new(),
            max_length: 70,
        }
    }
}

/// Inputs for a description generation request.
#[derive(Debug, Clone)]
pub struct DescriptionRequest {
    pub title: String,
    pub category: String,
    pub features: Vec<String>,
    pub target_audience: Option<String>,
    pub style: WritingStyle,
}

impl DescriptionRequest {
    #[must_use]
    pub fn new(title: &str, category: &str) -> Self {
        Self {
            title: title.to_owned(),
            category: category.to_owned(),
            features: Vec::new(),
            target_audience: None,
            style: WritingStyle::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types for the chat-completion endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}
