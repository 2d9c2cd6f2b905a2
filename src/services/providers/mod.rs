/// Generative AI provider abstraction
///
/// A provider performs exactly one request/response cycle per call and reports
/// failures as raw [`ProviderError`]s. Turning those into user-facing
/// [`AiRequestError`]s is done in one place, [`classify`], so every operation
/// recognises a rejected credential the same way.
use serde_json::Value;

use crate::error::AiRequestError;

pub mod credential;
pub mod gemini;

pub use credential::CredentialStore;
pub use gemini::GeminiProvider;

/// One piece of a multimodal prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// What the caller expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputModality {
    Text,
    /// JSON text constrained by `GenerateRequest::response_schema`
    Json,
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub parts: Vec<Part>,
    pub response_schema: Option<Value>,
    pub modality: OutputModality,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    /// Concatenated text parts, if any
    pub text: Option<String>,
    pub images: Vec<InlineImage>,
}

/// Unclassified provider failure
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("An API Key must be set when calling the provider")]
    MissingCredential,

    #[error("Provider returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unreadable provider response: {0}")]
    Decode(String),
}

/// Provider messages that mean the credential itself was refused
const CREDENTIAL_REJECTION_MARKERS: [&str; 4] = [
    "api key not valid",
    "api_key_invalid",
    "api key must be set",
    "entity not found",
];

/// Maps a raw provider failure onto the error kinds callers act on
pub fn classify(error: ProviderError) -> AiRequestError {
    let classified = match error {
        ProviderError::MissingCredential => AiRequestError::MissingCredential,
        ProviderError::Rejected { status, message } => {
            let lowered = message.to_lowercase();
            if status == 401
                || CREDENTIAL_REJECTION_MARKERS
                    .iter()
                    .any(|marker| lowered.contains(marker))
            {
                AiRequestError::InvalidCredential(message)
            } else {
                AiRequestError::ProviderFailure(format!("{} (status {})", message, status))
            }
        }
        ProviderError::Transport(message) => AiRequestError::ProviderFailure(message),
        ProviderError::Decode(message) => AiRequestError::MalformedResponse(message),
    };

    tracing::warn!(error = %classified, "AI request failed");
    classified
}

/// Trait for generative AI providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Performs a single generate call
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
