//! LLM Provider Clients
//!
//! Two thin adapters over the external text-completion services, unified
//! behind the `TextProvider` trait:
//!
//! - `PerplexityClient`: chat-completions wire format, distinct
//!   system/user messages, online search parameters
//! - `GeminiClient`: single-prompt `generateContent` wire format
//!
//! Both perform exactly one attempt per call. Retry, caching and rate
//! limiting are caller concerns.

pub mod gemini;
pub mod perplexity;


pub use gemini::GeminiClient;
pub use perplexity::PerplexityClient;

use async_trait::async_trait;
use std::time::Duration;

/// Default bound on a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// One completion request. Providers without a distinct system role
/// flatten the pair into a single prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
}

impl CompletionRequest {
    pub fn prompt(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
        }
    }

    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
        }
    }

    /// Combined single-prompt form for providers without message roles.
    pub fn flattened(&self) -> String {
        match &self.system {
            Some(system) => format!("{system}\n\n{}", self.user),
            None => self.user.clone(),
        }
    }
}

/// Errors that can occur during a provider call
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// A text-completion provider reached over HTTP.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Issue one completion request and return the raw completion text.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Timeouts get their own variant so callers can tell a slow provider
/// from a broken one.
pub(crate) fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Http(err)
    }
}
