//! Perplexity Provider Implementation
//!
//! Chat-completions client for Perplexity's online (search-grounded)
//! models. Carries the full search parameter set the product relies on,
//! including the domain exclusion list.

use super::{map_transport_error, CompletionRequest, ProviderError, Result, TextProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "llama-3.1-sonar-small-128k-online";

/// Domains excluded from the model's web search.
const SEARCH_DOMAIN_FILTER: [&str; 2] = ["-kyoko-np.net", "-notion.site"];

pub struct PerplexityClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl PerplexityClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key, model, timeout)
    }

    pub fn with_base_url(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key: api_key.trim().to_string(),
            model,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextProvider for PerplexityClient {
    fn id(&self) -> &str {
        "perplexity"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: &request.user,
        });

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: 4096,
            temperature: 0.2,
            top_p: 0.9,
            return_citations: true,
            search_domain_filter: &SEARCH_DOMAIN_FILTER,
            return_images: false,
            return_related_questions: false,
            search_recency_filter: "year",
            top_k: 0,
            stream: false,
            presence_penalty: 0.0,
            frequency_penalty: 1.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(map_transport_error)?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("completion had no choices".into()))?;

        if content.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "completion content was empty".into(),
            ));
        }

        Ok(content)
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    return_citations: bool,
    search_domain_filter: &'a [&'a str],
    return_images: bool,
    return_related_questions: bool,
    search_recency_filter: &'a str,
    top_k: u32,
    stream: bool,
    presence_penalty: f64,
    frequency_penalty: f64,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}
