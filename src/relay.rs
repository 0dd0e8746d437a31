//! Provider Relay Service
//!
//! Browser-facing intermediary that wraps the two provider clients and
//! injects the server-held API keys, so credentials never reach the
//! client. One endpoint per provider shape:
//!
//! - `POST /api/generate` - `{systemPrompt, userPrompt}` -> `{content}`
//! - `POST /api/gemini`   - `{prompt}` -> `{content}`
//!
//! Provider failures map to a non-2xx JSON `{error}` body, carrying the
//! upstream status where one exists.

use crate::llm::{CompletionRequest, ProviderError, TextProvider};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct RelayState {
    pub research: Arc<dyn TextProvider>,
    pub synthesizer: Arc<dyn TextProvider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/gemini", post(gemini))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve the relay until the task is aborted.
pub async fn serve(state: RelayState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("relay service started on http://{addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<RelayState>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ContentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = CompletionRequest::with_system(request.system_prompt, request.user_prompt);
    complete_via(state.research.as_ref(), request).await
}

async fn gemini(
    State(state): State<RelayState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<ContentResponse>, (StatusCode, Json<ErrorResponse>)> {
    complete_via(
        state.synthesizer.as_ref(),
        CompletionRequest::prompt(request.prompt),
    )
    .await
}

async fn complete_via(
    provider: &dyn TextProvider,
    request: CompletionRequest,
) -> Result<Json<ContentResponse>, (StatusCode, Json<ErrorResponse>)> {
    match provider.complete(request).await {
        Ok(content) => Ok(Json(ContentResponse { content })),
        Err(err) => {
            log::error!("relay call to {} failed: {err}", provider.id());
            Err(error_response(err))
        }
    }
}

fn error_response(err: ProviderError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ProviderError::Api { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        ProviderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ProviderError::Http(_) | ProviderError::InvalidResponse(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse { error: err.to_string() }))
}
