//! HTTP query service.
//!
//! `POST /chatQuery` takes `{"UserQuery": "..."}` and answers with the
//! generated response, its sources and the keys of the context windows.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::rag::RagResponse;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP query service.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::OpenAI)?;

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(settings)?,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/chatQuery", post(chat_query))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("podsearch query service");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /chatQuery");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ChatQueryRequest {
    user_query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChatQueryResponse {
    user_query: String,
    chat_response: String,
    sources: Vec<String>,
    embeddings: Vec<String>,
}

impl From<RagResponse> for ChatQueryResponse {
    fn from(response: RagResponse) -> Self {
        Self {
            user_query: response.question,
            chat_response: response.answer,
            sources: response.sources,
            embeddings: response.embeddings,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn parse_query(body: &[u8]) -> std::result::Result<String, String> {
    let request: ChatQueryRequest =
        serde_json::from_slice(body).map_err(|e| format!("invalid request body: {}", e))?;
    if request.user_query.trim().is_empty() {
        return Err("UserQuery must not be empty".to_string());
    }
    Ok(request.user_query)
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat_query(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let question = match parse_query(&body) {
        Ok(question) => question,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match state.pipeline.ask(&question).await {
        Ok(response) => {
            info!("Answered query in {:?}", response.elapsed);
            Json(ChatQueryResponse::from(response)).into_response()
        }
        Err(e) => {
            error!("Query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to answer query")
        }
    }
}
