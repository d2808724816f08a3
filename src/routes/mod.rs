//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
  extract::DefaultBodyLimit,
  routing::{get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Course PDFs run larger than axum's 2 MB default.
const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Build the application router with:
/// - JSON API under `/api/v1/...`
/// - multipart PDF upload
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/api/v1/health", get(http::http_health))
    .route("/api/v1/generate_questions", post(http::http_generate_questions))
    .route("/api/v1/evaluate_answer", post(http::http_evaluate_answer))
    .route("/api/v1/generate_coding_questions", post(http::http_generate_coding_questions))
    .route("/api/v1/evaluate_coding_answer", post(http::http_evaluate_coding_answer))
    .route(
      "/api/v1/upload_file",
      post(http::http_upload_file).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
    )
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}
