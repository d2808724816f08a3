//! RAG Questions · HTTP entry point
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   LLM_API_KEY       : enables the generation agent if present
//!   LLM_BASE_URL      : default "https://api.groq.com/openai/v1"
//!   LLM_MODEL         : default "llama-3.1-70b-versatile"
//!   INDEX_QUERY_URL   : retrieval service endpoint for the study material
//!   DOCUMENT_PATH     : course PDF indexed by the retrieval service
//!   AGENT_CONFIG_PATH : path to TOML settings ([server], [llm], [index])
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use rag_questions::config::Settings;
use rag_questions::routes::build_router;
use rag_questions::state::AppState;
use rag_questions::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::load();
  let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
  info!(target: "rag_questions", document = %settings.index.document_path, "Study material");

  let state = Arc::new(AppState::new(settings));
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "rag_questions", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "rag_questions", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
