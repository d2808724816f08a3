//! Retrieval over the study-material index.
//!
//! The index itself (embeddings, storage, ingestion of the PDF) lives in an
//! external service. This module only defines the query seam the agent's tool
//! calls into, plus an HTTP adapter for that service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::IndexSettings;
use crate::error::AgentError;

/// Similarity search over the fixed corpus. Read-only.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
  async fn query(&self, text: &str) -> Result<String, AgentError>;
}

#[derive(Serialize)]
struct QueryReq<'a> {
  query: &'a str,
  top_k: usize,
}

#[derive(Deserialize)]
struct QueryResp {
  response: String,
}

/// Posts `{"query", "top_k"}` to the retrieval service and reads `{"response"}`.
#[derive(Clone)]
pub struct HttpDocumentIndex {
  client: reqwest::Client,
  url: String,
  top_k: usize,
}

impl HttpDocumentIndex {
  /// Returns None when no query URL is configured or the client cannot be built.
  pub fn from_settings(settings: &IndexSettings, timeout: Duration) -> Option<Self> {
    let url = settings.query_url.clone()?;
    let client = match reqwest::Client::builder().timeout(timeout).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "rag_questions", error = %e, "Failed to build index HTTP client; retrieval disabled");
        return None;
      }
    };
    Some(Self { client, url, top_k: settings.similarity_top_k })
  }
}

#[async_trait]
impl DocumentIndex for HttpDocumentIndex {
  #[instrument(level = "info", skip(self, text), fields(query_len = text.len(), top_k = self.top_k))]
  async fn query(&self, text: &str) -> Result<String, AgentError> {
    let res = self
      .client
      .post(&self.url)
      .header(USER_AGENT, "rag-questions/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&QueryReq { query: text, top_k: self.top_k })
      .send()
      .await
      .map_err(|e| AgentError::Tool(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(AgentError::Tool(format!("index HTTP {}: {}", status, body)));
    }
    let body: QueryResp = res.json().await.map_err(|e| AgentError::Tool(e.to_string()))?;
    info!(response_len = body.response.len(), "Index query answered");
    Ok(body.response)
  }
}

/// Used when no retrieval service is configured: the tool reports that
/// nothing is available so the agent answers from the prompt alone.
pub struct UnavailableIndex;

#[async_trait]
impl DocumentIndex for UnavailableIndex {
  async fn query(&self, _text: &str) -> Result<String, AgentError> {
    Ok("The study material index is not available.".into())
  }
}
