//! Application state: settings, the prompt composer and the generation agent.
//!
//! Built once at startup from `Settings` and shared behind an `Arc`. Nothing
//! here is mutable; each request is independent.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::agent::{GenerationAgent, RagAgent};
use crate::config::Settings;
use crate::index::{DocumentIndex, HttpDocumentIndex, UnavailableIndex};
use crate::prompts::PromptComposer;

#[derive(Clone)]
pub struct AppState {
  pub settings: Settings,
  pub composer: PromptComposer,
  pub agent: Arc<dyn GenerationAgent>,
}

impl AppState {
  /// Wire the production agent (OpenAI-compatible model + HTTP index).
  #[instrument(level = "info", skip_all)]
  pub fn new(settings: Settings) -> Self {
    let composer = PromptComposer::new(&settings.index);

    let timeout = Duration::from_secs(settings.llm.timeout_secs);
    let index: Arc<dyn DocumentIndex> = match HttpDocumentIndex::from_settings(&settings.index, timeout) {
      Some(idx) => {
        info!(target: "rag_questions", top_k = settings.index.similarity_top_k, "Document index enabled.");
        Arc::new(idx)
      }
      None => {
        warn!(target: "rag_questions", "Document index unavailable; retrieval tool will report no material.");
        Arc::new(UnavailableIndex)
      }
    };

    let agent = RagAgent::new(&settings.llm, &settings.index, index, composer.system_prompt());
    match agent.model() {
      Some(model) => {
        info!(target: "rag_questions", base_url = %settings.llm.base_url, %model, max_iterations = settings.llm.max_iterations, "LLM enabled.")
      }
      None => warn!(target: "rag_questions", "LLM disabled (no LLM_API_KEY). Generation requests will fail with 502."),
    }

    Self::with_agent(settings, Arc::new(agent))
  }

  /// Use a caller-supplied agent (tests, alternative backends).
  pub fn with_agent(settings: Settings, agent: Arc<dyn GenerationAgent>) -> Self {
    let composer = PromptComposer::new(&settings.index);
    Self { settings, composer, agent }
  }
}
