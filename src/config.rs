//! Service configuration: an optional TOML file plus environment overrides.
//!
//! The resulting `Settings` is built once in `main` and handed to the prompt
//! composer and the generation agent at construction time.
//!
//! TOML (path from AGENT_CONFIG_PATH):
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [llm]
//! base_url = "https://api.groq.com/openai/v1"
//! model = "llama-3.1-70b-versatile"
//! max_iterations = 15
//! memory_token_limit = 2048
//!
//! [index]
//! query_url = "http://localhost:8090/query"
//! similarity_top_k = 10
//! ```
//!
//! Environment overrides: PORT, LLM_API_KEY, LLM_BASE_URL, LLM_MODEL,
//! INDEX_QUERY_URL, DOCUMENT_PATH.

use std::fmt;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub server: ServerSettings,
  pub llm: LlmSettings,
  pub index: IndexSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
  pub port: u16,
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self { port: 3000 }
  }
}

/// Chat-completions endpoint and agent loop limits.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
  pub base_url: String,
  pub api_key: Option<String>,
  pub model: String,
  pub temperature: f32,
  pub timeout_secs: u64,
  /// Upper bound on model round-trips per agent call (tool calls included).
  pub max_iterations: usize,
  /// Conversation window of the agent, in estimated tokens.
  pub memory_token_limit: usize,
}

impl Default for LlmSettings {
  fn default() -> Self {
    Self {
      base_url: "https://api.groq.com/openai/v1".into(),
      api_key: None,
      model: "llama-3.1-70b-versatile".into(),
      temperature: 0.2,
      timeout_secs: 120,
      max_iterations: 15,
      memory_token_limit: 2048,
    }
  }
}

// never print the key
impl fmt::Debug for LlmSettings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LlmSettings")
      .field("base_url", &self.base_url)
      .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
      .field("model", &self.model)
      .field("temperature", &self.temperature)
      .field("timeout_secs", &self.timeout_secs)
      .field("max_iterations", &self.max_iterations)
      .field("memory_token_limit", &self.memory_token_limit)
      .finish()
  }
}

/// Retrieval collaborator and the tool the agent is told about.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
  pub query_url: Option<String>,
  pub similarity_top_k: usize,
  pub tool_name: String,
  pub tool_description: String,
  /// The single study-material document the index was built from.
  pub document_path: String,
}

impl Default for IndexSettings {
  fn default() -> Self {
    Self {
      query_url: None,
      similarity_top_k: 10,
      tool_name: "study_material_query".into(),
      tool_description: "Provides information from the study material PDF.".into(),
      document_path: "data/SE_Merged.pdf".into(),
    }
  }
}

impl Settings {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str::<Settings>(s)
  }

  /// Apply overrides from a key lookup (the process environment in production).
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
      self.server.port = port;
    }
    if let Some(key) = lookup("LLM_API_KEY").filter(|k| !k.trim().is_empty()) {
      self.llm.api_key = Some(key);
    }
    if let Some(url) = lookup("LLM_BASE_URL") {
      self.llm.base_url = url;
    }
    if let Some(model) = lookup("LLM_MODEL") {
      self.llm.model = model;
    }
    if let Some(url) = lookup("INDEX_QUERY_URL") {
      self.index.query_url = Some(url);
    }
    if let Some(path) = lookup("DOCUMENT_PATH") {
      self.index.document_path = path;
    }
  }

  /// Load from AGENT_CONFIG_PATH (if set) and the environment.
  /// A missing or unparsable file is logged and replaced by defaults.
  pub fn load() -> Self {
    let mut settings = match std::env::var("AGENT_CONFIG_PATH") {
      Ok(path) => match std::fs::read_to_string(&path) {
        Ok(s) => match Settings::from_toml_str(&s) {
          Ok(cfg) => {
            info!(target: "rag_questions", %path, "Loaded settings (TOML)");
            cfg
          }
          Err(e) => {
            error!(target: "rag_questions", %path, error = %e, "Failed to parse TOML settings; using defaults");
            Settings::default()
          }
        },
        Err(e) => {
          error!(target: "rag_questions", %path, error = %e, "Failed to read TOML settings file; using defaults");
          Settings::default()
        }
      },
      Err(_) => Settings::default(),
    };
    settings.apply_overrides(|k| std::env::var(k).ok());
    settings
  }
}
