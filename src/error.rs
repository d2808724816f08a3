//! Error taxonomy and its HTTP mapping.
//!
//! - `InputError`: bad request shape or range. Never reaches the agent.
//! - `AgentError`: the agent call itself failed.
//! - `ValidationError`: the agent answered but the content failed structural checks.
//!
//! `AppError` wraps all three and renders `{"error", "message", "detail"?}`.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Json},
};
use serde_json::{json, Value};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
  #[error("Number of questions must be between 1 and 10, got {0}")]
  InvalidCount(u32),

  #[error("Unsupported programming language: {0}")]
  UnsupportedLanguage(String),

  #[error("Unsupported difficulty tier: {0}")]
  InvalidTier(String),

  #[error("Unsupported question type: {0}")]
  InvalidQuestionType(String),

  #[error("User code cannot be empty")]
  EmptySubmission,

  #[error("Only PDF files are accepted, got content type {0:?}")]
  UnsupportedMediaType(String),

  #[error("Missing required field: {0}")]
  MissingField(&'static str),

  #[error("Malformed request: {0}")]
  Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
  #[error("generation agent is not configured (no LLM API key)")]
  NotConfigured,

  #[error("LLM transport error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("LLM HTTP {status}: {message}")]
  Api { status: u16, message: String },

  #[error("LLM returned an empty response")]
  EmptyResponse,

  #[error("agent did not produce a final answer within {0} iterations")]
  IterationBudgetExhausted(usize),

  #[error("retrieval tool failed: {0}")]
  Tool(String),
}

/// Structural failures of agent output. Positions (`index`, `question`,
/// `test_case`) are 1-based, matching how they are shown to users.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
  #[error("agent response is not valid JSON: {reason}")]
  MalformedResponse { reason: String },

  #[error("agent response does not match the expected schema: {detail}")]
  SchemaMismatch { detail: String },

  #[error("question {index}: {problem}")]
  InvalidOpenQuestion { index: usize, problem: String },

  #[error("question {question}, test case {test_case}: {problem}")]
  TestCaseFormat { question: usize, test_case: usize, problem: String, raw: Value },

  #[error("question {question} missing required fields: {}", .missing.join(", "))]
  IncompleteQuestion { question: usize, missing: Vec<String> },

  #[error("evaluation missing required fields: {}", .missing.join(", "))]
  IncompleteEvaluation { missing: Vec<String> },

  #[error("grade missing required fields: {}", .missing.join(", "))]
  IncompleteGrade { missing: Vec<String> },
}

impl ValidationError {
  pub fn schema(detail: impl Into<String>) -> Self {
    ValidationError::SchemaMismatch { detail: detail.into() }
  }

  /// Short machine-readable name, used in logs and response bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      ValidationError::MalformedResponse { .. } => "malformed_response",
      ValidationError::SchemaMismatch { .. } => "schema_mismatch",
      ValidationError::InvalidOpenQuestion { .. } => "invalid_open_question",
      ValidationError::TestCaseFormat { .. } => "test_case_format",
      ValidationError::IncompleteQuestion { .. } => "incomplete_question",
      ValidationError::IncompleteEvaluation { .. } => "incomplete_evaluation",
      ValidationError::IncompleteGrade { .. } => "incomplete_grade",
    }
  }

  fn detail(&self) -> Value {
    match self {
      ValidationError::MalformedResponse { reason } => json!({ "kind": self.kind(), "reason": reason }),
      ValidationError::SchemaMismatch { detail } => json!({ "kind": self.kind(), "detail": detail }),
      ValidationError::InvalidOpenQuestion { index, problem } => {
        json!({ "kind": self.kind(), "index": index, "problem": problem })
      }
      ValidationError::TestCaseFormat { question, test_case, problem, raw } => json!({
        "kind": self.kind(),
        "question": question,
        "test_case": test_case,
        "problem": problem,
        "raw": raw,
      }),
      ValidationError::IncompleteQuestion { question, missing } => {
        json!({ "kind": self.kind(), "question": question, "missing": missing })
      }
      ValidationError::IncompleteEvaluation { missing } | ValidationError::IncompleteGrade { missing } => {
        json!({ "kind": self.kind(), "missing": missing })
      }
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error(transparent)]
  Input(#[from] InputError),

  #[error(transparent)]
  Agent(#[from] AgentError),

  #[error(transparent)]
  Validation(#[from] ValidationError),
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    let message = self.to_string();
    let (status, body) = match &self {
      AppError::Input(_) => (StatusCode::BAD_REQUEST, json!({ "error": "invalid_input", "message": message })),
      AppError::Agent(_) => (StatusCode::BAD_GATEWAY, json!({ "error": "agent_unavailable", "message": message })),
      AppError::Validation(v) => (
        StatusCode::BAD_GATEWAY,
        json!({ "error": "invalid_agent_response", "message": message, "detail": v.detail() }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
