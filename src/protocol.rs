//! Public request/response structs for the HTTP API (serde ready).
//! Responses of the generation endpoints are the schema types themselves.

use serde::{Deserialize, Serialize};

use crate::schema::CodingQuestion;

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
  pub topic: String,
  /// "MCQ", "Subjective" or "mixed" (case-insensitive).
  pub question_type: String,
  pub num_questions: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnswerSubmission {
  pub question: String,
  pub user_answer: String,
  pub correct_answer: String,
}

#[derive(Debug, Deserialize)]
pub struct CodingQuestionRequest {
  pub programming_language: String,
  pub difficulty: String,
  #[serde(default)]
  pub topic: Option<String>,
  #[serde(default = "one")]
  pub num_questions: u32,
}

fn one() -> u32 {
  1
}

#[derive(Debug, Deserialize)]
pub struct CodingAnswerSubmission {
  pub question: CodingQuestion,
  pub user_code: String,
  pub programming_language: String,
}

/// Metadata echoed back for an accepted upload. The content itself is handed
/// to the external indexer and never parsed here.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadOut {
  pub course_name: String,
  pub filename: Option<String>,
  pub content_type: String,
  pub size_bytes: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub llm_configured: bool,
}
