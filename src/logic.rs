//! Core operations behind the HTTP handlers.
//!
//! Each operation checks its input first (nothing reaches the agent on bad
//! input), composes the prompt, makes exactly one agent call and runs the
//! matching validator. There is no partial success: a full schema instance or
//! an error.

use tracing::{debug, info, instrument, warn};

use crate::error::{InputError, Result, ValidationError};
use crate::policy::{normalize_language, DifficultyTier, QuestionKind};
use crate::protocol::{AnswerSubmission, CodingAnswerSubmission, CodingQuestionRequest, QuestionRequest, UploadOut};
use crate::schema::{AnswerGrade, CodingEvaluation, CodingQuestions, OpenQuestions};
use crate::state::AppState;
use crate::util::trunc_for_log;
use crate::validate;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

fn required<'a>(value: &'a str, field: &'static str) -> std::result::Result<&'a str, InputError> {
  let v = value.trim();
  if v.is_empty() {
    Err(InputError::MissingField(field))
  } else {
    Ok(v)
  }
}

fn rejected(op: &'static str, raw: &str, e: ValidationError) -> ValidationError {
  warn!(target: "questions", op, kind = e.kind(), error = %e, "Agent response rejected");
  debug!(target: "questions", op, raw = %trunc_for_log(raw, 1000), "Rejected agent response");
  e
}

#[instrument(level = "info", skip(state, req), fields(question_type = %req.question_type, count = req.num_questions))]
pub async fn generate_open_questions(state: &AppState, req: &QuestionRequest) -> Result<OpenQuestions> {
  let topic = required(&req.topic, "topic")?;
  let kind: QuestionKind = req.question_type.parse()?;
  let prompt = state.composer.open_questions(topic, kind, req.num_questions)?;

  let raw = state.agent.chat(&prompt).await?;
  let out = validate::validate_open(&raw).map_err(|e| rejected("generate_questions", &raw, e))?;
  info!(target: "questions", generated = out.questions.len(), "Open questions generated");
  Ok(out)
}

#[instrument(level = "info", skip(state, sub), fields(answer_len = sub.user_answer.len()))]
pub async fn evaluate_open_answer(state: &AppState, sub: &AnswerSubmission) -> Result<AnswerGrade> {
  let question = required(&sub.question, "question")?;
  let prompt = state.composer.answer_grading(question, &sub.user_answer, &sub.correct_answer);

  let raw = state.agent.complete(&prompt).await?;
  let grade = validate::validate_grade(&raw).map_err(|e| rejected("evaluate_answer", &raw, e))?;
  info!(target: "questions", grade = %grade.grade, "Answer graded");
  Ok(grade)
}

#[instrument(level = "info", skip(state, req), fields(language = %req.programming_language, difficulty = %req.difficulty, count = req.num_questions))]
pub async fn generate_coding_questions(state: &AppState, req: &CodingQuestionRequest) -> Result<CodingQuestions> {
  let language = normalize_language(&req.programming_language)?;
  let tier: DifficultyTier = req.difficulty.parse()?;
  let prompt = state.composer.coding_questions(language, tier, req.topic.as_deref(), req.num_questions)?;

  let raw = state.agent.chat(&prompt).await?;
  let out = validate::validate_coding(&raw, tier).map_err(|e| rejected("generate_coding_questions", &raw, e))?;
  info!(target: "questions", %language, %tier, generated = out.questions.len(), "Coding questions generated");
  Ok(out)
}

#[instrument(level = "info", skip(state, sub), fields(language = %sub.programming_language, title = %sub.question.title, code_len = sub.user_code.len()))]
pub async fn evaluate_coding_answer(state: &AppState, sub: &CodingAnswerSubmission) -> Result<CodingEvaluation> {
  let language = normalize_language(&sub.programming_language)?;
  let prompt = state.composer.coding_evaluation(&sub.question, &sub.user_code, language)?;

  let raw = state.agent.chat(&prompt).await?;
  let eval = validate::validate_evaluation(&raw).map_err(|e| rejected("evaluate_coding_answer", &raw, e))?;
  info!(target: "questions", passed = eval.passed, score = eval.score, results = eval.test_results.len(), "Coding answer evaluated");
  Ok(eval)
}

/// Accept a PDF for the external indexer. Only metadata is inspected.
#[instrument(level = "info", skip(bytes), fields(size = bytes.len()))]
pub fn accept_upload(course_name: &str, filename: Option<String>, content_type: &str, bytes: &[u8]) -> Result<UploadOut> {
  let course_name = required(course_name, "course_name")?;
  if content_type != PDF_MEDIA_TYPE {
    return Err(InputError::UnsupportedMediaType(content_type.to_string()).into());
  }
  info!(target: "questions", %course_name, filename = ?filename, "Upload accepted");
  Ok(UploadOut {
    course_name: course_name.to_string(),
    filename,
    content_type: content_type.to_string(),
    size_bytes: bytes.len(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AppError;

  #[test]
  fn upload_requires_exact_pdf_media_type() {
    let ok = accept_upload("SE 101", Some("notes.pdf".into()), "application/pdf", b"%PDF-1.4").unwrap();
    assert_eq!(ok.size_bytes, 8);
    assert_eq!(ok.course_name, "SE 101");

    for ct in ["application/PDF", "application/pdf; charset=binary", "text/plain", ""] {
      let err = accept_upload("SE 101", None, ct, b"x").unwrap_err();
      assert!(matches!(err, AppError::Input(InputError::UnsupportedMediaType(_))), "{ct}");
    }
  }

  #[test]
  fn upload_requires_course_name() {
    let err = accept_upload("  ", None, "application/pdf", b"x").unwrap_err();
    assert!(matches!(err, AppError::Input(InputError::MissingField("course_name"))));
  }
}
