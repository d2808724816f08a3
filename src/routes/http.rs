//! HTTP endpoint handlers. Thin wrappers that forward to core logic.
//! Malformed JSON bodies are reported as `invalid_input` like any other bad input.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, Multipart, State},
  response::IntoResponse,
  Json,
};
use tracing::{debug, instrument};

use crate::error::{InputError, Result};
use crate::logic;
use crate::protocol::*;
use crate::schema::{AnswerGrade, CodingEvaluation, CodingQuestions, OpenQuestions};
use crate::state::AppState;

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> std::result::Result<T, InputError> {
  payload.map(|Json(v)| v).map_err(|e| InputError::Malformed(e.body_text()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, llm_configured: state.agent.is_ready() })
}

#[instrument(level = "info", skip_all)]
pub async fn http_generate_questions(
  State(state): State<Arc<AppState>>,
  payload: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<OpenQuestions>> {
  let req = body(payload)?;
  Ok(Json(logic::generate_open_questions(&state, &req).await?))
}

#[instrument(level = "info", skip_all)]
pub async fn http_evaluate_answer(
  State(state): State<Arc<AppState>>,
  payload: std::result::Result<Json<AnswerSubmission>, JsonRejection>,
) -> Result<Json<AnswerGrade>> {
  let sub = body(payload)?;
  Ok(Json(logic::evaluate_open_answer(&state, &sub).await?))
}

#[instrument(level = "info", skip_all)]
pub async fn http_generate_coding_questions(
  State(state): State<Arc<AppState>>,
  payload: std::result::Result<Json<CodingQuestionRequest>, JsonRejection>,
) -> Result<Json<CodingQuestions>> {
  let req = body(payload)?;
  Ok(Json(logic::generate_coding_questions(&state, &req).await?))
}

#[instrument(level = "info", skip_all)]
pub async fn http_evaluate_coding_answer(
  State(state): State<Arc<AppState>>,
  payload: std::result::Result<Json<CodingAnswerSubmission>, JsonRejection>,
) -> Result<Json<CodingEvaluation>> {
  let sub = body(payload)?;
  Ok(Json(logic::evaluate_coding_answer(&state, &sub).await?))
}

/// Multipart form with a `course_name` text field and a `file` part.
#[instrument(level = "info", skip_all)]
pub async fn http_upload_file(mut multipart: Multipart) -> Result<Json<UploadOut>> {
  let mut course_name: Option<String> = None;
  let mut file: Option<(Option<String>, String, Vec<u8>)> = None;

  while let Some(field) = multipart.next_field().await.map_err(|e| InputError::Malformed(e.body_text()))? {
    let name = field.name().unwrap_or("").to_string();
    match name.as_str() {
      "course_name" => {
        course_name = Some(field.text().await.map_err(|e| InputError::Malformed(e.body_text()))?);
      }
      "file" => {
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().unwrap_or("").to_string();
        let data = field.bytes().await.map_err(|e| InputError::Malformed(e.body_text()))?;
        file = Some((filename, content_type, data.to_vec()));
      }
      other => debug!(target: "questions", field = %other, "Ignoring unknown multipart field"),
    }
  }

  let course_name = course_name.ok_or(InputError::MissingField("course_name"))?;
  let (filename, content_type, data) = file.ok_or(InputError::MissingField("file"))?;
  Ok(Json(logic::accept_upload(&course_name, filename, &content_type, &data)?))
}
