//! Result schemas produced by the validator and returned at the service boundary.
//!
//! Two record flavours:
//! - strict records (`OpenQuestion`, `TestCase`, `AnswerGrade`) carry only their
//!   declared fields; the validator rejects or drops anything else before they
//!   are built;
//! - open records (`CodingQuestion`, `CodingEvaluation`) keep undeclared keys in
//!   an `extra` map that is flattened back out on serialization, unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::policy::DifficultyTier;

/// Undeclared keys preserved verbatim by open records.
pub type Extra = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OpenQuestion {
  #[serde(rename = "MCQ")]
  Mcq(McqQuestion),
  #[serde(rename = "Subjective")]
  Subjective(SubjectiveQuestion),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct McqQuestion {
  pub question: String,
  /// Exactly four options, in the order the agent produced them.
  pub options: Vec<String>,
  /// Correct option, as a letter or the option text.
  pub model_answer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubjectiveQuestion {
  pub question: String,
  pub model_answer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenQuestions {
  pub questions: Vec<OpenQuestion>,
}

/// Grade for a free-text answer to an open question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerGrade {
  pub grade: String,
  pub feedback: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
  pub level: DifficultyTier,
  pub explanation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
  /// Named parameters of the function under test.
  pub input: Map<String, Value>,
  pub expected: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodingQuestion {
  pub title: String,
  pub difficulty: Difficulty,
  pub description: String,
  pub function_signature: String,
  pub test_cases: Vec<TestCase>,
  pub solution: String,
  pub time_complexity: String,
  pub space_complexity: String,
  #[serde(default)]
  pub hints: Vec<String>,
  #[serde(default)]
  pub learning_points: Vec<String>,
  #[serde(flatten)]
  pub extra: Extra,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodingQuestions {
  pub questions: Vec<CodingQuestion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
  #[serde(default)]
  pub passed: bool,
  #[serde(default = "empty_object")]
  pub input: Value,
  #[serde(default)]
  pub expected: Value,
  #[serde(default)]
  pub actual: Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

fn empty_object() -> Value {
  Value::Object(Map::new())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodingEvaluation {
  pub passed: bool,
  pub test_results: Vec<TestResult>,
  pub feedback: String,
  pub score: f64,
  pub difficulty_appropriate: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time_complexity_analysis: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub space_complexity_analysis: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub code_quality_feedback: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub improvement_suggestions: Option<Vec<String>>,
  #[serde(flatten)]
  pub extra: Extra,
}
