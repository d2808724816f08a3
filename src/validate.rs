//! Validation and repair of agent output.
//!
//! The agent returns free text that is *supposed* to be JSON. Each entry point
//! here parses that text, applies a fixed set of format repairs (wrapping,
//! defaulting of bookkeeping fields) and then checks the result against the
//! target schema. Repairs never invent semantic content: a missing solution or
//! test case is an error, not something to fill in.
//!
//! Every failure names the offending position (1-based) and field so it can be
//! surfaced to the caller as a diagnostic. A response is either accepted whole
//! or rejected; nothing is dropped silently.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ValidationError;
use crate::policy::DifficultyTier;
use crate::schema::{
  AnswerGrade, CodingEvaluation, CodingQuestions, McqQuestion, OpenQuestion, OpenQuestions, SubjectiveQuestion,
};

const MCQ_OPTION_COUNT: usize = 4;

const CODING_REQUIRED: [&str; 8] = [
  "title",
  "difficulty",
  "description",
  "function_signature",
  "test_cases",
  "solution",
  "time_complexity",
  "space_complexity",
];

const EVALUATION_REQUIRED: [&str; 5] = ["passed", "test_results", "feedback", "score", "difficulty_appropriate"];

const GRADE_REQUIRED: [&str; 2] = ["grade", "feedback"];

/// Parse agent text as JSON.
///
/// A single surrounding Markdown code fence (```` ``` ```` or ```` ```json ````)
/// is stripped first; that is the only framing tolerated. Broken JSON is never
/// patched up.
pub fn parse_agent_json(text: &str) -> Result<Value, ValidationError> {
  let body = strip_code_fence(text.trim());
  serde_json::from_str::<Value>(body).map_err(|e| ValidationError::MalformedResponse { reason: e.to_string() })
}

fn strip_code_fence(text: &str) -> &str {
  let Some(rest) = text.strip_prefix("```") else { return text };
  let Some(inner) = rest.strip_suffix("```") else { return text };
  // drop the info string ("json") on the opening line
  match inner.find('\n') {
    Some(nl) => inner[nl + 1..].trim(),
    None => inner.trim(),
  }
}

fn top_level_object(root: Value) -> Result<Map<String, Value>, ValidationError> {
  match root {
    Value::Object(map) => Ok(map),
    other => Err(ValidationError::schema(format!("expected a JSON object at top level, got {}", type_name(&other)))),
  }
}

fn questions_array(mut root: Map<String, Value>) -> Result<Vec<Value>, ValidationError> {
  match root.remove("questions") {
    Some(Value::Array(items)) => Ok(items),
    Some(other) => Err(ValidationError::schema(format!("'questions' must be an array, got {}", type_name(&other)))),
    None => Err(ValidationError::schema("response is missing required 'questions' field")),
  }
}

fn type_name(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

/// Absent and `null` both count as missing.
fn missing_fields(map: &Map<String, Value>, required: &[&str]) -> Vec<String> {
  required
    .iter()
    .filter(|k| map.get(**k).map_or(true, Value::is_null))
    .map(|k| k.to_string())
    .collect()
}

fn decode<T: DeserializeOwned>(map: Map<String, Value>, context: &str) -> Result<T, ValidationError> {
  serde_json::from_value(Value::Object(map)).map_err(|e| ValidationError::schema(format!("{context}: {e}")))
}

// ---------------------------------------------------------------------------
// Open questions (strict)
// ---------------------------------------------------------------------------

/// Validate a `{questions: [...]}` response of MCQ / Subjective questions.
pub fn validate_open(text: &str) -> Result<OpenQuestions, ValidationError> {
  let items = questions_array(top_level_object(parse_agent_json(text)?)?)?;
  let questions = items
    .into_iter()
    .enumerate()
    .map(|(i, item)| open_question(i + 1, item))
    .collect::<Result<Vec<_>, _>>()?;
  debug!(target: "questions", count = questions.len(), "open questions validated");
  Ok(OpenQuestions { questions })
}

fn open_question(index: usize, item: Value) -> Result<OpenQuestion, ValidationError> {
  let reject = |problem: String| ValidationError::InvalidOpenQuestion { index, problem };

  let Value::Object(map) = item else {
    return Err(reject(format!("must be an object, got {}", type_name(&item))));
  };

  let kind = match map.get("type") {
    Some(Value::String(s)) => s.as_str(),
    Some(other) if !other.is_null() => return Err(reject("field 'type' must be a string".into())),
    _ => return Err(reject("missing required field(s): type".into())),
  };
  let required: &[&str] = match kind {
    "MCQ" => &["type", "question", "options", "model_answer"],
    "Subjective" => &["type", "question", "model_answer"],
    other => return Err(reject(format!("unsupported type '{other}', expected MCQ or Subjective"))),
  };

  let missing = missing_fields(&map, required);
  if !missing.is_empty() {
    return Err(reject(format!("missing required field(s): {}", missing.join(", "))));
  }
  let unexpected: Vec<&str> = map.keys().map(String::as_str).filter(|k| !required.contains(k)).collect();
  if !unexpected.is_empty() {
    return Err(reject(format!("unexpected field(s): {}", unexpected.join(", "))));
  }

  let text_field = |key: &str| -> Result<String, ValidationError> {
    map
      .get(key)
      .and_then(Value::as_str)
      .map(str::to_string)
      .ok_or_else(|| reject(format!("field '{key}' must be a string")))
  };
  let question = text_field("question")?;
  let model_answer = text_field("model_answer")?;

  if kind == "Subjective" {
    return Ok(OpenQuestion::Subjective(SubjectiveQuestion { question, model_answer }));
  }

  let options = match map.get("options") {
    Some(Value::Array(opts)) => opts,
    _ => return Err(reject("field 'options' must be an array".into())),
  };
  if options.len() != MCQ_OPTION_COUNT {
    return Err(reject(format!("expected exactly {MCQ_OPTION_COUNT} options, got {}", options.len())));
  }
  let options = options
    .iter()
    .map(|o| o.as_str().map(str::to_string))
    .collect::<Option<Vec<_>>>()
    .ok_or_else(|| reject("every option must be a string".into()))?;

  Ok(OpenQuestion::Mcq(McqQuestion { question, options, model_answer }))
}

// ---------------------------------------------------------------------------
// Coding questions (open record, repaired)
// ---------------------------------------------------------------------------

/// Validate and repair a `{questions: [...]}` response of coding questions.
///
/// `requested` fills in `difficulty.level` when the agent left it out.
/// Idempotent: feeding the serialized output back in yields the same value.
pub fn validate_coding(text: &str, requested: DifficultyTier) -> Result<CodingQuestions, ValidationError> {
  let items = questions_array(top_level_object(parse_agent_json(text)?)?)?;
  let questions = items
    .into_iter()
    .enumerate()
    .map(|(i, item)| {
      let position = i + 1;
      let Value::Object(mut map) = item else {
        return Err(ValidationError::schema(format!("question {position}: must be an object")));
      };
      repair_difficulty(&mut map, requested, position);
      repair_test_cases(&mut map, position)?;
      default_list(&mut map, "hints");
      default_list(&mut map, "learning_points");

      let missing = missing_fields(&map, &CODING_REQUIRED);
      if !missing.is_empty() {
        return Err(ValidationError::IncompleteQuestion { question: position, missing });
      }
      decode(map, &format!("question {position}"))
    })
    .collect::<Result<Vec<_>, _>>()?;
  debug!(target: "questions", count = questions.len(), %requested, "coding questions validated");
  Ok(CodingQuestions { questions })
}

fn repair_difficulty(map: &mut Map<String, Value>, requested: DifficultyTier, position: usize) {
  match map.get_mut("difficulty") {
    Some(slot @ Value::String(_)) => {
      let level = slot.take();
      debug!(target: "questions", question = position, "wrapping bare difficulty string");
      *slot = serde_json::json!({ "level": level, "explanation": null });
    }
    Some(Value::Object(d)) if d.get("level").map_or(true, Value::is_null) => {
      debug!(target: "questions", question = position, %requested, "difficulty without level; using requested tier");
      d.insert("level".into(), Value::String(requested.as_str().into()));
    }
    _ => {}
  }

  // "Hard" / " hard " -> "hard"; unknown names are left for the decoder to reject
  if let Some(Value::Object(d)) = map.get_mut("difficulty") {
    if let Some(Value::String(level)) = d.get_mut("level") {
      if let Ok(tier) = level.parse::<DifficultyTier>() {
        *level = tier.as_str().to_string();
      }
    }
    d.entry("explanation").or_insert(Value::Null);
  }
}

/// Each case must be an object with an object `input` and an `expected` key.
/// `expected: null` is a legitimate expected value (a function returning
/// nothing), unlike a null required field on the question itself.
fn repair_test_cases(map: &mut Map<String, Value>, position: usize) -> Result<(), ValidationError> {
  let cases = match map.get_mut("test_cases") {
    None | Some(Value::Null) => return Ok(()),
    Some(Value::Array(cases)) => cases,
    Some(other) => {
      return Err(ValidationError::schema(format!(
        "question {position}: test_cases must be an array, got {}",
        type_name(other)
      )))
    }
  };

  for (j, case) in cases.iter_mut().enumerate() {
    let fail = |problem: &str, raw: &Value| ValidationError::TestCaseFormat {
      question: position,
      test_case: j + 1,
      problem: problem.to_string(),
      raw: raw.clone(),
    };

    let Value::Object(tc) = case else {
      return Err(fail("must be an object", case));
    };
    let (Some(input), Some(expected)) = (tc.get("input"), tc.get("expected")) else {
      return Err(fail("must have 'input' and 'expected' fields", case));
    };
    if !input.is_object() {
      return Err(fail("input must be an object with named parameters", input));
    }

    // keep only the two declared keys
    let cleaned = serde_json::json!({ "input": input, "expected": expected });
    *case = cleaned;
  }
  Ok(())
}

fn default_list(map: &mut Map<String, Value>, key: &str) {
  let slot = map.entry(key).or_insert(Value::Null);
  if slot.is_null() {
    *slot = Value::Array(Vec::new());
  }
}

// ---------------------------------------------------------------------------
// Coding evaluation (open record, coerced)
// ---------------------------------------------------------------------------

/// Validate an evaluation of submitted code.
///
/// Each test result is coerced: `passed` defaults to false, `input` to `{}`,
/// `expected` / `actual` to null and `error` to absent.
pub fn validate_evaluation(text: &str) -> Result<CodingEvaluation, ValidationError> {
  let mut map = top_level_object(parse_agent_json(text)?)?;

  match map.get_mut("test_results") {
    Some(Value::Array(results)) => {
      for (j, result) in results.iter_mut().enumerate() {
        *result = coerce_test_result(j + 1, result)?;
      }
    }
    None | Some(Value::Null) => {}
    Some(other) => {
      return Err(ValidationError::schema(format!("'test_results' must be an array, got {}", type_name(other))));
    }
  }

  let missing = missing_fields(&map, &EVALUATION_REQUIRED);
  if !missing.is_empty() {
    return Err(ValidationError::IncompleteEvaluation { missing });
  }
  let evaluation: CodingEvaluation = decode(map, "evaluation")?;
  debug!(
    target: "questions",
    passed = evaluation.passed,
    score = evaluation.score,
    results = evaluation.test_results.len(),
    "evaluation validated"
  );
  Ok(evaluation)
}

fn coerce_test_result(position: usize, raw: &Value) -> Result<Value, ValidationError> {
  let Value::Object(r) = raw else {
    return Err(ValidationError::schema(format!("test result {position}: must be an object, got {}", type_name(raw))));
  };

  let passed = match r.get("passed") {
    None | Some(Value::Null) => false,
    Some(Value::Bool(b)) => *b,
    Some(other) => {
      return Err(ValidationError::schema(format!(
        "test result {position}: 'passed' must be a boolean, got {}",
        type_name(other)
      )))
    }
  };
  let field = |k: &str| r.get(k).cloned().unwrap_or(Value::Null);
  let input = match r.get("input") {
    None | Some(Value::Null) => Value::Object(Map::new()),
    Some(v) => v.clone(),
  };

  let mut out = Map::new();
  out.insert("passed".into(), Value::Bool(passed));
  out.insert("input".into(), input);
  out.insert("expected".into(), field("expected"));
  out.insert("actual".into(), field("actual"));
  // false / "" mean "no error"; other non-strings are not diagnostics
  match r.get("error") {
    None | Some(Value::Null) | Some(Value::Bool(false)) => {}
    Some(Value::String(e)) if e.trim().is_empty() => {}
    Some(Value::String(e)) => {
      out.insert("error".into(), Value::String(e.clone()));
    }
    Some(other) => {
      return Err(ValidationError::schema(format!(
        "test result {position}: 'error' must be a string, got {}",
        type_name(other)
      )))
    }
  }
  Ok(Value::Object(out))
}

// ---------------------------------------------------------------------------
// Open answer grade (strict)
// ---------------------------------------------------------------------------

/// Validate a `{grade, feedback}` response. A numeric grade is rendered as text;
/// any other key is dropped.
pub fn validate_grade(text: &str) -> Result<AnswerGrade, ValidationError> {
  let map = top_level_object(parse_agent_json(text)?)?;
  let missing = missing_fields(&map, &GRADE_REQUIRED);
  if !missing.is_empty() {
    return Err(ValidationError::IncompleteGrade { missing });
  }

  let grade = match &map["grade"] {
    Value::String(s) => s.clone(),
    Value::Number(n) => n.to_string(),
    other => return Err(ValidationError::schema(format!("'grade' must be a string, got {}", type_name(other)))),
  };
  let feedback = match &map["feedback"] {
    Value::String(s) => s.clone(),
    other => return Err(ValidationError::schema(format!("'feedback' must be a string, got {}", type_name(other)))),
  };
  Ok(AnswerGrade { grade, feedback })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn coding_question() -> Value {
    json!({
      "title": "Find Target Sum Pair",
      "difficulty": { "level": "easy", "explanation": "Nested loops" },
      "description": "Return indices of two numbers adding up to target.",
      "function_signature": "def find_pair(nums: List[int], target: int) -> List[int]:",
      "test_cases": [
        { "input": { "nums": [1, 2, 3, 4, 5], "target": 9 }, "expected": [3, 4] },
        { "input": { "nums": [], "target": 1 }, "expected": [] }
      ],
      "solution": "for i in ...",
      "time_complexity": "O(n^2)",
      "space_complexity": "O(1)",
      "hints": ["Consider nested loops"],
      "learning_points": ["Array traversal"]
    })
  }

  fn wrap(questions: Vec<Value>) -> String {
    json!({ "questions": questions }).to_string()
  }

  // --- parsing ---

  #[test]
  fn non_json_is_malformed_for_every_validator() {
    let text = "Sure! Here are your questions: {questions: oops";
    assert!(matches!(validate_open(text), Err(ValidationError::MalformedResponse { .. })));
    assert!(matches!(validate_coding(text, DifficultyTier::Easy), Err(ValidationError::MalformedResponse { .. })));
    assert!(matches!(validate_evaluation(text), Err(ValidationError::MalformedResponse { .. })));
    assert!(matches!(validate_grade(text), Err(ValidationError::MalformedResponse { .. })));
  }

  #[test]
  fn single_code_fence_is_stripped() {
    let text = format!("```json\n{}\n```", json!({ "grade": "B", "feedback": "Close." }));
    let g = validate_grade(&text).unwrap();
    assert_eq!(g.grade, "B");
  }

  #[test]
  fn prose_around_json_is_not_recovered() {
    let text = format!("Here you go:\n{}", json!({ "grade": "B", "feedback": "Close." }));
    assert!(matches!(validate_grade(&text), Err(ValidationError::MalformedResponse { .. })));
  }

  #[test]
  fn missing_questions_key_is_schema_mismatch() {
    assert!(matches!(validate_open(r#"{"items": []}"#), Err(ValidationError::SchemaMismatch { .. })));
    assert!(matches!(validate_open(r#"[1, 2]"#), Err(ValidationError::SchemaMismatch { .. })));
    assert!(matches!(
      validate_coding(r#"{"questions": {}}"#, DifficultyTier::Easy),
      Err(ValidationError::SchemaMismatch { .. })
    ));
  }

  // --- open questions ---

  #[test]
  fn open_questions_accept_both_kinds() {
    let text = wrap(vec![
      json!({ "type": "MCQ", "question": "Q1", "options": ["a", "b", "c", "d"], "model_answer": "B" }),
      json!({ "type": "Subjective", "question": "Q2", "model_answer": "Because." }),
    ]);
    let out = validate_open(&text).unwrap();
    assert_eq!(out.questions.len(), 2);
    match &out.questions[0] {
      OpenQuestion::Mcq(q) => assert_eq!(q.options.len(), 4),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn subjective_missing_model_answer_names_its_position() {
    let text = wrap(vec![
      json!({ "type": "Subjective", "question": "Q1", "model_answer": "A1" }),
      json!({ "type": "Subjective", "question": "Q2" }),
      json!({ "type": "Subjective", "question": "Q3", "model_answer": "A3" }),
    ]);
    match validate_open(&text) {
      Err(ValidationError::InvalidOpenQuestion { index, problem }) => {
        assert_eq!(index, 2);
        assert!(problem.contains("model_answer"), "{problem}");
      }
      other => panic!("expected rejection, got {other:?}"),
    }
  }

  #[test]
  fn mcq_needs_exactly_four_options() {
    let text = wrap(vec![json!({ "type": "MCQ", "question": "Q", "options": ["a", "b", "c"], "model_answer": "A" })]);
    match validate_open(&text) {
      Err(ValidationError::InvalidOpenQuestion { index: 1, problem }) => assert!(problem.contains("4 options")),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn open_question_rejects_unknown_type_and_extra_keys() {
    let text = wrap(vec![json!({ "type": "Essay", "question": "Q", "model_answer": "A" })]);
    assert!(matches!(validate_open(&text), Err(ValidationError::InvalidOpenQuestion { index: 1, .. })));

    let text = wrap(vec![json!({ "type": "Subjective", "question": "Q", "model_answer": "A", "bloom": "Apply" })]);
    match validate_open(&text) {
      Err(ValidationError::InvalidOpenQuestion { problem, .. }) => assert!(problem.contains("bloom")),
      other => panic!("unexpected {other:?}"),
    }
  }

  // --- coding questions ---

  #[test]
  fn bare_difficulty_string_is_wrapped() {
    let mut q = coding_question();
    q["difficulty"] = json!("hard");
    let out = validate_coding(&wrap(vec![q]), DifficultyTier::Hard).unwrap();
    let d = serde_json::to_value(&out.questions[0].difficulty).unwrap();
    assert_eq!(d, json!({ "level": "hard", "explanation": null }));
  }

  #[test]
  fn difficulty_without_level_takes_requested_tier() {
    let mut q = coding_question();
    q["difficulty"] = json!({ "explanation": "Uses a heap" });
    let out = validate_coding(&wrap(vec![q]), DifficultyTier::Medium).unwrap();
    assert_eq!(out.questions[0].difficulty.level, DifficultyTier::Medium);
    assert_eq!(out.questions[0].difficulty.explanation.as_deref(), Some("Uses a heap"));
  }

  #[test]
  fn difficulty_level_case_is_normalized() {
    let mut q = coding_question();
    q["difficulty"] = json!("Hard");
    let out = validate_coding(&wrap(vec![q]), DifficultyTier::Easy).unwrap();
    assert_eq!(out.questions[0].difficulty.level, DifficultyTier::Hard);
  }

  #[test]
  fn list_input_is_a_test_case_format_error() {
    let mut q = coding_question();
    q["test_cases"][1] = json!({ "input": [1, 2, 3], "expected": 6 });
    match validate_coding(&wrap(vec![q]), DifficultyTier::Easy) {
      Err(ValidationError::TestCaseFormat { question, test_case, raw, .. }) => {
        assert_eq!((question, test_case), (1, 2));
        assert_eq!(raw, json!([1, 2, 3]));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn non_object_test_case_is_a_test_case_format_error() {
    let mut q = coding_question();
    q["test_cases"][0] = json!("tc1");
    match validate_coding(&wrap(vec![coding_question(), q]), DifficultyTier::Easy) {
      Err(ValidationError::TestCaseFormat { question, test_case, raw, .. }) => {
        assert_eq!((question, test_case), (2, 1));
        assert_eq!(raw, json!("tc1"));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn test_case_without_expected_is_a_test_case_format_error() {
    let mut q = coding_question();
    q["test_cases"][1] = json!({ "input": { "nums": [1], "target": 1 } });
    match validate_coding(&wrap(vec![q]), DifficultyTier::Easy) {
      Err(ValidationError::TestCaseFormat { question, test_case, problem, .. }) => {
        assert_eq!((question, test_case), (1, 2));
        assert!(problem.contains("expected"));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn null_expected_is_kept() {
    let mut q = coding_question();
    q["test_cases"][1] = json!({ "input": { "nums": [], "target": 0 }, "expected": null });
    let out = validate_coding(&wrap(vec![q]), DifficultyTier::Easy).unwrap();
    assert_eq!(out.questions[0].test_cases[1].expected, Value::Null);
  }

  #[test]
  fn test_case_extra_keys_are_dropped() {
    let mut q = coding_question();
    q["test_cases"][0]["explanation"] = json!("3 + 4 + 2 = 9");
    let out = validate_coding(&wrap(vec![q]), DifficultyTier::Easy).unwrap();
    let tc = serde_json::to_value(&out.questions[0].test_cases[0]).unwrap();
    assert!(tc.get("explanation").is_none());
  }

  #[test]
  fn optional_lists_default_to_empty() {
    let mut q = coding_question();
    q.as_object_mut().unwrap().remove("hints");
    q.as_object_mut().unwrap().remove("learning_points");
    let out = validate_coding(&wrap(vec![q]), DifficultyTier::Easy).unwrap();
    assert!(out.questions[0].hints.is_empty());
    assert!(out.questions[0].learning_points.is_empty());
  }

  #[test]
  fn missing_required_fields_are_listed() {
    let mut q = coding_question();
    q.as_object_mut().unwrap().remove("solution");
    q.as_object_mut().unwrap().remove("space_complexity");
    match validate_coding(&wrap(vec![coding_question(), q]), DifficultyTier::Easy) {
      Err(ValidationError::IncompleteQuestion { question, missing }) => {
        assert_eq!(question, 2);
        assert_eq!(missing, vec!["solution".to_string(), "space_complexity".to_string()]);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn unknown_question_keys_pass_through() {
    let mut q = coding_question();
    q["tags"] = json!(["arrays", "hashing"]);
    let out = validate_coding(&wrap(vec![q]), DifficultyTier::Easy).unwrap();
    assert_eq!(out.questions[0].extra["tags"], json!(["arrays", "hashing"]));
  }

  #[test]
  fn validate_coding_is_idempotent() {
    let mut q = coding_question();
    q["difficulty"] = json!("Medium");
    q["extra_note"] = json!({ "k": 1 });
    let first = validate_coding(&wrap(vec![q]), DifficultyTier::Medium).unwrap();
    let again = validate_coding(&serde_json::to_string(&first).unwrap(), DifficultyTier::Medium).unwrap();
    assert_eq!(first, again);
    assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&again).unwrap());
  }

  #[test]
  fn wrong_field_type_is_schema_mismatch() {
    let mut q = coding_question();
    q["title"] = json!(42);
    assert!(matches!(
      validate_coding(&wrap(vec![q]), DifficultyTier::Easy),
      Err(ValidationError::SchemaMismatch { .. })
    ));
  }

  // --- evaluation ---

  fn evaluation() -> Value {
    json!({
      "passed": false,
      "test_results": [
        { "passed": true, "input": { "nums": [1, 2] }, "expected": 3, "actual": 3 },
        { "input": { "nums": [] }, "expected": 0, "actual": null, "error": "IndexError", "note": "x" }
      ],
      "feedback": "Handle the empty list.",
      "score": 60,
      "difficulty_appropriate": true,
      "code_quality_feedback": "Readable.",
      "plagiarism_check": "none"
    })
  }

  #[test]
  fn evaluation_coerces_test_results() {
    let e = validate_evaluation(&evaluation().to_string()).unwrap();
    assert_eq!(e.test_results.len(), 2);
    assert!(e.test_results[0].passed);
    assert!(!e.test_results[1].passed);
    assert_eq!(e.test_results[1].error.as_deref(), Some("IndexError"));
    assert_eq!(e.score, 60.0);
    assert_eq!(e.code_quality_feedback.as_deref(), Some("Readable."));
    assert_eq!(e.extra["plagiarism_check"], "none");
  }

  #[test]
  fn evaluation_without_error_leaves_it_absent() {
    let mut raw = evaluation();
    raw["test_results"] = json!([{ "expected": 1, "actual": 1 }]);
    let e = validate_evaluation(&raw.to_string()).unwrap();
    assert!(e.test_results[0].error.is_none());
    assert_eq!(e.test_results[0].input, json!({}));
  }

  #[test]
  fn false_or_empty_error_is_absent() {
    let mut raw = evaluation();
    raw["test_results"] = json!([
      { "passed": true, "input": {}, "expected": 1, "actual": 1, "error": false },
      { "passed": true, "input": {}, "expected": 2, "actual": 2, "error": "" }
    ]);
    let e = validate_evaluation(&raw.to_string()).unwrap();
    assert!(e.test_results.iter().all(|r| r.error.is_none()));
  }

  #[test]
  fn non_string_error_is_schema_mismatch() {
    let mut raw = evaluation();
    raw["test_results"] = json!([
      { "passed": true, "expected": 1, "actual": 1 },
      { "passed": false, "expected": 2, "actual": 3, "error": { "code": 1 } }
    ]);
    match validate_evaluation(&raw.to_string()) {
      Err(ValidationError::SchemaMismatch { detail }) => assert!(detail.contains("test result 2"), "{detail}"),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn evaluation_missing_fields_are_listed() {
    let mut raw = evaluation();
    raw.as_object_mut().unwrap().remove("score");
    raw.as_object_mut().unwrap().remove("difficulty_appropriate");
    match validate_evaluation(&raw.to_string()) {
      Err(ValidationError::IncompleteEvaluation { missing }) => {
        assert_eq!(missing, vec!["score".to_string(), "difficulty_appropriate".to_string()]);
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  // --- grade ---

  #[test]
  fn grade_requires_both_fields() {
    match validate_grade(r#"{"grade": "A"}"#) {
      Err(ValidationError::IncompleteGrade { missing }) => assert_eq!(missing, vec!["feedback".to_string()]),
      other => panic!("unexpected {other:?}"),
    }
    let g = validate_grade(r#"{"grade": 8, "feedback": "Good", "confidence": 0.9}"#).unwrap();
    assert_eq!(g.grade, "8");
  }
}
