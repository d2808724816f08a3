//! Prompt composition for the generation agent.
//!
//! Every generation prompt restates the exact JSON shape expected back (with a
//! literal worked example), embeds the difficulty bounds where relevant, tells
//! the agent to consult the retrieval tool first, and asks for one JSON object
//! with no surrounding prose. Composition is pure and deterministic.

use serde_json::json;

use crate::config::IndexSettings;
use crate::error::InputError;
use crate::policy::{profile_for, DifficultyTier, ProgrammingLanguage, QuestionKind};
use crate::schema::CodingQuestion;
use crate::util::fill_template;

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 10;

/// Reject counts outside `[MIN_QUESTIONS, MAX_QUESTIONS]`.
pub fn check_count(count: u32) -> Result<u32, InputError> {
  if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
    Ok(count)
  } else {
    Err(InputError::InvalidCount(count))
  }
}

const SYSTEM_TEMPLATE: &str = r#"You are a question generator designed to create questions based on study materials. Always use the {tool} tool to gather relevant information before generating questions or evaluating answers.

For Multiple Choice Questions (MCQs):
- Generate questions with 4 options each (A, B, C, D).
- Provide the correct answer for each question.

For Subjective Questions:
- Generate diverse questions that require detailed answers following Bloom's Taxonomy.
- Provide the model answer for each question.

Bloom's Taxonomy layers:
- Remember/Knowledge: recall facts and basic concepts (define, identify, describe). Questions start with: What is...? Who were the main...?
- Understand/Comprehension: explain what the facts mean (summarize, interpret, compare). Questions start with: What is the main idea of...?
- Apply: use the facts to solve a problem (solve, use, complete). Questions start with: How would you use... to solve...?
- Analyze: break the facts into parts (contrast, relate, categorize). Questions start with: What is the relationship between...?
- Evaluate: make a judgment about the facts (judge, defend, prioritize). Questions start with: What are the strengths and weaknesses of...?
- Create: make something new from the facts (design, modify, develop). Questions start with: What would happen if...?

Respond with a single valid JSON object and nothing else: no Markdown, no commentary. Double-check the JSON structure before submitting."#;

const OPEN_TEMPLATE: &str = r#"Generate {count} {kind} questions about {topic}.
Use the {tool} tool to look up the relevant material before writing any question.

Your response must be a single valid JSON object with a "questions" key holding an array of question objects, exactly like this example:

{example}

Rules:
1. "type" is either "MCQ" or "Subjective".
2. MCQ questions have "question", exactly 4 "options" and "model_answer" (the correct option letter).
3. Subjective questions have "question" and "model_answer" only.
4. Do not add any other keys.
5. Output only the JSON object, with no text before or after it."#;

const CODING_TEMPLATE: &str = r#"Generate {count} {tier} coding questions{topic_clause} in {language}.
Use the {tool} tool to look up the relevant material before writing any question.

The questions should align with the following difficulty parameters:
- Time Complexity Target: {time_complexity}
- Typical Concepts: {concepts}
- Expected Solving Time: {expected_time}
- Constraints: {constraints}

Your response must follow this exact JSON structure (using the example format below):

{example}

IMPORTANT REQUIREMENTS:
1. Each question must follow the exact structure shown above
2. All test cases must have 'input' as an object with named parameters
3. The 'expected' field in test cases must match the function's return type
4. Include at least 3 test cases per question, including edge cases
5. The function signature must match the {language} syntax
6. Output only the JSON object, with no text before or after it"#;

const EVALUATION_TEMPLATE: &str = r#"Evaluate the following coding solution.
Use the {tool} tool if the question refers to concepts from the study material.

Programming Language: {language}

Question:
{description}

Difficulty Level: {tier}
Expected Time Complexity: {time_complexity}
Expected Space Complexity: {space_complexity}

Expected Function Signature:
{signature}

Test Cases:
{test_cases}

Difficulty Parameters:
{profile}

User's Solution:
{user_code}

Run every test case mentally against the solution and report each result. Also assess time and space complexity, code style, error handling, edge case coverage and language-specific practice.

Your response must be a single valid JSON object exactly like this example:

{example}

"passed", "test_results", "feedback", "score" (0-100) and "difficulty_appropriate" are required. Output only the JSON object, with no text before or after it."#;

const GRADE_TEMPLATE: &str = r#"Evaluate the following user answer:
Question: {question}
User Answer: {user_answer}
Correct Answer: {correct_answer}

Provide your evaluation as a single valid JSON object exactly like this example:

{example}

Output only the JSON object, with no text before or after it."#;

fn pretty(v: &serde_json::Value) -> String {
  serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn open_example() -> serde_json::Value {
  json!({
    "questions": [
      {
        "type": "MCQ",
        "question": "Which UML diagram shows the interaction between objects over time?",
        "options": ["Class diagram", "Sequence diagram", "Deployment diagram", "Use case diagram"],
        "model_answer": "B"
      },
      {
        "type": "Subjective",
        "question": "Explain the difference between verification and validation.",
        "model_answer": "Verification checks that the product is built right; validation checks that the right product is built."
      }
    ]
  })
}

fn coding_example() -> serde_json::Value {
  json!({
    "questions": [{
      "title": "Example: Find Target Sum Pair",
      "difficulty": { "level": "easy", "explanation": "Basic array traversal with nested loops" },
      "description": "Example description",
      "function_signature": "def find_pair(nums: List[int], target: int) -> List[int]:",
      "test_cases": [{ "input": { "nums": [1, 2, 3, 4, 5], "target": 9 }, "expected": [3, 4] }],
      "solution": "Example solution",
      "time_complexity": "O(n^2)",
      "space_complexity": "O(1)",
      "hints": ["Consider using nested loops"],
      "learning_points": ["Array traversal", "Brute force approach"]
    }]
  })
}

fn evaluation_example() -> serde_json::Value {
  json!({
    "passed": false,
    "test_results": [
      { "passed": true, "input": { "nums": [1, 2, 3, 4, 5], "target": 9 }, "expected": [3, 4], "actual": [3, 4] },
      { "passed": false, "input": { "nums": [], "target": 1 }, "expected": [], "actual": null, "error": "IndexError: list index out of range" }
    ],
    "feedback": "Correct on typical input but crashes on an empty list.",
    "score": 60,
    "difficulty_appropriate": true,
    "time_complexity_analysis": "O(n^2) because of the nested loops.",
    "space_complexity_analysis": "O(1) extra space.",
    "code_quality_feedback": "Readable, but variable names could be clearer.",
    "improvement_suggestions": ["Guard against empty input", "Use a hash map for O(n) time"]
  })
}

fn grade_example() -> serde_json::Value {
  json!({ "grade": "B", "feedback": "Covers the main idea but misses the distinction between the two activities." })
}

/// Builds prompt text for every generation intent.
#[derive(Clone, Debug)]
pub struct PromptComposer {
  tool_name: String,
}

impl PromptComposer {
  pub fn new(index: &IndexSettings) -> Self {
    Self { tool_name: index.tool_name.clone() }
  }

  pub fn tool_name(&self) -> &str {
    &self.tool_name
  }

  /// Standing instructions for the agent.
  pub fn system_prompt(&self) -> String {
    fill_template(SYSTEM_TEMPLATE, &[("tool", self.tool_name.as_str())])
  }

  pub fn open_questions(&self, topic: &str, kind: QuestionKind, count: u32) -> Result<String, InputError> {
    let count = check_count(count)?.to_string();
    Ok(fill_template(
      OPEN_TEMPLATE,
      &[
        ("count", count.as_str()),
        ("kind", kind.describe()),
        ("tool", self.tool_name.as_str()),
        ("example", pretty(&open_example()).as_str()),
        ("topic", topic),
      ],
    ))
  }

  pub fn coding_questions(
    &self,
    language: ProgrammingLanguage,
    tier: DifficultyTier,
    topic: Option<&str>,
    count: u32,
  ) -> Result<String, InputError> {
    let count = check_count(count)?.to_string();
    let profile = profile_for(tier);
    let constraints = pretty(&json!(profile.constraints));
    let topic_clause = match topic.map(str::trim) {
      Some(t) if !t.is_empty() => format!(" about {t}"),
      _ => String::new(),
    };
    Ok(fill_template(
      CODING_TEMPLATE,
      &[
        ("count", count.as_str()),
        ("tier", tier.as_str()),
        ("language", language.name()),
        ("tool", self.tool_name.as_str()),
        ("time_complexity", profile.time_complexity.join(", ").as_str()),
        ("concepts", profile.typical_concepts.join(", ").as_str()),
        ("expected_time", profile.expected_time.as_str()),
        ("constraints", constraints.as_str()),
        ("example", pretty(&coding_example()).as_str()),
        ("topic_clause", topic_clause.as_str()),
      ],
    ))
  }

  /// Evaluation prompt for submitted code. The tier is taken from the question.
  pub fn coding_evaluation(
    &self,
    question: &CodingQuestion,
    user_code: &str,
    language: ProgrammingLanguage,
  ) -> Result<String, InputError> {
    if user_code.trim().is_empty() {
      return Err(InputError::EmptySubmission);
    }
    let tier = question.difficulty.level;
    let test_cases = serde_json::to_value(&question.test_cases).map(|v| pretty(&v)).unwrap_or_default();
    let profile = serde_json::to_value(profile_for(tier)).map(|v| pretty(&v)).unwrap_or_default();
    Ok(fill_template(
      EVALUATION_TEMPLATE,
      &[
        ("tool", self.tool_name.as_str()),
        ("language", language.name()),
        ("tier", tier.as_str()),
        ("time_complexity", question.time_complexity.as_str()),
        ("space_complexity", question.space_complexity.as_str()),
        ("test_cases", test_cases.as_str()),
        ("profile", profile.as_str()),
        ("example", pretty(&evaluation_example()).as_str()),
        ("description", question.description.as_str()),
        ("signature", question.function_signature.as_str()),
        ("user_code", user_code),
      ],
    ))
  }

  pub fn answer_grading(&self, question: &str, user_answer: &str, correct_answer: &str) -> String {
    fill_template(
      GRADE_TEMPLATE,
      &[
        ("example", pretty(&grade_example()).as_str()),
        ("question", question),
        ("correct_answer", correct_answer),
        ("user_answer", user_answer),
      ],
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::policy::normalize_language;
  use crate::validate;

  fn composer() -> PromptComposer {
    PromptComposer::new(&IndexSettings::default())
  }

  #[test]
  fn count_bounds() {
    assert!(check_count(1).is_ok());
    assert!(check_count(10).is_ok());
    assert!(matches!(check_count(0), Err(InputError::InvalidCount(0))));
    assert!(matches!(check_count(11), Err(InputError::InvalidCount(11))));
  }

  #[test]
  fn coding_prompt_embeds_profile_and_tool() {
    let lang = normalize_language("cpp").unwrap();
    let p = composer().coding_questions(lang, DifficultyTier::Medium, Some("graphs"), 3).unwrap();
    assert!(p.contains("Generate 3 medium coding questions about graphs in C++"));
    assert!(p.contains("O(n log n)"));
    assert!(p.contains("n ≤ 10^5"));
    assert!(p.contains("20-30 minutes"));
    assert!(p.contains("study_material_query"));
    assert!(p.contains("\"function_signature\""));
  }

  #[test]
  fn coding_prompt_rejects_bad_count_before_composing() {
    let lang = normalize_language("python").unwrap();
    assert!(matches!(
      composer().coding_questions(lang, DifficultyTier::Easy, None, 11),
      Err(InputError::InvalidCount(11))
    ));
  }

  #[test]
  fn composition_is_deterministic() {
    let c = composer();
    let a = c.open_questions("requirements engineering", QuestionKind::Mixed, 4).unwrap();
    let b = c.open_questions("requirements engineering", QuestionKind::Mixed, 4).unwrap();
    assert_eq!(a, b);
    assert!(a.contains("Generate 4 a mix of MCQ and Subjective questions about requirements engineering"));
  }

  #[test]
  fn embedded_examples_pass_their_own_validators() {
    assert!(validate::validate_open(&open_example().to_string()).is_ok());
    assert!(validate::validate_coding(&coding_example().to_string(), DifficultyTier::Easy).is_ok());
    assert!(validate::validate_evaluation(&evaluation_example().to_string()).is_ok());
    assert!(validate::validate_grade(&grade_example().to_string()).is_ok());
  }

  #[test]
  fn evaluation_prompt_requires_code() {
    let questions = validate::validate_coding(&coding_example().to_string(), DifficultyTier::Easy).unwrap();
    let lang = normalize_language("python").unwrap();
    let c = composer();
    assert!(matches!(c.coding_evaluation(&questions.questions[0], "   ", lang), Err(InputError::EmptySubmission)));
    let p = c.coding_evaluation(&questions.questions[0], "def find_pair(nums, target): pass", lang).unwrap();
    assert!(p.contains("Difficulty Level: easy"));
    assert!(p.contains("def find_pair(nums, target): pass"));
  }

  #[test]
  fn grading_prompt_keeps_placeholders_in_caller_text() {
    let p = composer().answer_grading("Explain what {user_answer} and {correct_answer} mean here", "MY-ANSWER", "THE-KEY");
    assert!(p.contains("Question: Explain what {user_answer} and {correct_answer} mean here"));
    assert!(p.contains("User Answer: MY-ANSWER"));
    assert!(p.contains("Correct Answer: THE-KEY"));
  }

  #[test]
  fn evaluation_prompt_keeps_placeholders_in_question_text() {
    let mut q = validate::validate_coding(&coding_example().to_string(), DifficultyTier::Easy).unwrap().questions.remove(0);
    q.description = "Format the result as {user_code} would.".into();
    let lang = normalize_language("python").unwrap();
    let p = composer().coding_evaluation(&q, "print(1)", lang).unwrap();
    assert!(p.contains("Format the result as {user_code} would."));
  }

  #[test]
  fn system_prompt_names_configured_tool() {
    let mut idx = IndexSettings::default();
    idx.tool_name = "course_notes".into();
    assert!(PromptComposer::new(&idx).system_prompt().contains("Always use the course_notes tool"));
  }
}
