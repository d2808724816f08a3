//! Static generation policy: difficulty tiers, their profiles, and the
//! programming-language alias table.
//!
//! Everything here is a pure lookup. Nothing is mutated at runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Difficulty tier requested by the caller or reported by the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
  Easy,
  Medium,
  Hard,
}

impl DifficultyTier {
  pub const ALL: [DifficultyTier; 3] = [DifficultyTier::Easy, DifficultyTier::Medium, DifficultyTier::Hard];

  pub fn as_str(&self) -> &'static str {
    match self {
      DifficultyTier::Easy => "easy",
      DifficultyTier::Medium => "medium",
      DifficultyTier::Hard => "hard",
    }
  }
}

impl fmt::Display for DifficultyTier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Case-insensitive, whitespace-trimmed. Anything outside the three tiers is rejected.
impl FromStr for DifficultyTier {
  type Err = InputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "easy" => Ok(DifficultyTier::Easy),
      "medium" => Ok(DifficultyTier::Medium),
      "hard" => Ok(DifficultyTier::Hard),
      _ => Err(InputError::InvalidTier(s.to_string())),
    }
  }
}

/// Generation constraints attached to a tier.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DifficultyProfile {
  pub time_complexity: Vec<String>,
  pub typical_concepts: Vec<String>,
  pub expected_time: String,
  pub constraints: BTreeMap<String, String>,
}

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

fn constraints(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
  pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Profile for a tier. Total over `DifficultyTier`; unknown tier names are
/// rejected earlier by `DifficultyTier::from_str`.
pub fn profile_for(tier: DifficultyTier) -> DifficultyProfile {
  match tier {
    DifficultyTier::Easy => DifficultyProfile {
      time_complexity: strings(&["O(1)", "O(n)"]),
      typical_concepts: strings(&[
        "Basic array operations",
        "Simple string manipulation",
        "Basic math operations",
        "If-else conditions",
        "Basic loops",
      ]),
      expected_time: "10-15 minutes".into(),
      constraints: constraints(&[
        ("input_size", "n ≤ 1000"),
        ("time_limit", "1 second"),
        ("space_complexity", "O(1) to O(n)"),
      ]),
    },
    DifficultyTier::Medium => DifficultyProfile {
      time_complexity: strings(&["O(n)", "O(n log n)"]),
      typical_concepts: strings(&[
        "Two pointers",
        "Hash tables",
        "Binary search",
        "Basic graph algorithms",
        "Basic dynamic programming",
      ]),
      expected_time: "20-30 minutes".into(),
      constraints: constraints(&[
        ("input_size", "n ≤ 10^5"),
        ("time_limit", "2 seconds"),
        ("space_complexity", "O(n)"),
      ]),
    },
    DifficultyTier::Hard => DifficultyProfile {
      time_complexity: strings(&["O(n log n)", "O(n^2)", "O(2^n)"]),
      typical_concepts: strings(&[
        "Advanced dynamic programming",
        "Complex graph algorithms",
        "Tree algorithms",
        "Advanced data structures",
        "Mathematical algorithms",
      ]),
      expected_time: "30-45 minutes".into(),
      constraints: constraints(&[
        ("input_size", "n ≤ 10^6"),
        ("time_limit", "3 seconds"),
        ("space_complexity", "Problem specific"),
      ]),
    },
  }
}

/// Parse a tier name and return its profile in one step.
pub fn profile_for_name(name: &str) -> Result<(DifficultyTier, DifficultyProfile), InputError> {
  let tier = name.parse::<DifficultyTier>()?;
  Ok((tier, profile_for(tier)))
}

/// Canonical display name of a supported programming language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgrammingLanguage(&'static str);

impl ProgrammingLanguage {
  pub fn name(&self) -> &'static str {
    self.0
  }
}

impl fmt::Display for ProgrammingLanguage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.0)
  }
}

// alias (lowercase) -> canonical name
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
  ("python", "Python"),
  ("javascript", "JavaScript"),
  ("java", "Java"),
  ("cpp", "C++"),
  ("c++", "C++"),
  ("c", "C"),
  ("csharp", "C#"),
  ("c#", "C#"),
];

/// Resolve a free-form language name to its canonical form.
/// Exact alias match after trimming and lowercasing; no fuzzy matching.
pub fn normalize_language(input: &str) -> Result<ProgrammingLanguage, InputError> {
  let key = input.trim().to_lowercase();
  LANGUAGE_ALIASES
    .iter()
    .find(|(alias, _)| *alias == key)
    .map(|(_, canonical)| ProgrammingLanguage(canonical))
    .ok_or_else(|| InputError::UnsupportedLanguage(input.to_string()))
}

/// Requested mix of open questions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionKind {
  Mcq,
  Subjective,
  Mixed,
}

impl QuestionKind {
  /// Wording used inside prompts.
  pub fn describe(&self) -> &'static str {
    match self {
      QuestionKind::Mcq => "MCQ",
      QuestionKind::Subjective => "Subjective",
      QuestionKind::Mixed => "a mix of MCQ and Subjective",
    }
  }
}

impl FromStr for QuestionKind {
  type Err = InputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "mcq" | "multiple choice" => Ok(QuestionKind::Mcq),
      "subjective" => Ok(QuestionKind::Subjective),
      "mixed" => Ok(QuestionKind::Mixed),
      _ => Err(InputError::InvalidQuestionType(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn question_kind_aliases() {
    assert_eq!("MCQ".parse::<QuestionKind>().unwrap(), QuestionKind::Mcq);
    assert_eq!(" Multiple Choice".parse::<QuestionKind>().unwrap(), QuestionKind::Mcq);
    assert_eq!("subjective".parse::<QuestionKind>().unwrap(), QuestionKind::Subjective);
    assert_eq!("Mixed".parse::<QuestionKind>().unwrap(), QuestionKind::Mixed);
    assert!(matches!("essay".parse::<QuestionKind>(), Err(InputError::InvalidQuestionType(_))));
  }

  #[test]
  fn question_kind_table_is_closed() {
    for name in ["mcqs", "multiple-choice", "both"] {
      assert!(matches!(name.parse::<QuestionKind>(), Err(InputError::InvalidQuestionType(_))), "{name}");
    }
  }

  #[test]
  fn every_tier_has_constraints_and_complexities() {
    for tier in DifficultyTier::ALL {
      let p = profile_for(tier);
      assert!(!p.constraints.is_empty(), "{tier} has no constraints");
      assert!(!p.time_complexity.is_empty(), "{tier} has no time complexities");
      assert!(!p.typical_concepts.is_empty());
    }
  }

  #[test]
  fn tier_parsing_is_case_insensitive_and_rejects_unknown() {
    assert_eq!(" Hard ".parse::<DifficultyTier>().unwrap(), DifficultyTier::Hard);
    assert_eq!("MEDIUM".parse::<DifficultyTier>().unwrap(), DifficultyTier::Medium);
    match "expert".parse::<DifficultyTier>() {
      Err(InputError::InvalidTier(t)) => assert_eq!(t, "expert"),
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[test]
  fn profile_for_name_rejects_unknown_tier() {
    assert!(profile_for_name("legendary").is_err());
    let (tier, profile) = profile_for_name("easy").unwrap();
    assert_eq!(tier, DifficultyTier::Easy);
    assert_eq!(profile.expected_time, "10-15 minutes");
  }

  #[test]
  fn language_variants_normalize_to_same_name() {
    for input in ["  C++ ", "cpp", "C++", "CPP"] {
      assert_eq!(normalize_language(input).unwrap().name(), "C++");
    }
    assert_eq!(normalize_language("c#").unwrap().name(), "C#");
    assert_eq!(normalize_language("CSharp").unwrap().name(), "C#");
    assert_eq!(normalize_language("Python").unwrap().name(), "Python");
  }

  #[test]
  fn unknown_language_is_rejected_verbatim() {
    match normalize_language("brainfuck") {
      Err(InputError::UnsupportedLanguage(l)) => assert_eq!(l, "brainfuck"),
      other => panic!("unexpected: {other:?}"),
    }
    // prefixes and near-misses are not guessed
    assert!(normalize_language("pyth").is_err());
    assert!(normalize_language("js").is_err());
  }
}
