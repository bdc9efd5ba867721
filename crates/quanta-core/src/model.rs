//! Core data model types for quanta.
//!
//! Questions are owned by the quiz service: the client only needs their `id`
//! and passes everything else through untouched. Answers and validation
//! results are keyed by that same id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Quiz lengths offered to the user when starting an attempt.
pub const COUNT_PRESETS: [u32; 5] = [5, 10, 15, 20, 50];

/// Identifier of a question as emitted by the service.
///
/// The service may use strings or integers; both round-trip unchanged so the
/// id sent back in `question_id` is exactly the one received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(n) => write!(f, "{n}"),
            QuestionId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        QuestionId::Text(s.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        QuestionId::Text(s)
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        QuestionId::Number(n)
    }
}

/// A single question. Only `id` is required; every other field is kept as the
/// service sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    #[serde(default)]
    pub text: String,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style setter used by tests and fixtures.
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Raw access to any service-defined field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The question type, when the service sent a known one.
    pub fn kind(&self) -> Option<QuestionType> {
        self.field("type")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// The question stem.
    pub fn content(&self) -> Option<&str> {
        self.field("content").and_then(Value::as_str)
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.field("difficulty")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Choice options; malformed entries are skipped.
    pub fn options(&self) -> Vec<QuestionOption> {
        self.field("options")
            .and_then(Value::as_array)
            .map(|opts| {
                opts.iter()
                    .filter_map(|o| serde_json::from_value(o.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Question types the service is known to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    FillBlank,
}

impl QuestionType {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "Single choice",
            QuestionType::MultipleChoice => "Multiple choice",
            QuestionType::TrueFalse => "True / false",
            QuestionType::ShortAnswer => "Short answer",
            QuestionType::FillBlank => "Fill in the blank",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::FillBlank => "fill_blank",
        };
        f.write_str(s)
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_choice" => Ok(QuestionType::SingleChoice),
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "true_false" => Ok(QuestionType::TrueFalse),
            "short_answer" => Ok(QuestionType::ShortAnswer),
            "fill_blank" => Ok(QuestionType::FillBlank),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Difficulty tiers, stored by the service as a single letter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Difficulty {
    A,
    #[default]
    B,
    C,
    D,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [Difficulty::A, Difficulty::B, Difficulty::C, Difficulty::D];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::A => "Basic",
            Difficulty::B => "Advanced",
            Difficulty::C => "Expert",
            Difficulty::D => "Master",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Difficulty::A => "Consolidate the core concepts",
            Difficulty::B => "Apply the core knowledge",
            Difficulty::C => "Analyse complex scenarios",
            Difficulty::D => "Edge cases at the limit",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::A => "A",
            Difficulty::B => "B",
            Difficulty::C => "C",
            Difficulty::D => "D",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" | "basic" => Ok(Difficulty::A),
            "b" | "advanced" => Ok(Difficulty::B),
            "c" | "expert" => Ok(Difficulty::C),
            "d" | "master" => Ok(Difficulty::D),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Parameters for generating a quiz; serialized as the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizParams {
    pub subject: String,
    pub count: u32,
    pub difficulty: Difficulty,
}

impl QuizParams {
    pub fn new(subject: impl Into<String>, count: u32, difficulty: Difficulty) -> Self {
        Self {
            subject: subject.into(),
            count,
            difficulty,
        }
    }

    /// Reject parameters the service can never satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.subject.trim().is_empty() {
            return Err("subject must not be empty".into());
        }
        if self.count == 0 {
            return Err("count must be at least 1".into());
        }
        Ok(())
    }
}

/// A user's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Text(String),
    Choices(Vec<String>),
}

impl Answer {
    /// An empty text answer is treated as no answer at all.
    pub fn is_blank(&self) -> bool {
        matches!(self, Answer::Text(s) if s.is_empty())
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::Text(s.to_string())
    }
}

impl From<String> for Answer {
    fn from(s: String) -> Self {
        Answer::Text(s)
    }
}

impl From<bool> for Answer {
    fn from(b: bool) -> Self {
        Answer::Flag(b)
    }
}

impl From<Vec<String>> for Answer {
    fn from(v: Vec<String>) -> Self {
        Answer::Choices(v)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Flag(b) => write!(f, "{b}"),
            Answer::Text(s) => f.write_str(s),
            Answer::Choices(v) => f.write_str(&v.join(", ")),
        }
    }
}

/// Body of a `/quiz/validate` request.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateRequest<'a> {
    pub question_id: &'a QuestionId,
    pub user_answer: &'a Answer,
}

/// Verdict returned by the service for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidationResult {
    pub fn new(correct: bool) -> Self {
        Self {
            correct,
            explanation: None,
            extra: Map::new(),
        }
    }
}

/// Body of `/meta/subjects`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubjectList {
    Wrapped { subjects: Vec<String> },
    Bare(Vec<String>),
}

impl SubjectList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            SubjectList::Wrapped { subjects } => subjects,
            SubjectList::Bare(subjects) => subjects,
        }
    }
}
