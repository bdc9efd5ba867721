//! Response-shape normalization for `/quiz/generate`.
//!
//! The service has shipped several envelopes over time. They are modelled as
//! one untagged union whose variant order is the matching order: serde tries
//! each variant in turn and keeps the first that decodes.

use serde::Deserialize;
use serde_json::Value;

use crate::error::QuizError;
use crate::model::Question;

/// Longest body excerpt carried in an `InvalidResponseShape` error.
const PREVIEW_LEN: usize = 120;

/// A generated quiz in whichever envelope the service used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuizPayload {
    /// `[question, ...]`
    Bare(Vec<Question>),
    /// `{ "data": [question, ...], ... }`
    Data { data: Vec<Question> },
    /// `{ "questions": [question, ...], ... }`
    Questions { questions: Vec<Question> },
    /// `{ "quiz": [question, ...], "count": n }`
    Quiz {
        quiz: Vec<Question>,
        #[serde(default)]
        count: Option<u64>,
    },
}

/// Which envelope a payload arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Bare,
    Data,
    Questions,
    Quiz,
}

impl QuizPayload {
    /// Resolve a decoded JSON body into the first matching shape.
    pub fn from_value(value: Value) -> Result<Self, QuizError> {
        let preview = preview(&value);
        serde_json::from_value(value).map_err(|_| {
            QuizError::InvalidResponseShape(format!("no known quiz shape matches: {preview}"))
        })
    }

    /// Resolve a raw body.
    pub fn from_slice(body: &[u8]) -> Result<Self, QuizError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| QuizError::InvalidResponseShape(format!("body is not JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn shape(&self) -> ResponseShape {
        match self {
            QuizPayload::Bare(_) => ResponseShape::Bare,
            QuizPayload::Data { .. } => ResponseShape::Data,
            QuizPayload::Questions { .. } => ResponseShape::Questions,
            QuizPayload::Quiz { .. } => ResponseShape::Quiz,
        }
    }

    pub fn questions(&self) -> &[Question] {
        match self {
            QuizPayload::Bare(q)
            | QuizPayload::Data { data: q }
            | QuizPayload::Questions { questions: q }
            | QuizPayload::Quiz { quiz: q, .. } => q,
        }
    }

    pub fn into_questions(self) -> Vec<Question> {
        match self {
            QuizPayload::Bare(q)
            | QuizPayload::Data { data: q }
            | QuizPayload::Questions { questions: q }
            | QuizPayload::Quiz { quiz: q, .. } => q,
        }
    }

    pub fn len(&self) -> usize {
        self.questions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions().is_empty()
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= PREVIEW_LEN {
        text
    } else {
        let cut: String = text.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    }
}
