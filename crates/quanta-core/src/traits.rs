//! The seam between the exam session and the quiz backend.
//!
//! `quanta-client` implements [`QuizService`] over HTTP; tests implement it in
//! memory.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::QuizError;
use crate::model::{Answer, QuestionId, QuizParams, ValidationResult};
use crate::shape::QuizPayload;

/// Typed operations offered by the quiz service.
#[async_trait]
pub trait QuizService: Send + Sync {
    /// All subject names.
    async fn fetch_subjects(&self) -> Result<Vec<String>, QuizError>;

    /// Tag metadata, passed through as the service defines it.
    async fn fetch_tags(&self) -> Result<Value, QuizError>;

    /// Generate a quiz and normalize its envelope.
    async fn generate_quiz(&self, params: &QuizParams) -> Result<QuizPayload, QuizError>;

    /// Submit one answer for grading.
    async fn validate_answer(
        &self,
        question_id: &QuestionId,
        answer: &Answer,
    ) -> Result<ValidationResult, QuizError>;

    /// Worked explanation for one question.
    async fn get_explanation(&self, question_id: &QuestionId) -> Result<Value, QuizError>;

    /// Question listing filtered by arbitrary query pairs.
    async fn list_questions(&self, query: &[(String, String)]) -> Result<Value, QuizError>;
}
