//! Mock quiz service for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use quanta_core::error::QuizError;
use quanta_core::model::{Answer, Question, QuestionId, QuizParams, ValidationResult};
use quanta_core::shape::QuizPayload;
use quanta_core::traits::QuizService;

/// A mock quiz service for exercising sessions without a backend.
///
/// Answers are graded against a key of correct answers; questions without a
/// key entry are graded as incorrect.
pub struct MockQuizService {
    /// Subjects returned by `fetch_subjects`.
    subjects: Vec<String>,
    /// Questions returned by every `generate_quiz`.
    questions: Vec<Question>,
    /// Question id → correct answer.
    answer_key: HashMap<QuestionId, Answer>,
    /// When set, every call fails with this error.
    failure: Option<QuizError>,
    /// Number of service calls made.
    call_count: AtomicU32,
    /// Last generation request received.
    last_params: Mutex<Option<QuizParams>>,
}

impl MockQuizService {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            subjects: Vec::new(),
            questions,
            answer_key: HashMap::new(),
            failure: None,
            call_count: AtomicU32::new(0),
            last_params: Mutex::new(None),
        }
    }

    /// A mock whose every call fails with `error`.
    pub fn failing(error: QuizError) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.failure = Some(error);
        mock
    }

    pub fn with_subjects(mut self, subjects: &[&str]) -> Self {
        self.subjects = subjects.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_answer(
        mut self,
        question_id: impl Into<QuestionId>,
        answer: impl Into<Answer>,
    ) -> Self {
        self.answer_key.insert(question_id.into(), answer.into());
        self
    }

    /// Get the number of calls made to this service.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the parameters of the last `generate_quiz` call.
    pub fn last_params(&self) -> Option<QuizParams> {
        self.last_params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self) -> Result<(), QuizError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn find(&self, question_id: &QuestionId) -> Result<&Question, QuizError> {
        self.questions
            .iter()
            .find(|q| &q.id == question_id)
            .ok_or_else(|| QuizError::Service {
                status: 404,
                status_text: "Not Found".into(),
                body: Some(format!("no question {question_id}")),
            })
    }
}

#[async_trait]
impl QuizService for MockQuizService {
    async fn fetch_subjects(&self) -> Result<Vec<String>, QuizError> {
        self.record()?;
        Ok(self.subjects.clone())
    }

    async fn fetch_tags(&self) -> Result<Value, QuizError> {
        self.record()?;
        Ok(json!({"tags": []}))
    }

    async fn generate_quiz(&self, params: &QuizParams) -> Result<QuizPayload, QuizError> {
        self.record()?;
        *self
            .last_params
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(params.clone());

        let quiz: Vec<Question> = self
            .questions
            .iter()
            .take(params.count as usize)
            .cloned()
            .collect();
        Ok(QuizPayload::Quiz {
            count: Some(quiz.len() as u64),
            quiz,
        })
    }

    async fn validate_answer(
        &self,
        question_id: &QuestionId,
        answer: &Answer,
    ) -> Result<ValidationResult, QuizError> {
        self.record()?;
        self.find(question_id)?;

        let expected = self.answer_key.get(question_id);
        let mut result = ValidationResult::new(expected == Some(answer));
        result.explanation = expected.map(|a| format!("the correct answer is {a}"));
        Ok(result)
    }

    async fn get_explanation(&self, question_id: &QuestionId) -> Result<Value, QuizError> {
        self.record()?;
        let question = self.find(question_id)?;
        Ok(json!({
            "question_id": question.id,
            "explanation": question.field("explanation").cloned().unwrap_or(Value::Null),
        }))
    }

    async fn list_questions(&self, _query: &[(String, String)]) -> Result<Value, QuizError> {
        self.record()?;
        Ok(json!({
            "items": self.questions,
            "total": self.questions.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quanta_core::model::Difficulty;

    fn sample() -> MockQuizService {
        MockQuizService::new(vec![
            Question::new("Q1").with_field("explanation", json!("two plus two")),
            Question::new("Q2"),
            Question::new("Q3"),
        ])
        .with_answer("Q1", "A")
    }

    #[tokio::test]
    async fn generate_truncates_to_count() {
        let mock = sample();
        let payload = mock
            .generate_quiz(&QuizParams::new("Math", 2, Difficulty::A))
            .await
            .unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(mock.last_params().unwrap().count, 2);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn grades_against_answer_key() {
        let mock = sample();
        let right = mock
            .validate_answer(&QuestionId::from("Q1"), &Answer::from("A"))
            .await
            .unwrap();
        assert!(right.correct);

        let wrong = mock
            .validate_answer(&QuestionId::from("Q1"), &Answer::from("B"))
            .await
            .unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.explanation.as_deref(), Some("the correct answer is A"));

        let unknown = mock
            .validate_answer(&QuestionId::from("Q9"), &Answer::from("A"))
            .await
            .unwrap_err();
        assert_eq!(unknown.status(), Some(404));
    }

    #[tokio::test]
    async fn failing_mock_fails_everything() {
        let mock = MockQuizService::failing(QuizError::Transport("offline".into()));
        assert!(mock.fetch_subjects().await.is_err());
        assert!(mock.fetch_tags().await.is_err());
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn explanation_comes_from_question() {
        let mock = sample();
        let explanation = mock.get_explanation(&QuestionId::from("Q1")).await.unwrap();
        assert_eq!(explanation["explanation"], "two plus two");
    }
}
