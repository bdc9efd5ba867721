//! HTTP implementation of the quiz service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::instrument;

use quanta_core::error::QuizError;
use quanta_core::model::{
    Answer, QuestionId, QuizParams, SubjectList, ValidateRequest, ValidationResult,
};
use quanta_core::shape::QuizPayload;
use quanta_core::traits::QuizService;

use crate::config::ClientConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Quiz service reached over its JSON HTTP API.
pub struct HttpQuizService {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpQuizService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuizError> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuizError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
            client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, QuizError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send one request: POST with a JSON body when `body` is given, GET
    /// otherwise. A 204 yields `Value::Null`.
    async fn call(&self, url: &str, body: Option<Value>) -> Result<Value, QuizError> {
        let request = match &body {
            Some(_) => self.client.post(url),
            None => self.client.get(url),
        }
        .header(CONTENT_TYPE, "application/json");
        let request = match &body {
            Some(b) => request.json(b),
            None => request,
        };

        let method = if body.is_some() { "POST" } else { "GET" };
        tracing::debug!(%url, method, "quiz request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                QuizError::Transport(format!("request timed out after {}s", self.timeout_secs))
            } else if e.is_connect() {
                QuizError::Transport(format!(
                    "quiz service not reachable at {}. Is it running?",
                    self.base_url
                ))
            } else {
                QuizError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            let err = QuizError::Service {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            };
            tracing::debug!(%url, "quiz request failed: {err}");
            return Err(err);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| QuizError::Transport(format!("failed to read response: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| QuizError::InvalidResponseShape(format!("body is not JSON: {e}")))
    }
}

fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, QuizError> {
    serde_json::from_value(value)
        .map_err(|e| QuizError::InvalidResponseShape(format!("unexpected {what} response: {e}")))
}

#[async_trait]
impl QuizService for HttpQuizService {
    #[instrument(skip(self))]
    async fn fetch_subjects(&self) -> Result<Vec<String>, QuizError> {
        let value = self.call(&self.url("/meta/subjects"), None).await?;
        decode::<SubjectList>("subjects", value).map(SubjectList::into_vec)
    }

    #[instrument(skip(self))]
    async fn fetch_tags(&self) -> Result<Value, QuizError> {
        self.call(&self.url("/meta/tags"), None).await
    }

    #[instrument(skip(self, params), fields(subject = %params.subject, count = params.count))]
    async fn generate_quiz(&self, params: &QuizParams) -> Result<QuizPayload, QuizError> {
        let value = self
            .call(&self.url("/quiz/generate"), Some(json!(params)))
            .await?;
        QuizPayload::from_value(value)
    }

    #[instrument(skip(self, answer), fields(question = %question_id))]
    async fn validate_answer(
        &self,
        question_id: &QuestionId,
        answer: &Answer,
    ) -> Result<ValidationResult, QuizError> {
        let body = json!(ValidateRequest {
            question_id,
            user_answer: answer,
        });
        let value = self.call(&self.url("/quiz/validate"), Some(body)).await?;
        decode("validation", value)
    }

    #[instrument(skip(self), fields(question = %question_id))]
    async fn get_explanation(&self, question_id: &QuestionId) -> Result<Value, QuizError> {
        self.call(&self.url(&format!("/quiz/{question_id}/explanation")), None)
            .await
    }

    #[instrument(skip(self))]
    async fn list_questions(&self, query: &[(String, String)]) -> Result<Value, QuizError> {
        let url = reqwest::Url::parse_with_params(&self.url("/questions"), query)
            .map_err(|e| QuizError::Transport(format!("invalid question listing url: {e}")))?;
        self.call(url.as_str(), None).await
    }
}
