//! Quiz service error types.
//!
//! These error types represent every way a call to the quiz service (or a read
//! of the subject cache) can fail. Defined in `quanta-core` so the exam session
//! can classify failures without string matching.

use thiserror::Error;

/// Errors that can occur when talking to the quiz service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// No HTTP response was obtained (connection refused, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a status outside `200..=299`.
    #[error("service error (HTTP {status} {status_text}){}", body_suffix(.body))]
    Service {
        status: u16,
        status_text: String,
        body: Option<String>,
    },

    /// A 2xx body that matches none of the accepted shapes.
    #[error("invalid response shape: {0}")]
    InvalidResponseShape(String),

    /// Durable storage held data that could not be parsed.
    #[error("cache parse error: {0}")]
    CacheParse(String),
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(b) if !b.is_empty() => format!(": {b}"),
        _ => String::new(),
    }
}

impl QuizError {
    /// Returns `true` if the failure happened while interpreting a response
    /// body rather than while obtaining one.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            QuizError::InvalidResponseShape(_) | QuizError::CacheParse(_)
        )
    }

    /// The HTTP status carried by a service error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            QuizError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
