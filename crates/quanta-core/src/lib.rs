//! quanta-core — exam session state machine, data model, and subject cache.
//!
//! This crate knows nothing about HTTP. Everything that talks to the quiz
//! backend goes through the [`traits::QuizService`] trait, which
//! `quanta-client` implements.

pub mod cache;
pub mod error;
pub mod model;
pub mod session;
pub mod shape;
pub mod store;
pub mod traits;

pub use cache::{SubjectCache, SUBJECTS_CACHE_KEY};
pub use error::QuizError;
pub use model::{Answer, Difficulty, Question, QuestionId, QuizParams, ValidationResult};
pub use session::{ExamSession, ExamSummary, FailureKind, SessionFailure, SessionStatus};
pub use shape::{QuizPayload, ResponseShape};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use traits::QuizService;
