//! quanta-client — the quiz service over HTTP.
//!
//! Implements `QuizService` on top of reqwest, plus configuration loading and
//! an in-memory mock for tests.

pub mod config;
pub mod http;
pub mod mock;

pub use config::{load_config, load_config_from, ClientConfig};
pub use http::HttpQuizService;
pub use mock::MockQuizService;
