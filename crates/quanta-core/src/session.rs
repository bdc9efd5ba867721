//! Exam session state machine.
//!
//! One [`ExamSession`] drives one quiz attempt at a time: it loads a question
//! set through a [`QuizService`], records answers, asks the service to grade
//! them, and tracks where the user is in the quiz.
//!
//! States are `Idle -> Loading -> {Ready, Failed}`; both `Ready` and `Failed`
//! accept a new [`ExamSession::init_exam`]. Each load is tagged with a
//! generation number so that a response overtaken by a newer load is dropped
//! instead of clobbering the newer state.
//!
//! No operation here returns an error. Load failures surface through
//! [`ExamSession::status`] and [`ExamSession::last_error`]; grading and
//! explanation failures are logged and otherwise ignored.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{Answer, Question, QuestionId, QuizParams, ValidationResult};
use crate::traits::QuizService;

const PARSE_FAILURE_MESSAGE: &str = "failed to parse quiz: response format not recognized";
const SERVICE_FAILURE_MESSAGE: &str = "could not generate quiz; check the network or the quiz service";

/// Coarse lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Loading => write!(f, "loading"),
            SessionStatus::Ready => write!(f, "ready"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Whether a failed load could not be read or could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Parse,
    Service,
}

/// User-facing description of a failed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionFailure {
    fn from_error(err: &QuizError) -> Self {
        if err.is_parse_failure() {
            Self {
                kind: FailureKind::Parse,
                message: PARSE_FAILURE_MESSAGE.to_string(),
            }
        } else {
            Self {
                kind: FailureKind::Service,
                message: SERVICE_FAILURE_MESSAGE.to_string(),
            }
        }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Tally of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamSummary {
    pub attempt_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub answered: usize,
    pub checked: usize,
    pub correct: usize,
}

impl ExamSummary {
    /// Fraction of checked answers that were correct.
    pub fn accuracy(&self) -> f64 {
        if self.checked == 0 {
            0.0
        } else {
            self.correct as f64 / self.checked as f64
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    questions: Vec<Question>,
    answers: HashMap<QuestionId, Answer>,
    results: HashMap<QuestionId, ValidationResult>,
    visited: HashSet<QuestionId>,
    position: usize,
    loading: bool,
    loaded: bool,
    error: Option<SessionFailure>,
    generation: u64,
    attempt_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        if self.loading {
            SessionStatus::Loading
        } else if self.error.is_some() {
            SessionStatus::Failed
        } else if self.loaded {
            SessionStatus::Ready
        } else {
            SessionStatus::Idle
        }
    }

    fn current(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    fn is_last(&self) -> bool {
        !self.questions.is_empty() && self.position == self.questions.len() - 1
    }

    fn mark_visited(&mut self) {
        if let Some(id) = self.current().map(|q| q.id.clone()) {
            self.visited.insert(id);
        }
    }

    fn reset_attempt(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.results.clear();
        self.visited.clear();
        self.position = 0;
        self.error = None;
        self.attempt_id = Some(Uuid::new_v4());
        self.started_at = Some(Utc::now());
    }
}

/// Clears the loading flag if `init_exam` is dropped before its load lands.
struct CancelLoad<'a> {
    session: &'a ExamSession,
    generation: u64,
}

impl Drop for CancelLoad<'_> {
    fn drop(&mut self) {
        let mut state = self.session.state();
        if state.generation == self.generation && state.loading {
            tracing::debug!(generation = self.generation, "quiz load cancelled");
            state.loading = false;
        }
    }
}

/// State machine for one quiz attempt.
pub struct ExamSession {
    service: Arc<dyn QuizService>,
    state: Mutex<SessionState>,
}

impl ExamSession {
    pub fn new(service: Arc<dyn QuizService>) -> Self {
        Self {
            service,
            state: Mutex::new(SessionState::default()),
        }
    }

    // The lock is never held across an await, so a poisoned guard still
    // holds consistent state.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new attempt, discarding everything from the previous one.
    ///
    /// Resolves once the quiz is loaded or the load has failed. If another
    /// `init_exam` starts before this one resolves, this call's result is
    /// dropped. Dropping the future mid-load leaves the session `Idle`.
    #[instrument(skip(self, params), fields(subject = %params.subject, count = params.count))]
    pub async fn init_exam(&self, params: &QuizParams) {
        let generation = {
            let mut state = self.state();
            state.generation += 1;
            state.loading = true;
            state.loaded = false;
            state.reset_attempt();
            state.generation
        };
        let _cancel = CancelLoad {
            session: self,
            generation,
        };

        let outcome = self.service.generate_quiz(params).await;

        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!(
                "discarding quiz from generation {generation}, session is at {}",
                state.generation
            );
            return;
        }

        state.loading = false;
        state.loaded = true;
        match outcome {
            Ok(payload) => {
                tracing::debug!(
                    shape = ?payload.shape(),
                    questions = payload.len(),
                    "quiz loaded"
                );
                if payload.is_empty() {
                    tracing::info!("service returned an empty quiz");
                }
                state.questions = payload.into_questions();
                state.mark_visited();
            }
            Err(e) => {
                tracing::warn!("quiz generation failed: {e}");
                state.error = Some(SessionFailure::from_error(&e));
            }
        }
    }

    /// Record the user's answer for a question, replacing any earlier one.
    pub fn set_answer(&self, question_id: impl Into<QuestionId>, answer: impl Into<Answer>) {
        self.state()
            .answers
            .insert(question_id.into(), answer.into());
    }

    /// Grade the answer recorded for the current question.
    ///
    /// Returns `None` without calling the service when the current question
    /// has no (or a blank) answer. Service failures are logged and also yield
    /// `None`; the session status is never changed.
    pub async fn check_current_answer(&self) -> Option<ValidationResult> {
        let (generation, question_id, answer) = {
            let state = self.state();
            let question = state.current()?;
            let answer = state
                .answers
                .get(&question.id)
                .filter(|a| !a.is_blank())?
                .clone();
            (state.generation, question.id.clone(), answer)
        };

        self.validate(generation, question_id, answer).await
    }

    /// Grade every answered question that has no result yet, concurrently.
    ///
    /// Returns how many results were stored.
    pub async fn check_all_answers(&self) -> usize {
        let (generation, pending) = {
            let state = self.state();
            let pending: Vec<(QuestionId, Answer)> = state
                .questions
                .iter()
                .filter(|q| !state.results.contains_key(&q.id))
                .filter_map(|q| {
                    state
                        .answers
                        .get(&q.id)
                        .filter(|a| !a.is_blank())
                        .map(|a| (q.id.clone(), a.clone()))
                })
                .collect();
            (state.generation, pending)
        };

        let mut checks: FuturesUnordered<_> = pending
            .into_iter()
            .map(|(id, answer)| self.validate(generation, id, answer))
            .collect();

        let mut stored = 0;
        while let Some(result) = checks.next().await {
            if result.is_some() {
                stored += 1;
            }
        }
        stored
    }

    async fn validate(
        &self,
        generation: u64,
        question_id: QuestionId,
        answer: Answer,
    ) -> Option<ValidationResult> {
        match self.service.validate_answer(&question_id, &answer).await {
            Ok(result) => {
                let mut state = self.state();
                if state.generation != generation {
                    tracing::debug!(question = %question_id, "dropping result from a previous attempt");
                    return None;
                }
                state.results.insert(question_id, result.clone());
                Some(result)
            }
            Err(e) => {
                tracing::warn!(question = %question_id, "answer validation failed: {e}");
                None
            }
        }
    }

    /// Fetch the explanation of the current question.
    pub async fn explain_current(&self) -> Option<Value> {
        let question_id = self.state().current().map(|q| q.id.clone())?;
        match self.service.get_explanation(&question_id).await {
            Ok(explanation) => Some(explanation),
            Err(e) => {
                tracing::warn!(question = %question_id, "explanation request failed: {e}");
                None
            }
        }
    }

    /// Advance one question; no-op on the last one.
    pub fn next_question(&self) {
        let mut state = self.state();
        if !state.questions.is_empty() && !state.is_last() {
            state.position += 1;
            state.mark_visited();
        }
    }

    /// Go back one question; no-op on the first one.
    pub fn previous_question(&self) {
        let mut state = self.state();
        if state.position > 0 {
            state.position -= 1;
            state.mark_visited();
        }
    }

    /// Move straight to `index`. Out-of-range indices are ignored.
    pub fn jump_to(&self, index: usize) -> bool {
        let mut state = self.state();
        if index >= state.questions.len() {
            return false;
        }
        state.position = index;
        state.mark_visited();
        true
    }

    pub fn status(&self) -> SessionStatus {
        self.state().status()
    }

    /// Why the last load failed; `None` unless the status is `Failed`.
    pub fn last_error(&self) -> Option<SessionFailure> {
        self.state().error.clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.state().questions.clone()
    }

    pub fn len(&self) -> usize {
        self.state().questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().questions.is_empty()
    }

    pub fn position(&self) -> usize {
        self.state().position
    }

    pub fn current_question(&self) -> Option<Question> {
        self.state().current().cloned()
    }

    /// `(position + 1) / len`, or 0 for an empty quiz.
    pub fn progress_fraction(&self) -> f64 {
        let state = self.state();
        if state.questions.is_empty() {
            0.0
        } else {
            (state.position + 1) as f64 / state.questions.len() as f64
        }
    }

    pub fn is_first(&self) -> bool {
        self.state().position == 0
    }

    pub fn is_last(&self) -> bool {
        self.state().is_last()
    }

    pub fn answer(&self, question_id: &QuestionId) -> Option<Answer> {
        self.state().answers.get(question_id).cloned()
    }

    pub fn result(&self, question_id: &QuestionId) -> Option<ValidationResult> {
        self.state().results.get(question_id).cloned()
    }

    pub fn is_visited(&self, question_id: &QuestionId) -> bool {
        self.state().visited.contains(question_id)
    }

    pub fn summary(&self) -> ExamSummary {
        let state = self.state();
        let ids: HashSet<&QuestionId> = state.questions.iter().map(|q| &q.id).collect();
        let answered = state
            .answers
            .iter()
            .filter(|(id, a)| ids.contains(id) && !a.is_blank())
            .count();
        let checked = state.results.keys().filter(|id| ids.contains(id)).count();
        let correct = state
            .results
            .iter()
            .filter(|(id, r)| ids.contains(id) && r.correct)
            .count();

        ExamSummary {
            attempt_id: state.attempt_id,
            started_at: state.started_at,
            total: state.questions.len(),
            answered,
            checked,
            correct,
        }
    }
}
