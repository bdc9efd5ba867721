//! Subject list cache: stale read first, then a best-effort refresh.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::QuizError;
use crate::store::KeyValueStore;
use crate::traits::QuizService;

/// Storage key of the cached subject list.
pub const SUBJECTS_CACHE_KEY: &str = "quanta_subjects";

/// Counts one running refresh; released on completion or cancellation.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Subject names, served from durable storage and refreshed from the service.
pub struct SubjectCache {
    service: Arc<dyn QuizService>,
    store: Arc<dyn KeyValueStore>,
    fallback: Vec<String>,
    subjects: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
}

impl SubjectCache {
    pub fn new(service: Arc<dyn QuizService>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            service,
            store,
            fallback: Vec::new(),
            subjects: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Subjects to show when nothing is cached and the service is down.
    pub fn with_fallback(mut self, fallback: Vec<String>) -> Self {
        self.fallback = fallback;
        self
    }

    fn current(&self) -> MutexGuard<'_, Vec<String>> {
        self.subjects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current subject list (possibly stale, possibly empty).
    pub fn subjects(&self) -> Vec<String> {
        self.current().clone()
    }

    /// Whether any refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Publish the stored list, if any, then refresh from the service.
    ///
    /// Returns the list as it stands after the refresh.
    pub async fn load(&self) -> Vec<String> {
        match self.read_stored() {
            Ok(Some(stored)) => {
                tracing::debug!(count = stored.len(), "using cached subjects");
                *self.current() = stored;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("ignoring subject cache: {e}"),
        }

        self.refresh().await;
        self.subjects()
    }

    fn read_stored(&self) -> Result<Option<Vec<String>>, QuizError> {
        let raw = match self.store.get(SUBJECTS_CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => return Err(QuizError::CacheParse(format!("{e:#}"))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| QuizError::CacheParse(e.to_string()))
    }

    /// Fetch the list from the service and write it through to storage.
    ///
    /// On failure the current list is kept; if it is still empty the fallback
    /// list takes its place. Returns `true` when fresh data was published.
    pub async fn refresh(&self) -> bool {
        let outcome = {
            let _in_flight = InFlight::enter(&self.in_flight);
            self.service.fetch_subjects().await
        };

        match outcome {
            Ok(subjects) => {
                match serde_json::to_string(&subjects) {
                    Ok(encoded) => {
                        if let Err(e) = self.store.set(SUBJECTS_CACHE_KEY, &encoded) {
                            tracing::warn!("failed to persist subjects: {e:#}");
                        }
                    }
                    Err(e) => tracing::warn!("failed to encode subjects: {e}"),
                }
                *self.current() = subjects;
                true
            }
            Err(e) => {
                tracing::warn!("subject refresh failed: {e}");
                let mut current = self.current();
                if current.is_empty() && !self.fallback.is_empty() {
                    *current = self.fallback.clone();
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicU32;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::model::{Answer, QuestionId, QuizParams, ValidationResult};
    use crate::shape::QuizPayload;
    use crate::store::MemoryStore;

    struct SubjectService {
        subjects: Option<Vec<String>>,
        hang: bool,
        calls: AtomicU32,
    }

    impl SubjectService {
        fn returning(subjects: &[&str]) -> Self {
            Self {
                subjects: Some(subjects.iter().map(|s| s.to_string()).collect()),
                hang: false,
                calls: AtomicU32::new(0),
            }
        }

        fn down() -> Self {
            Self {
                subjects: None,
                hang: false,
                calls: AtomicU32::new(0),
            }
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::down()
            }
        }
    }

    #[async_trait]
    impl QuizService for SubjectService {
        async fn fetch_subjects(&self) -> Result<Vec<String>, QuizError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                futures::future::pending::<()>().await;
            }
            self.subjects
                .clone()
                .ok_or_else(|| QuizError::Transport("connection refused".into()))
        }

        async fn fetch_tags(&self) -> Result<Value, QuizError> {
            unimplemented!()
        }

        async fn generate_quiz(&self, _: &QuizParams) -> Result<QuizPayload, QuizError> {
            unimplemented!()
        }

        async fn validate_answer(
            &self,
            _: &QuestionId,
            _: &Answer,
        ) -> Result<ValidationResult, QuizError> {
            unimplemented!()
        }

        async fn get_explanation(&self, _: &QuestionId) -> Result<Value, QuizError> {
            unimplemented!()
        }

        async fn list_questions(&self, _: &[(String, String)]) -> Result<Value, QuizError> {
            unimplemented!()
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn load_refreshes_and_writes_through() {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(SubjectService::returning(&["Math", "Physics"]));
        let cache = SubjectCache::new(service.clone(), store.clone());

        let subjects = cache.load().await;
        assert_eq!(subjects, strings(&["Math", "Physics"]));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.get(SUBJECTS_CACHE_KEY).unwrap().as_deref(),
            Some(r#"["Math","Physics"]"#)
        );
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn stale_value_survives_failed_refresh() {
        let store = Arc::new(MemoryStore::new());
        store.set(SUBJECTS_CACHE_KEY, r#"["Cached"]"#).unwrap();
        let cache = SubjectCache::new(Arc::new(SubjectService::down()), store.clone())
            .with_fallback(strings(&["Fallback"]));

        assert_eq!(cache.load().await, strings(&["Cached"]));
        assert_eq!(
            store.get(SUBJECTS_CACHE_KEY).unwrap().as_deref(),
            Some(r#"["Cached"]"#)
        );
    }

    #[tokio::test]
    async fn fallback_only_when_empty() {
        let cache = SubjectCache::new(
            Arc::new(SubjectService::down()),
            Arc::new(MemoryStore::new()),
        )
        .with_fallback(strings(&["Math"]));

        assert!(!cache.refresh().await);
        assert_eq!(cache.subjects(), strings(&["Math"]));
    }

    #[tokio::test]
    async fn no_fallback_leaves_list_empty() {
        let cache = SubjectCache::new(
            Arc::new(SubjectService::down()),
            Arc::new(MemoryStore::new()),
        );
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_cache_is_treated_as_miss() {
        let store = Arc::new(MemoryStore::new());
        store.set(SUBJECTS_CACHE_KEY, "{not json").unwrap();
        let cache = SubjectCache::new(Arc::new(SubjectService::down()), store.clone());

        assert!(matches!(
            cache.read_stored(),
            Err(QuizError::CacheParse(_))
        ));
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn every_load_refreshes_once() {
        let service = Arc::new(SubjectService::returning(&["Math"]));
        let cache = SubjectCache::new(service.clone(), Arc::new(MemoryStore::new()));
        cache.load().await;
        cache.load().await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn loading_tracks_every_refresh_in_flight() {
        let cache = SubjectCache::new(
            Arc::new(SubjectService::hanging()),
            Arc::new(MemoryStore::new()),
        );

        let mut first = Box::pin(cache.refresh());
        let mut second = Box::pin(cache.refresh());
        assert!(futures::poll!(&mut first).is_pending());
        assert!(futures::poll!(&mut second).is_pending());
        assert!(cache.is_loading());

        drop(first);
        assert!(cache.is_loading());
        drop(second);
        assert!(!cache.is_loading());
    }
}
