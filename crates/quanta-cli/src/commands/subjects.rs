//! The `quanta subjects` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use quanta_core::{FileStore, SubjectCache};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let (config, service) = super::connect(config_path.as_deref())?;

    let store = Arc::new(FileStore::new(&config.cache_dir));
    tracing::debug!(cache_dir = %store.dir().display(), "subject cache");
    let cache = SubjectCache::new(service, store).with_fallback(config.fallback_subjects.clone());

    let subjects = cache.load().await;
    if subjects.is_empty() {
        println!("No subjects available. Is the quiz service running at {}?", config.base_url);
        return Ok(());
    }

    for subject in &subjects {
        println!("{subject}");
    }

    Ok(())
}
