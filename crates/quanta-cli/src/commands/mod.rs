pub mod explain;
pub mod init;
pub mod questions;
pub mod subjects;
pub mod tags;
pub mod take;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use quanta_client::{load_config_from, ClientConfig, HttpQuizService};

/// Load config and build the HTTP service it points at.
pub fn connect(config_path: Option<&Path>) -> Result<(ClientConfig, Arc<HttpQuizService>)> {
    let config = load_config_from(config_path)?;
    let service = HttpQuizService::from_config(&config)?;
    tracing::debug!(base_url = service.base_url(), "using quiz service");
    Ok((config, Arc::new(service)))
}
