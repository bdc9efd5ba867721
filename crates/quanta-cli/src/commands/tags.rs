//! The `quanta tags` command.

use std::path::PathBuf;

use anyhow::Result;

use quanta_core::QuizService;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let (_, service) = super::connect(config_path.as_deref())?;
    let tags = service.fetch_tags().await?;
    println!("{}", serde_json::to_string_pretty(&tags)?);
    Ok(())
}
