//! The `quanta questions` command.

use std::path::PathBuf;

use anyhow::Result;

use quanta_core::QuizService;

pub async fn execute(query: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let pairs = match &query {
        Some(q) => parse_query(q)?,
        None => Vec::new(),
    };

    let (_, service) = super::connect(config_path.as_deref())?;
    let listing = service.list_questions(&pairs).await?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

/// Parse `key=value,key=value` into query pairs.
pub fn parse_query(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("invalid filter '{pair}', expected key=value"))?;
            anyhow::ensure!(!key.trim().is_empty(), "empty key in filter '{pair}'");
            Ok((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
