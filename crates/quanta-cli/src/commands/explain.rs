//! The `quanta explain` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use quanta_core::{QuestionId, QuizService};

pub async fn execute(id: String, config_path: Option<PathBuf>) -> Result<()> {
    let (_, service) = super::connect(config_path.as_deref())?;
    let question_id = parse_id(&id);

    let explanation = service
        .get_explanation(&question_id)
        .await
        .with_context(|| format!("failed to fetch explanation for {question_id}"))?;

    match explanation {
        Value::Null => println!("No explanation available for {question_id}."),
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }

    Ok(())
}

/// Ids go into the request path as typed; `007` stays `007`.
pub fn parse_id(raw: &str) -> QuestionId {
    QuestionId::from(raw.trim())
}
