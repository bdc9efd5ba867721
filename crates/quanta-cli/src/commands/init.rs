//! The `quanta init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quanta.toml").exists() {
        println!("quanta.toml already exists, skipping.");
    } else {
        std::fs::write("quanta.toml", SAMPLE_CONFIG)?;
        println!("Created quanta.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point base_url at your quiz service (or set QUANTA_API_BASE_URL)");
    println!("  2. Run: quanta subjects");
    println!("  3. Run: quanta take --subject <SUBJECT>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quanta configuration

base_url = "http://localhost:8080/api/v1"
timeout_secs = 30

# Subject list cache; defaults to ~/.cache/quanta
# cache_dir = "${HOME}/.cache/quanta"

# Shown when nothing is cached and the service is unreachable
fallback_subjects = []

default_count = 10
# A (Basic), B (Advanced), C (Expert), D (Master)
default_difficulty = "B"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config: quanta_client::ClientConfig = load_sample(SAMPLE_CONFIG);
        assert_eq!(config.default_count, 10);
        assert_eq!(config.timeout_secs, 30);
    }

    fn load_sample(content: &str) -> quanta_client::ClientConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quanta.toml");
        std::fs::write(&path, content).unwrap();
        quanta_client::load_config_from(Some(&path)).unwrap()
    }
}
