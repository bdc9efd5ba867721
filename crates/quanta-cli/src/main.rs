//! quanta CLI — take generated quizzes from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quanta", version, about = "Terminal client for the quanta quiz service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List subjects (cached, then refreshed from the service)
    Subjects {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show tag metadata
    Tags {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate a quiz and take it interactively
    Take {
        /// Subject to draw questions from
        #[arg(long)]
        subject: String,

        /// Number of questions (presets: 5, 10, 15, 20, 50)
        #[arg(long)]
        count: Option<u32>,

        /// Difficulty: A (Basic), B (Advanced), C (Expert), D (Master)
        #[arg(long)]
        difficulty: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the explanation of one question
    Explain {
        /// Question id
        #[arg(long)]
        id: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List questions in the bank
    Questions {
        /// Filters as comma-separated key=value pairs (e.g. "subject=Math,page=2")
        #[arg(long)]
        query: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quanta=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Subjects { config } => commands::subjects::execute(config).await,
        Commands::Tags { config } => commands::tags::execute(config).await,
        Commands::Take {
            subject,
            count,
            difficulty,
            config,
        } => commands::take::execute(subject, count, difficulty, config).await,
        Commands::Explain { id, config } => commands::explain::execute(id, config).await,
        Commands::Questions { query, config } => commands::questions::execute(query, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
