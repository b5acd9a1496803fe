//! CLI tool to generate git commit messages using Gemini
//!
//! This tool reads the staged (or unstaged) git diff, asks Gemini for a
//! conventional commit subject line, lets the user edit it and commits.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gemini_commit::{
    config::{CliOptions, Config, Env},
    editor::ExternalEditor,
    gemini::GeminiClient,
    git::GitCli,
    output::CommitMessage,
    pipeline,
};

/// Environment variable holding the tracing filter
const LOG_ENV_VAR: &str = "AICOMMIT_LOG";

/// Command-line arguments
#[derive(Parser)]
#[command(name = "gemini_commit")]
#[command(about = "Generate a commit message with Gemini from the git diff", long_about = None)]
#[command(version)]
struct Args {
    /// Use the unstaged diff (the staged diff is used by default)
    #[arg(long)]
    unstaged: bool,

    /// Conventional Commit type (feat, fix, chore, refactor, docs, test, perf, build, ci, style) [default: chore]
    #[arg(long = "type", value_name = "TYPE")]
    commit_type: Option<String>,

    /// Message language (e.g. pt-BR or en) [default: pt-BR]
    #[arg(long)]
    lang: Option<String>,

    /// Do not open the editor; commit the suggestion directly
    #[arg(long)]
    no_edit: bool,

    /// Gemini model (defaults to $GEMINI_MODEL, then gemini-1.5-flash)
    #[arg(long)]
    model: Option<String>,

    /// Only print the message, do not run git commit
    #[arg(long)]
    print_only: bool,

    /// Print the message as JSON (implies --print-only and --no-edit)
    #[arg(long)]
    json: bool,

    /// Path to an optional configuration file (TOML format)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl From<Args> for CliOptions {
    fn from(args: Args) -> Self {
        Self {
            unstaged: args.unstaged,
            commit_type: args.commit_type,
            lang: args.lang,
            no_edit: args.no_edit,
            model: args.model,
            print_only: args.print_only,
            json: args.json,
            config_path: args.config,
        }
    }
}

/// Main entry point
///
/// # Process flow
///
/// 1. Load `.env`, parse arguments and resolve configuration
/// 2. Resolve the repository root
/// 3. Read, sanitize and cap the diff
/// 4. Generate the message with Gemini (with spinner display)
/// 5. Let the user edit it
/// 6. Print it, or run git commit
///
/// Any error exits with status 1.
fn main() -> Result<()> {
    // Variables already set in the environment win over .env. Loaded while
    // the process is still single-threaded, before any runtime worker exists.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = &dotenv {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {}", e);
        }
    }

    let cli = CliOptions::from(Args::parse());
    let config = Config::resolve(&cli, &Env::from_process()).context("Invalid configuration")?;
    tracing::debug!(?config, "resolved configuration");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?
        .block_on(run(config))
}

/// Resolve the repository, run the pipeline and print the outcome
async fn run(config: Config) -> Result<()> {
    let git = GitCli::discover(&config).await?;
    let model = GeminiClient::new(config.api_base.clone());
    let editor = ExternalEditor::new(config.editor.clone());

    let outcome = pipeline::run(&config, &git, &model, &editor).await?;

    if config.json {
        let output = CommitMessage {
            message: outcome.message,
            truncated: outcome.truncated,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if outcome.committed {
        println!("Commit created: {}", outcome.message);
    } else {
        println!("{}", outcome.message);
    }

    Ok(())
}
