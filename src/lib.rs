//! Gemini Commit - Automatic Git Commit Message Generator
//!
//! This library generates conventional commit messages by sending a
//! repository's diff to Google Gemini, then commits with the result.
//!
//! # Modules
//!
//! - [`config`] - CLI, environment and TOML configuration resolution
//! - [`git`] - Git operations (root, diff, commit)
//! - [`diff`] - Secret filtering and size cap for diffs
//! - [`prompt`] - Prompt template rendering
//! - [`gemini`] - Gemini API client and response normalization
//! - [`output`] - Message post-processing and JSON output
//! - [`editor`] - Interactive editing through `$EDITOR`
//! - [`pipeline`] - The end-to-end run
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use gemini_commit::config::{CliOptions, Config, Env};
//! use gemini_commit::editor::ExternalEditor;
//! use gemini_commit::gemini::GeminiClient;
//! use gemini_commit::git::GitCli;
//! use gemini_commit::pipeline;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::resolve(&CliOptions::default(), &Env::from_process())?;
//! let git = GitCli::discover(&config).await?;
//! let model = GeminiClient::new(config.api_base.clone());
//! let editor = ExternalEditor::new(config.editor.clone());
//! let outcome = pipeline::run(&config, &git, &model, &editor).await?;
//! println!("Committed: {}", outcome.message);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diff;
pub mod editor;
pub mod error;
pub mod gemini;
pub mod git;
pub mod output;
pub mod pipeline;
pub mod prompt;

pub use error::{ConfigError, EditorError, GenerateError, GitError, RunError};
