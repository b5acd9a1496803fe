//! The commit message run: diff in, commit out
//!
//! Every step is awaited before the next one starts and any error ends the
//! run. Collaborators come in through the [`Vcs`], [`TextModel`] and
//! [`MessageEditor`] traits.

use std::io::IsTerminal;
use tracing::{info, warn};

use crate::config::Config;
use crate::diff::PreparedDiff;
use crate::editor::MessageEditor;
use crate::error::RunError;
use crate::gemini::TextModel;
use crate::git::Vcs;
use crate::output::{collapse_lines, post_process, with_spinner};
use crate::prompt::build_prompt;

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Final single-line message
    pub message: String,
    /// Whether the diff was cut before generation
    pub truncated: bool,
    /// Whether `git commit` was run
    pub committed: bool,
}

/// Generate a commit message and, unless `print_only` is set, commit with it
///
/// # Errors
///
/// * `RunError::EmptyDiff` when there is nothing to describe
/// * `RunError::MissingCredential` when no API key is configured
/// * `RunError::EmptyMessage` when the edited message is blank
/// * git, model and editor failures
pub async fn run<V, M, E>(
    config: &Config,
    vcs: &V,
    model: &M,
    editor: &E,
) -> Result<Outcome, RunError>
where
    V: Vcs + ?Sized,
    M: TextModel + ?Sized,
    E: MessageEditor + ?Sized,
{
    if config.staged {
        match vcs.staged_files().await {
            Ok(files) if files.is_empty() => {
                notice(config, "No files staged. Hint: git add -A (or use --unstaged).");
            }
            Ok(files) => info!(count = files.len(), "staged files"),
            Err(e) => warn!("Could not list staged files: {}", e),
        }
    }

    let raw_diff = vcs.diff(config.staged).await?;
    if raw_diff.trim().is_empty() {
        return Err(RunError::EmptyDiff);
    }

    let diff = PreparedDiff::new(&raw_diff, config.max_diff_chars);
    if diff.truncated {
        warn!(
            max_chars = config.max_diff_chars,
            "diff exceeds the character limit and was truncated"
        );
    }

    let prompt = build_prompt(config, &diff.text);

    let api_key = config
        .api_key
        .as_deref()
        .ok_or(RunError::MissingCredential)?;

    let request = model.generate(api_key, &config.model, &prompt);
    let generated = if !config.json && std::io::stdout().is_terminal() {
        with_spinner("Gemini is generating...", request).await?
    } else {
        request.await?
    };

    let suggested = post_process(&generated, diff.truncated);

    if !config.json {
        println!("\n--- Suggested message ---");
        println!("{}", suggested);
        println!("-------------------------\n");
    }

    let message = if config.edit {
        collapse_lines(&editor.edit(&suggested).await?)
    } else {
        suggested
    };

    if message.is_empty() {
        return Err(RunError::EmptyMessage);
    }

    if config.print_only {
        return Ok(Outcome {
            message,
            truncated: diff.truncated,
            committed: false,
        });
    }

    let git_output = vcs.commit(&message).await?;
    info!(output = git_output.trim(), "commit created");

    Ok(Outcome {
        message,
        truncated: diff.truncated,
        committed: true,
    })
}

/// Informational message that does not change control flow.
/// Goes to stderr in JSON mode so stdout stays machine readable.
fn notice(config: &Config, text: &str) {
    if config.json {
        eprintln!("{}", text);
    } else {
        println!("{}", text);
    }
}
