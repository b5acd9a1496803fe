//! Error types for gemini_commit using thiserror.

use thiserror::Error;

/// Errors from git subprocess invocations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Failed to execute git command. Make sure git is installed and in PATH: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("Commit failed. Stage your changes first (git add).\n{stderr}")]
    CommitFailed { stderr: String },
}

/// Errors from the generative model API.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Request to the model API failed: {0}")]
    Transport(String),

    #[error("Model API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model API returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Response blocked by the model (reason: {reason}). Adjust the diff or prompt.")]
    Blocked { reason: String },

    #[error("Model returned an empty response{}", finish_note(.finish_reason))]
    EmptyResponse { finish_reason: Option<String> },

    #[error("Model request task failed: {0}")]
    TaskFailed(String),
}

fn finish_note(finish_reason: &Option<String>) -> String {
    match finish_reason {
        Some(reason) => format!(" (finish reason: {reason})"),
        None => String::new(),
    }
}

/// Errors from the interactive editor step.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Failed to create temporary message file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to launch editor '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read edited message back: {0}")]
    ReadBack(#[source] std::io::Error),
}

/// Errors from configuration loading and resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file as TOML: {0}")]
    ParseFailed(#[source] toml::de::Error),

    #[error(
        "Configuration error: 'prompt' field cannot be empty or whitespace-only. \
         Please provide a valid prompt template in {0}"
    )]
    EmptyPrompt(String),

    #[error("Configuration error: 'prompt' in {0} must contain the {{diff}} placeholder")]
    MissingDiffPlaceholder(String),

    #[error("Configuration error: max_diff_chars must be greater than zero")]
    ZeroDiffLimit,
}

/// Errors that abort a commit message run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Error calling Gemini: {0}")]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Empty diff. Nothing to describe.")]
    EmptyDiff,

    #[error("Set GOOGLE_API_KEY in .env or in the environment.")]
    MissingCredential,

    #[error("Empty message after editing.")]
    EmptyMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_error_mentions_reason() {
        let err = RunError::from(GenerateError::Blocked {
            reason: "SAFETY".to_string(),
        });

        let msg = err.to_string();
        assert!(msg.contains("SAFETY"));
        assert!(msg.starts_with("Error calling Gemini"));
    }

    #[test]
    fn test_empty_response_mentions_finish_reason_when_known() {
        let with_reason = GenerateError::EmptyResponse {
            finish_reason: Some("MAX_TOKENS".to_string()),
        };
        let without_reason = GenerateError::EmptyResponse {
            finish_reason: None,
        };

        assert_eq!(
            with_reason.to_string(),
            "Model returned an empty response (finish reason: MAX_TOKENS)"
        );
        assert_eq!(without_reason.to_string(), "Model returned an empty response");
    }

    #[test]
    fn test_commit_failed_suggests_staging() {
        let err = GitError::CommitFailed {
            stderr: "nothing added to commit".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("git add"));
        assert!(msg.contains("nothing added to commit"));
    }

    #[test]
    fn test_git_errors_pass_through_transparently() {
        let err = RunError::from(GitError::NotARepository("fatal: not a git repository".into()));
        assert_eq!(
            err.to_string(),
            "Not a git repository: fatal: not a git repository"
        );
    }
}
