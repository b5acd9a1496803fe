//! Interactive editing of the suggested commit message
//!
//! The message is written to a scratch file, the user's editor is run on it,
//! and whatever the file holds once the editor exits is taken as the result.

use async_trait::async_trait;
use std::io::Write;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::EditorError;

/// Lets the user revise a message before it is committed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageEditor: Send + Sync {
    /// Return the revised message text.
    async fn edit(&self, text: &str) -> Result<String, EditorError>;
}

/// Editor launched as an external process (`$EDITOR`, then `$VISUAL`)
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: Option<Vec<String>>,
}

impl ExternalEditor {
    /// `command` is the editor argv; the file path is appended as the last argument.
    /// `None` (or an empty argv) disables editing.
    pub fn new(command: Option<Vec<String>>) -> Self {
        Self {
            command: command.filter(|argv| !argv.is_empty()),
        }
    }
}

#[async_trait]
impl MessageEditor for ExternalEditor {
    async fn edit(&self, text: &str) -> Result<String, EditorError> {
        let Some((program, args)) = self.command.as_ref().and_then(|c| c.split_first()) else {
            debug!("no editor configured, keeping message as is");
            return Ok(text.to_string());
        };

        let mut file = tempfile::Builder::new()
            .prefix("COMMIT_MSG_")
            .suffix(".tmp")
            .tempfile()
            .map_err(EditorError::TempFile)?;
        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .map_err(EditorError::TempFile)?;

        // Close our handle before the editor opens the file. The path is
        // removed when `path` drops, on every return below.
        let path = file.into_temp_path();

        debug!(program = %program, path = %path.display(), "launching editor");
        let status = Command::new(program)
            .args(args)
            .arg(&*path)
            .status()
            .await
            .map_err(|source| EditorError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            warn!(code = ?status.code(), "editor exited unsuccessfully, reading message anyway");
        }

        let bytes = tokio::fs::read(&*path).await.map_err(EditorError::ReadBack)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Write an executable shell script standing in for an editor
    fn fake_editor(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake_editor.sh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn argv(parts: &[&str]) -> Option<Vec<String>> {
        Some(parts.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_no_editor_returns_text_unchanged() {
        let editor = ExternalEditor::new(None);

        let result = editor.edit("feat: keep me").await.unwrap();

        assert_eq!(result, "feat: keep me");
    }

    #[tokio::test]
    async fn test_empty_argv_disables_editing() {
        let editor = ExternalEditor::new(Some(Vec::new()));
        assert_eq!(editor.edit("x").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_editor_rewrites_file() {
        // Arrange - "editor" overwrites the file given as its last argument
        let dir = TempDir::new().unwrap();
        let script = fake_editor(dir.path(), r#"printf 'fix: edited by user\n' > "$1""#);
        let editor = ExternalEditor::new(argv(&[script.to_str().unwrap()]));

        // Act
        let result = editor.edit("fix: original").await.unwrap();

        // Assert
        assert_eq!(result, "fix: edited by user\n");
    }

    #[tokio::test]
    async fn test_editor_args_come_before_path() {
        // Arrange - script writes its first arg into the file named by its second
        let dir = TempDir::new().unwrap();
        let script = fake_editor(dir.path(), r#"printf '%s' "$1" > "$2""#);
        let editor = ExternalEditor::new(argv(&[script.to_str().unwrap(), "--wait"]));

        // Act
        let result = editor.edit("ignored").await.unwrap();

        // Assert
        assert_eq!(result, "--wait");
    }

    #[tokio::test]
    async fn test_failing_editor_still_reads_file() {
        // Arrange - editor changes the file then exits non-zero
        let dir = TempDir::new().unwrap();
        let script = fake_editor(dir.path(), r#"printf 'chore: partial' > "$1"; exit 3"#);
        let editor = ExternalEditor::new(argv(&[script.to_str().unwrap()]));

        // Act
        let result = editor.edit("chore: start").await.unwrap();

        // Assert
        assert_eq!(result, "chore: partial");
    }

    #[tokio::test]
    async fn test_temp_file_removed_after_edit() {
        // Arrange - editor records the path it was given
        let dir = TempDir::new().unwrap();
        let record = dir.path().join("seen_path");
        let script = fake_editor(
            dir.path(),
            &format!(r#"printf '%s' "$1" > "{}""#, record.display()),
        );
        let editor = ExternalEditor::new(argv(&[script.to_str().unwrap()]));

        // Act
        let result = editor.edit("docs: readme").await.unwrap();

        // Assert - content untouched, scratch file gone
        assert_eq!(result, "docs: readme");
        let seen = fs::read_to_string(&record).unwrap();
        assert!(seen.ends_with(".tmp"));
        assert!(!Path::new(&seen).exists());
    }

    #[tokio::test]
    async fn test_temp_file_removed_when_read_back_fails() {
        // Arrange - editor deletes the file it was asked to edit
        let dir = TempDir::new().unwrap();
        let record = dir.path().join("seen_path");
        let script = fake_editor(
            dir.path(),
            &format!(r#"printf '%s' "$1" > "{}"; rm -f "$1""#, record.display()),
        );
        let editor = ExternalEditor::new(argv(&[script.to_str().unwrap()]));

        // Act
        let result = editor.edit("test: x").await;

        // Assert
        assert!(matches!(result, Err(EditorError::ReadBack(_))));
        let seen = fs::read_to_string(&record).unwrap();
        assert!(!Path::new(&seen).exists());
    }

    #[tokio::test]
    async fn test_missing_editor_binary() {
        let editor = ExternalEditor::new(argv(&["/definitely/not/an/editor"]));

        let result = editor.edit("x").await;

        assert!(matches!(result, Err(EditorError::SpawnFailed { .. })));
    }
}
