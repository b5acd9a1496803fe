//! Git operations for commit message generation
//!
//! This module shells out to the system `git` binary:
//! - Resolve the repository root
//! - List staged files and read diffs
//! - Create the commit

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::GitError;

/// Flags for a zero-context, colorless, text-mode unified diff
const DIFF_FLAGS: [&str; 4] = ["--no-color", "--unified=0", "--no-ext-diff", "--text"];

/// Version control operations the pipeline needs.
///
/// This abstraction allows mocking git in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Paths of files currently staged.
    async fn staged_files(&self) -> Result<Vec<String>, GitError>;

    /// Unified diff of staged (`true`) or unstaged (`false`) changes.
    async fn diff(&self, staged: bool) -> Result<String, GitError>;

    /// Commit the staged changes with exactly `message`; returns git's output.
    async fn commit(&self, message: &str) -> Result<String, GitError>;
}

/// [`Vcs`] backed by the `git` command line, rooted at the work tree top level
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    env: Vec<(String, String)>,
}

impl GitCli {
    /// Find the repository containing the current directory
    ///
    /// Runs `git rev-parse --show-toplevel`.
    ///
    /// # Errors
    ///
    /// * `GitError::NotARepository` if not inside a work tree
    /// * `GitError::SpawnFailed` if git cannot be executed
    pub async fn discover(config: &Config) -> Result<Self, GitError> {
        Self::discover_from(Path::new("."), config).await
    }

    /// Like [`GitCli::discover`], starting from `dir`
    pub async fn discover_from(dir: &Path, config: &Config) -> Result<Self, GitError> {
        let output = git_command(dir, &config.git_env)
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .await
            .map_err(GitError::SpawnFailed)?;

        if !output.status.success() {
            return Err(GitError::NotARepository(stderr_of(&output)));
        }

        let root = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        debug!(root = %root.display(), "resolved repository root");

        Ok(Self {
            root,
            env: config.git_env.clone(),
        })
    }

    /// Work tree top level
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git in the repository root and return stdout
    async fn run(&self, args: &[&str], operation: &str) -> Result<String, GitError> {
        debug!(?args, "running git");
        let output = git_command(&self.root, &self.env)
            .args(args)
            .output()
            .await
            .map_err(GitError::SpawnFailed)?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                operation: operation.to_string(),
                stderr: stderr_of(&output),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn staged_files(&self) -> Result<Vec<String>, GitError> {
        let stdout = self
            .run(&["diff", "--name-only", "--staged"], "diff --name-only")
            .await?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn diff(&self, staged: bool) -> Result<String, GitError> {
        let mut args = vec!["diff"];
        if staged {
            args.push("--staged");
        }
        args.extend(DIFF_FLAGS);

        self.run(&args, "diff").await
    }

    async fn commit(&self, message: &str) -> Result<String, GitError> {
        match self.run(&["commit", "-m", message], "commit").await {
            Ok(stdout) => Ok(stdout),
            Err(GitError::CommandFailed { stderr, .. }) => Err(GitError::CommitFailed { stderr }),
            Err(e) => Err(e),
        }
    }
}

fn git_command(dir: &Path, env: &[(String, String)]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .kill_on_drop(true);
    cmd
}

/// Stderr of a failed git run, falling back to stdout (git commit reports
/// "nothing to commit" there)
fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

// Behaviour against a real repository is covered in tests/git_cli_test.rs.
