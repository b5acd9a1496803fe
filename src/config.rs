//! Configuration management for gemini_commit
//!
//! Command-line flags, environment variables and an optional TOML file are
//! resolved once at startup into an immutable [`Config`] that is passed by
//! reference to every step of the pipeline.
//!
//! Precedence is: CLI flag > environment variable > config file > default.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ConfigError;
use crate::prompt::{DEFAULT_TEMPLATE, DIFF_PLACEHOLDER};

/// Model used when neither `--model`, `GEMINI_MODEL` nor the config file name one
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default conventional commit type hint
pub const DEFAULT_COMMIT_TYPE: &str = "chore";

/// Default language of the generated message
pub const DEFAULT_LANG: &str = "pt-BR";

/// Default maximum number of diff characters sent to the model
pub const DEFAULT_MAX_DIFF_CHARS: usize = 40_000;

/// Default base URL of the Gemini REST API
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

pub const MODEL_ENV_VAR: &str = "GEMINI_MODEL";
pub const MAX_DIFF_ENV_VAR: &str = "AICOMMIT_MAX_DIFF_CHARS";
pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";
pub const API_BASE_ENV_VAR: &str = "AICOMMIT_API_BASE";

/// Defaults applied to spawned git processes when the variable is unset
const GIT_ENV_DEFAULTS: [(&str, &str); 3] = [
    ("GIT_PAGER", "cat"),
    ("LANG", "C.UTF-8"),
    ("LC_ALL", "C.UTF-8"),
];

/// Snapshot of the environment variables the tool reads.
///
/// Resolution never touches the process environment directly, which keeps
/// [`Config::from_parts`] pure.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the current process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `key`, treating an empty string as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Options taken from the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub unstaged: bool,
    pub commit_type: Option<String>,
    pub lang: Option<String>,
    pub no_edit: bool,
    pub model: Option<String>,
    pub print_only: bool,
    pub json: bool,
    pub config_path: Option<PathBuf>,
}

/// Optional configuration file structure
///
/// # Example TOML
///
/// ```toml
/// # All fields are optional
/// model = "gemini-1.5-pro"
/// lang = "en"
/// commit_type = "feat"
/// max_diff_chars = 20000
/// prompt = """
/// Write one conventional commit subject in {lang}, type {commit_type}.
/// <diff>
/// {diff}
/// </diff>
/// """
/// ```
#[derive(Deserialize, Debug, Default)]
pub struct FileConfig {
    /// Prompt template with `{lang}`, `{commit_type}` and `{diff}` placeholders
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub lang: Option<String>,
    pub commit_type: Option<String>,
    pub max_diff_chars: Option<usize>,
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// * File does not exist or cannot be read
/// * Invalid TOML format
/// * `prompt` is empty, whitespace-only, or lacks the `{diff}` placeholder
/// * `max_diff_chars` is zero
///
/// # Example
///
/// ```no_run
/// use gemini_commit::config::load_config;
///
/// # fn main() -> anyhow::Result<()> {
/// let file = load_config("aicommit.toml".as_ref())?;
/// println!("Model: {:?}", file.model);
/// # Ok(())
/// # }
/// ```
pub fn load_config(config_path: &Path) -> Result<FileConfig, ConfigError> {
    let display = config_path.display().to_string();
    let content = fs::read_to_string(config_path).map_err(|source| ConfigError::ReadFailed {
        path: display.clone(),
        source,
    })?;
    let config: FileConfig = toml::from_str(&content).map_err(ConfigError::ParseFailed)?;

    if let Some(prompt) = &config.prompt {
        if prompt.trim().is_empty() {
            return Err(ConfigError::EmptyPrompt(display));
        }
        if !prompt.contains(DIFF_PLACEHOLDER) {
            return Err(ConfigError::MissingDiffPlaceholder(display));
        }
    }

    if config.max_diff_chars == Some(0) {
        return Err(ConfigError::ZeroDiffLimit);
    }

    Ok(config)
}

/// Fully resolved, immutable run configuration
#[derive(Clone)]
pub struct Config {
    /// Use the staged diff (`--unstaged` turns this off)
    pub staged: bool,
    pub commit_type: String,
    pub lang: String,
    /// Open the editor on the suggested message
    pub edit: bool,
    pub model: String,
    /// Print the final message instead of committing
    pub print_only: bool,
    /// Emit the message as JSON (implies `print_only` and no editing)
    pub json: bool,
    pub max_diff_chars: usize,
    pub api_key: Option<String>,
    pub api_base: String,
    /// Editor argv from `EDITOR` or `VISUAL`
    pub editor: Option<Vec<String>>,
    pub prompt_template: String,
    /// Variables injected into every git subprocess
    pub git_env: Vec<(String, String)>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("staged", &self.staged)
            .field("commit_type", &self.commit_type)
            .field("lang", &self.lang)
            .field("edit", &self.edit)
            .field("model", &self.model)
            .field("print_only", &self.print_only)
            .field("json", &self.json)
            .field("max_diff_chars", &self.max_diff_chars)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("editor", &self.editor)
            .field("git_env", &self.git_env)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Resolve the configuration, loading the TOML file named by `--config` if any
    pub fn resolve(cli: &CliOptions, env: &Env) -> Result<Self, ConfigError> {
        let file = match &cli.config_path {
            Some(path) => load_config(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::from_parts(cli, file, env))
    }

    /// Merge already-loaded sources into a [`Config`]
    pub fn from_parts(cli: &CliOptions, file: FileConfig, env: &Env) -> Self {
        let model = cli
            .model
            .clone()
            .or_else(|| env.get(MODEL_ENV_VAR).map(str::to_string))
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_diff_chars = max_diff_from_env(env)
            .or(file.max_diff_chars)
            .unwrap_or(DEFAULT_MAX_DIFF_CHARS);

        let editor = env
            .get("EDITOR")
            .or_else(|| env.get("VISUAL"))
            .map(|value| {
                value
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|argv| !argv.is_empty());

        let git_env = GIT_ENV_DEFAULTS
            .iter()
            .filter(|(key, _)| env.get(key).is_none())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self {
            staged: !cli.unstaged,
            commit_type: cli
                .commit_type
                .clone()
                .or(file.commit_type)
                .unwrap_or_else(|| DEFAULT_COMMIT_TYPE.to_string()),
            lang: cli
                .lang
                .clone()
                .or(file.lang)
                .unwrap_or_else(|| DEFAULT_LANG.to_string()),
            edit: !(cli.no_edit || cli.json),
            model,
            print_only: cli.print_only || cli.json,
            json: cli.json,
            max_diff_chars,
            api_key: env.get(API_KEY_ENV_VAR).map(str::to_string),
            api_base: env
                .get(API_BASE_ENV_VAR)
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            editor,
            prompt_template: file
                .prompt
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            git_env,
        }
    }
}

/// Read the diff cap from the environment.
///
/// Logs a warning and ignores the variable if it is not a positive integer.
fn max_diff_from_env(env: &Env) -> Option<usize> {
    let raw = env.get(MAX_DIFF_ENV_VAR)?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(
                "Invalid {} value '{}', ignoring it",
                MAX_DIFF_ENV_VAR, raw
            );
            None
        }
    }
}
