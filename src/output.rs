//! Shaping and presenting the commit message
//!
//! - [`post_process`] turns raw model text into a single-line message
//! - [`CommitMessage`] is the JSON shape printed with `--json`
//! - [`with_spinner`] animates the terminal while the model is working

use serde::Serialize;
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{Duration, sleep};

/// Suffix appended when the diff sent to the model was cut
pub const TRUNCATED_SUFFIX: &str = " (truncated diff)";

/// Quote pairs stripped from the ends of a message
const QUOTES: [(char, char); 4] = [('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];

/// Commit message structure for JSON output
///
/// # Example
///
/// ```
/// use gemini_commit::output::CommitMessage;
///
/// let commit = CommitMessage {
///     message: "feat: add new feature".to_string(),
///     truncated: false,
/// };
///
/// let json = serde_json::to_string(&commit).unwrap();
/// assert_eq!(json, r#"{"message":"feat: add new feature","truncated":false}"#);
/// ```
#[derive(Serialize, Debug)]
pub struct CommitMessage {
    /// The final commit message
    pub message: String,
    /// Whether the diff was cut before generation
    pub truncated: bool,
}

/// Join the lines of `text` with single spaces and trim the result
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Blank lines are skipped so no
/// double spaces are introduced.
pub fn collapse_lines(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip one quote character from each end of `text`, if present
fn strip_quotes(text: &str) -> &str {
    let mut out = text;
    if let Some(first) = out.chars().next() {
        if QUOTES.iter().any(|(open, _)| *open == first) {
            out = &out[first.len_utf8()..];
        }
    }
    if let Some(last) = out.chars().next_back() {
        if QUOTES.iter().any(|(_, close)| *close == last) {
            out = &out[..out.len() - last.len_utf8()];
        }
    }
    out
}

/// Turn model output into a single-line commit message
///
/// Line breaks become single spaces, surrounding whitespace is trimmed, one
/// layer of straight or curly quotes is stripped from either end, and
/// [`TRUNCATED_SUFFIX`] is appended when `truncated` is set. A message that is
/// empty after stripping stays empty, suffix or not.
///
/// # Example
///
/// ```
/// use gemini_commit::output::post_process;
///
/// assert_eq!(post_process("\"fix: handle\nexpired token\"\n", false), "fix: handle expired token");
/// assert_eq!(post_process("feat: x", true), "feat: x (truncated diff)");
/// ```
pub fn post_process(text: &str, truncated: bool) -> String {
    let collapsed = collapse_lines(text);
    let mut message = strip_quotes(&collapsed).trim().to_string();
    if truncated && !message.is_empty() {
        message.push_str(TRUNCATED_SUFFIX);
    }
    message
}

/// Run `future` while showing a rotating spinner with `label`
///
/// The spinner line is cleared once the future completes.
pub async fn with_spinner<F, T>(label: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let spinner_running = Arc::new(AtomicBool::new(true));
    let spinner_running_clone = Arc::clone(&spinner_running);
    let label = label.to_string();

    let spinner_task = tokio::spawn(async move {
        let spinner_chars = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
        let mut idx = 0;

        while spinner_running_clone.load(Ordering::Relaxed) {
            print!("\r{} {}", spinner_chars[idx], label);
            let _ = io::stdout().flush();
            idx = (idx + 1) % spinner_chars.len();
            sleep(Duration::from_millis(80)).await;
        }

        // Clear spinner line
        print!("\r\x1b[K");
        let _ = io::stdout().flush();
    });

    let result = future.await;

    spinner_running.store(false, Ordering::Relaxed);
    let _ = spinner_task.await;

    result
}
