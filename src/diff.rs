//! Diff preparation before it is sent to the model
//!
//! Two steps run on the raw `git diff` output: [`sanitize`] drops lines that
//! are likely to leak credentials, and [`cap`] bounds the size of what
//! leaves the machine.

use tracing::debug;

/// Lowercase keywords that mark an added line as secret-bearing
const SECRET_KEYWORDS: [&str; 4] = ["api_key", "apikey", "secret", "token"];

/// Substring marking a header line as referring to an env file
const ENV_FILE_MARKER: &str = ".env";

/// A diff ready to be embedded in the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDiff {
    pub text: String,
    /// Set when [`cap`] cut the sanitized diff
    pub truncated: bool,
}

impl PreparedDiff {
    /// Sanitize and then cap `raw`
    pub fn new(raw: &str, max_chars: usize) -> Self {
        let sanitized = sanitize(raw);
        let (text, truncated) = cap(&sanitized, max_chars);
        debug!(
            raw_len = raw.len(),
            sanitized_len = sanitized.len(),
            truncated,
            "prepared diff"
        );
        Self { text, truncated }
    }
}

/// Remove lines that may carry secrets from a unified diff
///
/// Dropped lines:
/// - any line starting with `+` whose lowercase text contains one of
///   `api_key`, `apikey`, `secret`, `token`
/// - any `---`/`+++` header line whose lowercase text contains `.env`
///
/// Retained lines keep their order and content and are joined with `\n`.
///
/// Only added lines are checked for keywords and only header lines for env
/// file names: a removed line holding a secret, or hunk content from an env
/// file, is kept.
pub fn sanitize(diff: &str) -> String {
    let mut dropped = 0usize;
    let kept: Vec<&str> = diff
        .lines()
        .filter(|line| {
            let keep = !is_sensitive(line);
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, "removed sensitive lines from diff");
    }

    kept.join("\n")
}

fn is_sensitive(line: &str) -> bool {
    let lower = line.to_lowercase();

    if line.starts_with('+') && SECRET_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return true;
    }

    (line.starts_with("+++") || line.starts_with("---")) && lower.contains(ENV_FILE_MARKER)
}

/// Cut `diff` to at most `max_chars` characters
///
/// The cut is a plain character count with no attempt to end on a line or
/// hunk boundary. Returns the (possibly shortened) text and whether anything
/// was removed.
///
/// # Example
///
/// ```
/// use gemini_commit::diff::cap;
///
/// assert_eq!(cap("+abcdef", 4), ("+abc".to_string(), true));
/// assert_eq!(cap("+ab", 4), ("+ab".to_string(), false));
/// ```
pub fn cap(diff: &str, max_chars: usize) -> (String, bool) {
    match diff.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (diff[..byte_idx].to_string(), true),
        None => (diff.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_drops_only_the_secret_line() {
        // Arrange - secret line surrounded by unrelated lines
        let diff = "@@ -1,0 +1,3 @@\n+let a = 1;\n+let API_KEY = \"abc\";\n+let b = 2;";

        // Act
        let result = sanitize(diff);

        // Assert - neighbours survive untouched and in order
        assert_eq!(result, "@@ -1,0 +1,3 @@\n+let a = 1;\n+let b = 2;");
    }

    #[test]
    fn test_sanitize_each_keyword() {
        for line in [
            "+api_key=1",
            "+ApiKey: x",
            "+client_secret = y",
            "+auth TOKEN here",
        ] {
            let diff = format!("+keep\n{}\n-removed", line);
            assert_eq!(sanitize(&diff), "+keep\n-removed", "line {line}");
        }
    }

    #[test]
    fn test_sanitize_keeps_removed_and_context_lines_with_keywords() {
        // Arrange - keywords outside added lines pass through
        let diff = "-const TOKEN = \"old\";\n token in context";

        // Act
        let result = sanitize(diff);

        // Assert
        assert_eq!(result, diff);
    }

    #[test]
    fn test_sanitize_drops_env_file_headers() {
        // Arrange
        let diff = "diff --git a/.env b/.env\n--- a/.env\n+++ b/.env.local\n@@ -1 +1 @@\n-FOO=1\n+FOO=2";

        // Act
        let result = sanitize(diff);

        // Assert - headers gone, body kept
        assert_eq!(result, "diff --git a/.env b/.env\n@@ -1 +1 @@\n-FOO=1\n+FOO=2");
    }

    #[test]
    fn test_sanitize_keeps_non_header_env_mentions() {
        let diff = "-load(\".env\")\n+load(\".env.example\")";
        assert_eq!(sanitize(diff), diff);
    }

    #[test]
    fn test_sanitize_drops_plus_header_with_keyword() {
        // "+++" lines are added-line prefixed too
        let diff = "--- a/src/token.rs\n+++ b/src/token.rs\n+fn f() {}";
        assert_eq!(sanitize(diff), "--- a/src/token.rs\n+fn f() {}");
    }

    #[test]
    fn test_sanitize_preserves_bytes_of_kept_lines() {
        let diff = "+  tabs\tand  spaces  \n+ünïcödé 🎉";
        assert_eq!(sanitize(diff), diff);
    }

    #[test]
    fn test_cap_longer_input_hits_exact_length() {
        // Arrange
        let diff = "+".repeat(100);

        // Act
        let (text, truncated) = cap(&diff, 40);

        // Assert
        assert_eq!(text.chars().count(), 40);
        assert!(truncated);
    }

    #[test]
    fn test_cap_shorter_or_equal_input_unchanged() {
        let diff = "+line\n-line";

        let (shorter, flag_short) = cap(diff, 1000);
        let (exact, flag_exact) = cap(diff, diff.chars().count());

        assert_eq!(shorter, diff);
        assert!(!flag_short);
        assert_eq!(exact, diff);
        assert!(!flag_exact);
    }

    #[test]
    fn test_cap_counts_characters_not_bytes() {
        // Arrange - multi-byte characters
        let diff = "+日本語🎉テキスト";

        // Act
        let (text, truncated) = cap(diff, 4);

        // Assert - never splits a code point
        assert_eq!(text, "+日本語");
        assert!(truncated);
    }

    #[test]
    fn test_cap_zero() {
        assert_eq!(cap("+a", 0), (String::new(), true));
        assert_eq!(cap("", 0), (String::new(), false));
    }

    #[test]
    fn test_prepared_diff_sanitizes_before_capping() {
        // Arrange - the secret line would otherwise push the diff over the cap
        let raw = "+ok\n+secret=1";

        // Act
        let prepared = PreparedDiff::new(raw, 3);

        // Assert
        assert_eq!(prepared.text, "+ok");
        assert!(!prepared.truncated);
    }
}
