//! Prompt construction for commit message generation
//!
//! The prompt template carries three placeholders, `{lang}`, `{commit_type}`
//! and `{diff}`, which are substituted in a single left-to-right pass.

/// Placeholder for the target language of the message
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// Placeholder for the conventional commit type hint
pub const TYPE_PLACEHOLDER: &str = "{commit_type}";

/// Placeholder for the sanitized diff
pub const DIFF_PLACEHOLDER: &str = "{diff}";

/// Built-in prompt template
pub const DEFAULT_TEMPLATE: &str = r#"You are an assistant that writes short, clear commit messages following the Conventional Commits standard.
Reply ONLY with the subject line (no body), in the language: {lang}.
Preferences:
- Type: {commit_type} (feat, fix, chore, refactor, docs, test, perf, build, ci, style)
- At most ~72 characters.
- Describe the change, not the file; use the imperative mood (e.g. "add", "fix", "update").
- Include a scope when it makes sense (e.g. feat(user): ...).
- Do NOT end with a period.

If the change is mixed, pick the predominant type; if unsure, use "chore".

Below is the git diff (unified, no colors). Produce ONE line:

<diff>
{diff}
</diff>
"#;

/// Render a prompt template
///
/// Substituted values are inserted verbatim and never re-scanned, so a diff
/// that happens to contain `{lang}` is left untouched. Braces that do not
/// form a known placeholder are copied as-is.
///
/// # Example
///
/// ```
/// use gemini_commit::prompt::render;
///
/// let prompt = render("[{lang}/{commit_type}] <diff>{diff}</diff>", "en", "fix", "+a");
/// assert_eq!(prompt, "[en/fix] <diff>+a</diff>");
/// ```
pub fn render(template: &str, lang: &str, commit_type: &str, diff: &str) -> String {
    let mut out = String::with_capacity(template.len() + diff.len() + lang.len() + commit_type.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let replacement = [
            (LANG_PLACEHOLDER, lang),
            (TYPE_PLACEHOLDER, commit_type),
            (DIFF_PLACEHOLDER, diff),
        ]
        .into_iter()
        .find(|(placeholder, _)| tail.starts_with(placeholder));

        match replacement {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Render the prompt for one run from the resolved configuration
pub fn build_prompt(config: &crate::config::Config, diff: &str) -> String {
    render(&config.prompt_template, &config.lang, &config.commit_type, diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_embeds_diff_in_tags() {
        // Arrange
        let diff = "diff --git a/file.txt b/file.txt\n+new line";

        // Act
        let result = render(DEFAULT_TEMPLATE, "en", "feat", diff);

        // Assert - diff sits verbatim between the tags
        assert!(result.contains("<diff>\ndiff --git a/file.txt b/file.txt\n+new line\n</diff>"));
        assert!(result.contains("in the language: en."));
        assert!(result.contains("- Type: feat ("));
        assert!(!result.contains(DIFF_PLACEHOLDER));
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = render(DEFAULT_TEMPLATE, "pt-BR", "chore", "+x");
        let b = render(DEFAULT_TEMPLATE, "pt-BR", "chore", "+x");
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_does_not_rescan_substituted_values() {
        // Arrange - values that look like placeholders
        let template = "{lang}|{commit_type}|{diff}";

        // Act
        let result = render(template, "{diff}", "{lang}", "+let s = \"{commit_type}\";");

        // Assert - inserted verbatim, no second substitution
        assert_eq!(result, "{diff}|{lang}|+let s = \"{commit_type}\";");
    }

    #[test]
    fn test_render_keeps_unknown_braces() {
        let result = render("fn main() {{ {x} }} {diff", "en", "fix", "+a");
        assert_eq!(result, "fn main() {{ {x} }} {diff");
    }

    #[test]
    fn test_render_no_escaping_of_diff() {
        // Arrange - special characters including Unicode and emojis
        let diff = "diff --git a/日本語.txt b/日本語.txt\n+こんにちは 🎉\n+Special: \t\\n\"quotes\" </diff>";

        // Act
        let result = render("<diff>{diff}</diff>", "ja", "feat", diff);

        // Assert - everything preserved byte for byte
        assert_eq!(result, format!("<diff>{}</diff>", diff));
    }

    #[test]
    fn test_render_empty_values() {
        assert_eq!(render("{lang}{commit_type}{diff}", "", "", ""), "");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        assert_eq!(render("{lang} and {lang}", "en", "fix", ""), "en and en");
    }
}
