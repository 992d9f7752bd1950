//! Built-in text patterns for free-text scrubbing.
//!
//! Free text (event messages, exception values) is scanned with these
//! patterns. Every pattern is compiled by the `regex` crate, whose matching
//! is linear in the input length, so huge strings cannot stall the
//! telemetry pipeline.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::error::{Error, Result};

/// Email addresses: `local-part@domain.tld`.
///
/// The local part takes any RFC 5322 atext character. It may not start with
/// an apostrophe, so an address inside single quotes keeps its quotes.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"[A-Za-z0-9!#$%&*+/=?^_`{|}~\-][A-Za-z0-9.!#$%&'*+/=?^_`{|}~\-]*",
        r"@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}",
    ))
    .expect("email pattern is valid")
});

/// Double-quoted text, straight quotes.
static STRAIGHT_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"\n]+""#).expect("quoted pattern is valid"));

/// Double-quoted text, typographic quotes.
static CURLY_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{201c}[^\u{201d}\n]+\u{201d}").expect("quoted pattern is valid"));

/// Single-quoted text, straight quotes. Group 1 is the quoted span.
///
/// The opening quote may not follow a word character and the closing quote
/// may not precede one, so apostrophes in words like `don't` neither open
/// nor close a quote.
static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w'])('(?:[^'\n]|\b'\b)+')(?:$|\W)").expect("quoted pattern is valid")
});

/// The compiled email pattern.
#[must_use]
pub fn email_regex() -> &'static Regex {
    &EMAIL
}

/// Replace every quoted substring's contents with `placeholder`, keeping
/// the quote characters.
#[must_use]
pub(crate) fn replace_quoted(text: &str, placeholder: &str) -> String {
    let straight = STRAIGHT_QUOTED.replace_all(text, NoExpand(&format!("\"{placeholder}\"")));
    let curly =
        CURLY_QUOTED.replace_all(&straight, NoExpand(&format!("\u{201c}{placeholder}\u{201d}")));
    replace_single_quoted(&curly, placeholder)
}

// Boundary characters are part of each match; resume right after the
// closing quote so they stay available to the next span.
fn replace_single_quoted(text: &str, placeholder: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    while let Some(span) = SINGLE_QUOTED
        .captures_at(text, last)
        .and_then(|caps| caps.get(1))
    {
        out.push_str(&text[last..span.start()]);
        out.push('\'');
        out.push_str(placeholder);
        out.push('\'');
        last = span.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Whether `text` contains any quoted substring.
#[must_use]
pub(crate) fn has_quoted(text: &str) -> bool {
    STRAIGHT_QUOTED.is_match(text)
        || CURLY_QUOTED.is_match(text)
        || SINGLE_QUOTED.is_match(text)
}

/// A compiled free-text pattern.
#[derive(Debug, Clone)]
pub struct FilterPattern {
    /// Name of the pattern for identification.
    pub name: String,

    /// Description of what this pattern matches.
    pub description: &'static str,

    /// The compiled regex.
    regex: Regex,
}

impl FilterPattern {
    /// Create a built-in pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn builtin(name: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            description,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Compile a user-supplied pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the pattern does not compile.
    pub fn custom(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?;
        Ok(Self {
            name: name.into(),
            description: "Custom pattern",
            regex,
        })
    }

    /// Check if the content matches this pattern.
    #[must_use]
    pub fn matches(&self, content: &str) -> bool {
        self.regex.is_match(content)
    }

    /// Redact matches in the content, replacing them with a placeholder.
    #[must_use]
    pub fn redact(&self, content: &str, placeholder: &str) -> String {
        self.regex
            .replace_all(content, NoExpand(placeholder))
            .into_owned()
    }
}

/// Get all built-in secret patterns.
#[must_use]
pub fn builtin_patterns() -> Vec<FilterPattern> {
    vec![
        // Tokens
        FilterPattern::builtin(
            "bearer_token",
            "Bearer authentication tokens",
            r"(?i)bearer\s+[a-zA-Z0-9_.=\-]{8,}",
        ),
        FilterPattern::builtin(
            "jwt",
            "JSON Web Tokens (session and refresh tokens)",
            r"\beyJ[a-zA-Z0-9_\-]{5,}\.[a-zA-Z0-9_\-]{5,}\.[a-zA-Z0-9_\-]+",
        ),
        FilterPattern::builtin(
            "api_key_generic",
            "Generic API key patterns (api_key=, apikey=, etc.)",
            r#"(?i)(api[_-]?key|apikey|api[_-]?secret)\s*[:=]\s*['"]?[a-zA-Z0-9_\-]{16,}['"]?"#,
        ),
        FilterPattern::builtin(
            "aws_key",
            "AWS access key IDs",
            r"\b(AKIA|ABIA|ACCA|ASIA)[A-Z0-9]{16}\b",
        ),
        FilterPattern::builtin(
            "github_token",
            "GitHub personal access tokens and app tokens",
            r"(ghp_|gho_|ghu_|ghs_|ghr_)[a-zA-Z0-9]{36}",
        ),
        FilterPattern::builtin(
            "slack_token",
            "Slack API tokens",
            r"xox[baprs]-[0-9]+-[0-9]+-[a-zA-Z0-9]+",
        ),
        // Passwords
        FilterPattern::builtin(
            "password_field",
            "Password field assignments",
            r#"(?i)(password|passwd|pwd)\s*[:=]\s*['"]?[^\s'"]{4,}['"]?"#,
        ),
        // Private Keys
        FilterPattern::builtin(
            "private_key",
            "PEM-encoded private key headers",
            r"-----BEGIN (?:RSA |EC |DSA )?PRIVATE KEY-----",
        ),
        // Credentials in URLs
        FilterPattern::builtin(
            "connection_string",
            "Connection strings with embedded credentials",
            r"(?i)\b(postgres(?:ql)?|mysql|mongodb(?:\+srv)?|redis|https?)://[^:/\s]+:[^@/\s]+@",
        ),
    ]
}
