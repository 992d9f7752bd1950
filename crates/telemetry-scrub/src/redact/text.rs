//! Free-text scrubbing.

use std::borrow::Cow;

use regex::NoExpand;
use tracing::{trace, warn};

use super::patterns::{builtin_patterns, email_regex, has_quoted, replace_quoted, FilterPattern};
use super::{EMAIL_PLACEHOLDER, FILTERED_PLACEHOLDER};
use crate::config::ScrubConfig;

/// Replace every email address in `text` with `"[email]"`.
///
/// Text around the matches is preserved verbatim. Returns the input
/// unchanged (borrowed) when there is nothing to replace.
#[must_use]
pub fn redact_emails(text: &str) -> Cow<'_, str> {
    redact_emails_with(text, EMAIL_PLACEHOLDER)
}

fn redact_emails_with<'t>(text: &'t str, placeholder: &str) -> Cow<'t, str> {
    email_regex().replace_all(text, NoExpand(placeholder))
}

/// Compiled free-text rules.
///
/// Rules run in a fixed order: emails, then quoted text (exception values
/// only), then secret patterns in declaration order.
#[derive(Debug, Clone)]
pub struct TextRedactor {
    email_placeholder: String,
    filtered_placeholder: String,
    redact_quoted: bool,
    patterns: Vec<FilterPattern>,
}

impl Default for TextRedactor {
    fn default() -> Self {
        Self {
            email_placeholder: EMAIL_PLACEHOLDER.to_string(),
            filtered_placeholder: FILTERED_PLACEHOLDER.to_string(),
            redact_quoted: true,
            patterns: builtin_patterns(),
        }
    }
}

impl TextRedactor {
    /// Build the rules described by `config`.
    ///
    /// Custom patterns that fail to compile are skipped with a warning.
    #[must_use]
    pub fn from_config(config: &ScrubConfig) -> Self {
        let mut patterns = if config.use_builtin_patterns {
            builtin_patterns()
        } else {
            Vec::new()
        };

        patterns.extend(config.custom_patterns.iter().enumerate().filter_map(|(i, p)| {
            match FilterPattern::custom(format!("custom_{i}"), p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern_index = i, error = %e, "Invalid custom regex pattern");
                    None
                }
            }
        }));

        Self {
            email_placeholder: config.email_placeholder.clone(),
            filtered_placeholder: config.filtered_placeholder.clone(),
            redact_quoted: config.redact_quoted_exception_text,
            patterns,
        }
    }

    /// Number of secret patterns in use.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Scrub free text such as an event message.
    #[must_use]
    pub fn redact<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let emails = redact_emails_with(text, &self.email_placeholder);
        self.apply_patterns(emails)
    }

    /// Scrub an exception value. Quoted user content is replaced as well
    /// when enabled.
    #[must_use]
    pub fn redact_exception<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut result = redact_emails_with(text, &self.email_placeholder);
        if self.redact_quoted && has_quoted(&result) {
            trace!("Quoted exception text redacted");
            result = Cow::Owned(replace_quoted(&result, &self.filtered_placeholder));
        }
        self.apply_patterns(result)
    }

    fn apply_patterns<'t>(&self, mut result: Cow<'t, str>) -> Cow<'t, str> {
        for pattern in &self.patterns {
            if pattern.matches(&result) {
                result = Cow::Owned(pattern.redact(&result, &self.filtered_placeholder));
                trace!(pattern = %pattern.name, "Text redacted by pattern");
            }
        }
        result
    }
}
