//! Redaction primitives shared by the event and breadcrumb scrubbers.
//!
//! - **Field-name redaction**: denylisted keys anywhere in a nested value are
//!   replaced with `"[Filtered]"`, with cycle-safe traversal.
//!
//! - **Free-text redaction**: email addresses become `"[email]"`; quoted
//!   user content and secret patterns (tokens, keys, passwords) become
//!   `"[Filtered]"`.
//!
//! - **URL helpers**: table-name extraction for REST calls and query-string
//!   stripping for routes.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use telemetry_scrub::redact::{extract_table_name, redact_emails, redact_sensitive_fields};
//! use telemetry_scrub::Value;
//!
//! let data = Value::from(json!({"message": "hi", "user_id": "123"}));
//! let clean = redact_sensitive_fields(&data).unwrap();
//! assert_eq!(clean.to_json(), json!({"message": "[Filtered]", "user_id": "123"}));
//!
//! assert_eq!(redact_emails("ping a@b.io"), "ping [email]");
//! assert_eq!(
//!     extract_table_name(Some("https://x.supabase.co/rest/v1/tasks?select=*")).as_deref(),
//!     Some("tasks")
//! );
//! ```

mod fields;
mod patterns;
mod text;
mod url;

pub use fields::{
    redact_sensitive_fields, FieldRedactor, SensitiveKeys, DEFAULT_MAX_DEPTH, SENSITIVE_KEYS,
    SENSITIVE_KEY_FRAGMENTS,
};
pub use patterns::{builtin_patterns, email_regex, FilterPattern};
pub use text::{redact_emails, TextRedactor};
pub use url::{extract_table_name, strip_query};

use crate::config::ScrubConfig;

/// Sentinel for redacted fields and secrets.
pub const FILTERED_PLACEHOLDER: &str = "[Filtered]";

/// Sentinel for redacted email addresses.
pub const EMAIL_PLACEHOLDER: &str = "[email]";

/// The compiled redaction rules used by one [`crate::Scrubber`].
#[derive(Debug, Clone, Default)]
pub struct RedactionEngine {
    fields: FieldRedactor,
    text: TextRedactor,
}

impl RedactionEngine {
    /// Compile the rules described by `config`.
    #[must_use]
    pub fn from_config(config: &ScrubConfig) -> Self {
        Self {
            fields: FieldRedactor::from_config(config),
            text: TextRedactor::from_config(config),
        }
    }

    /// Field-name redactor.
    #[must_use]
    pub fn fields(&self) -> &FieldRedactor {
        &self.fields
    }

    /// Free-text redactor.
    #[must_use]
    pub fn text(&self) -> &TextRedactor {
        &self.text
    }
}
