//! `telemetry-scrub` - Privacy scrubbing for outbound telemetry
//!
//! This library redacts personally identifiable and sensitive content from
//! error events and breadcrumbs immediately before a telemetry SDK hands
//! them to its transport. It exposes the two SDK hooks
//! ([`Scrubber::before_send`] and [`Scrubber::before_breadcrumb`]) and the
//! redaction primitives they are built from.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use telemetry_scrub::{Scrubber, Value};
//!
//! let scrubber = Scrubber::new();
//! let event = Value::from(json!({
//!     "message": "Error for user test@example.com",
//!     "user": {"id": "user-123", "email": "test@example.com"}
//! }));
//!
//! let scrubbed = scrubber.before_send(&event).unwrap();
//! assert_eq!(
//!     scrubbed.to_json(),
//!     json!({"message": "Error for user [email]", "user": {"id": "user-123"}})
//! );
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod breadcrumb;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod redact;
pub mod scrubber;
pub mod value;

pub use config::{Config, FaultPolicy, ScrubConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use redact::{
    extract_table_name, redact_emails, redact_sensitive_fields, RedactionEngine,
    EMAIL_PLACEHOLDER, FILTERED_PLACEHOLDER,
};
pub use scrubber::{privacy_before_breadcrumb, privacy_before_send, Scrubber};
pub use value::{Mapping, Value};
