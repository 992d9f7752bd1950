//! Hook entry points for the telemetry SDK.
//!
//! The SDK calls [`Scrubber::before_send`] once per outbound event and
//! [`Scrubber::before_breadcrumb`] once per recorded breadcrumb. Both return
//! the scrubbed value, or `None` to drop it.
//!
//! Scrubbing never fails from the host's point of view. A step that hits an
//! internal fault (an error or a panic) is logged and skipped, and the
//! [`FaultPolicy`] decides whether the partially scrubbed value is still
//! sent.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use tracing::{trace, warn};

use crate::config::{FaultPolicy, ScrubConfig};
use crate::error::{Error, Result};
use crate::redact::RedactionEngine;
use crate::value::{Mapping, Value};
use crate::{breadcrumb, event};

/// A named scrub step over the copied top-level mapping of a payload.
pub(crate) type Step = (&'static str, fn(&RedactionEngine, &Mapping) -> Result<()>);

static DEFAULT_SCRUBBER: LazyLock<Scrubber> = LazyLock::new(Scrubber::new);

/// Scrub an outbound event with the default configuration.
#[must_use]
pub fn privacy_before_send(event: &Value) -> Option<Value> {
    DEFAULT_SCRUBBER.before_send(event)
}

/// Scrub a breadcrumb with the default configuration.
#[must_use]
pub fn privacy_before_breadcrumb(breadcrumb: &Value) -> Option<Value> {
    DEFAULT_SCRUBBER.before_breadcrumb(breadcrumb)
}

/// Privacy scrubber for telemetry events and breadcrumbs.
///
/// Holds only immutable compiled rules, so one instance can serve every
/// thread the SDK calls from.
#[derive(Debug, Clone)]
pub struct Scrubber {
    config: ScrubConfig,
    engine: RedactionEngine,
}

impl Scrubber {
    /// Create a scrubber with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ScrubConfig::default())
    }

    /// Create a scrubber with custom configuration.
    #[must_use]
    pub fn with_config(config: ScrubConfig) -> Self {
        let engine = RedactionEngine::from_config(&config);
        Self { config, engine }
    }

    /// Check if scrubbing is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ScrubConfig {
        &self.config
    }

    /// The compiled redaction rules.
    #[must_use]
    pub fn engine(&self) -> &RedactionEngine {
        &self.engine
    }

    /// Scrub an outbound event.
    #[must_use]
    pub fn before_send(&self, event: &Value) -> Option<Value> {
        self.apply("event", event, event::STEPS)
    }

    /// Scrub a breadcrumb.
    #[must_use]
    pub fn before_breadcrumb(&self, breadcrumb: &Value) -> Option<Value> {
        self.apply("breadcrumb", breadcrumb, breadcrumb::STEPS)
    }

    fn apply(&self, kind: &'static str, input: &Value, steps: &[Step]) -> Option<Value> {
        if !self.config.enabled {
            return Some(input.clone());
        }

        let Value::Mapping(root) = input else {
            trace!(kind, shape = input.kind(), "Not a mapping, passed through");
            return Some(input.clone());
        };

        let out = match root.try_copy() {
            Ok(out) => out,
            Err(e) => {
                warn!(kind, error = %e, "Could not read payload");
                return self.after_fault(kind, input.clone());
            }
        };

        let mut faulted = false;
        for (name, step) in steps {
            if let Err(e) = run_step(*step, &self.engine, &out) {
                warn!(kind, step = *name, error = %e, "Scrub step failed");
                faulted = true;
            }
        }

        let scrubbed = Value::Mapping(out);
        if faulted {
            self.after_fault(kind, scrubbed)
        } else {
            Some(scrubbed)
        }
    }

    fn after_fault(&self, kind: &'static str, value: Value) -> Option<Value> {
        match self.config.fault_policy {
            FaultPolicy::BestEffort => Some(value),
            FaultPolicy::Suppress => {
                warn!(kind, "Dropped after scrub fault");
                None
            }
        }
    }
}

impl Default for Scrubber {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one step, turning a panic into an error.
fn run_step(
    step: fn(&RedactionEngine, &Mapping) -> Result<()>,
    engine: &RedactionEngine,
    out: &Mapping,
) -> Result<()> {
    panic::catch_unwind(AssertUnwindSafe(|| step(engine, out)))
        .unwrap_or_else(|payload| Err(Error::internal(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "scrub step panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> serde_json::Value {
        json!({
            "message": "Error for user test@example.com",
            "request": {"data": {"message": "hi", "user_id": "123"}},
            "user": {"id": "user-123", "email": "test@example.com"}
        })
    }

    #[test]
    fn test_scrubber_default() {
        let scrubber = Scrubber::default();
        assert!(scrubber.is_enabled());
        assert_eq!(scrubber.config(), &ScrubConfig::default());
        assert!(scrubber.engine().text().pattern_count() > 0);
    }

    #[test]
    fn test_scrubber_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Scrubber>();
    }

    #[test]
    fn test_free_functions() {
        let out = privacy_before_send(&Value::from(sample_event())).unwrap();
        assert_eq!(
            out.to_json(),
            json!({
                "message": "Error for user [email]",
                "request": {"data": {"message": "[Filtered]", "user_id": "123"}},
                "user": {"id": "user-123"}
            })
        );

        let crumb = Value::from(json!({"category": "navigation", "data": {"to": "/a?b=1"}}));
        let out = privacy_before_breadcrumb(&crumb).unwrap();
        assert_eq!(out.to_json()["data"]["to"], "/a");
    }

    #[test]
    fn test_disabled_passes_through() {
        let scrubber = Scrubber::with_config(ScrubConfig {
            enabled: false,
            ..ScrubConfig::default()
        });
        assert!(!scrubber.is_enabled());

        let event = sample_event();
        let out = scrubber.before_send(&Value::from(event.clone())).unwrap();
        assert_eq!(out.to_json(), event);
    }

    #[test]
    fn test_output_root_is_new_container() {
        let root: Mapping = [("level", "error")].into_iter().collect();
        let out = Scrubber::new().before_send(&Value::Mapping(root.clone())).unwrap();

        assert!(!out.as_mapping().unwrap().ptr_eq(&root));
    }

    fn event_with_locked_data(data: &Mapping) -> Value {
        let request: Mapping = [("data", data.clone())].into_iter().collect();
        let event: Mapping = [
            ("request", Value::Mapping(request)),
            ("message", Value::from("from a@b.io")),
        ]
        .into_iter()
        .collect();
        Value::Mapping(event)
    }

    #[test]
    fn test_fault_best_effort_keeps_other_steps() {
        let data: Mapping = [("message", "secret")].into_iter().collect();
        let event = event_with_locked_data(&data);
        let _guard = data.try_borrow_mut().unwrap();

        let out = Scrubber::new().before_send(&event).unwrap();
        assert_eq!(out.get("message").unwrap().as_str(), Some("from [email]"));
        let out_data = out.pointer(&["request", "data"]).unwrap();
        assert!(out_data.as_mapping().unwrap().ptr_eq(&data));
    }

    #[test]
    fn test_fault_suppress_drops_event() {
        let scrubber = Scrubber::with_config(ScrubConfig {
            fault_policy: FaultPolicy::Suppress,
            ..ScrubConfig::default()
        });
        let data: Mapping = [("message", "secret")].into_iter().collect();
        let event = event_with_locked_data(&data);
        let _guard = data.try_borrow_mut().unwrap();

        assert!(scrubber.before_send(&event).is_none());
    }

    #[test]
    fn test_locked_root_best_effort() {
        let root: Mapping = [("category", "http")].into_iter().collect();
        let _guard = root.try_borrow_mut().unwrap();

        let out = Scrubber::new().before_breadcrumb(&Value::Mapping(root.clone()));
        assert!(out.unwrap().as_mapping().unwrap().ptr_eq(&root));
    }

    #[test]
    fn test_locked_root_suppressed() {
        let scrubber = Scrubber::with_config(ScrubConfig {
            fault_policy: FaultPolicy::Suppress,
            ..ScrubConfig::default()
        });
        let root: Mapping = [("category", "http")].into_iter().collect();
        let _guard = root.try_borrow_mut().unwrap();

        assert!(scrubber.before_breadcrumb(&Value::Mapping(root.clone())).is_none());
    }

    #[test]
    fn test_run_step_catches_panic() {
        fn panicking(_: &RedactionEngine, _: &Mapping) -> Result<()> {
            panic!("boom");
        }

        let result = run_step(panicking, &RedactionEngine::default(), &Mapping::new());
        match result {
            Err(Error::Internal(message)) => assert_eq!(message, "boom"),
            other => panic!("Expected internal error, got {other:?}"),
        }
    }

    #[test]
    fn test_panic_message_fallback() {
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "scrub step panicked");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }

    #[test]
    fn test_custom_config_applies_to_both_hooks() {
        let scrubber = Scrubber::with_config(ScrubConfig {
            extra_sensitive_keys: vec!["body".to_string()],
            filtered_placeholder: "<hidden>".to_string(),
            ..ScrubConfig::default()
        });

        let out = scrubber
            .before_send(&Value::from(json!({"request": {"data": {"body": "x", "id": 1}}})))
            .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"request": {"data": {"body": "<hidden>", "id": 1}}})
        );
    }
}
