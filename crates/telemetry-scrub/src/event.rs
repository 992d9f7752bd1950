//! Event scrubbing.
//!
//! An outbound event is scrubbed in independent steps, each touching one
//! well-known field and skipping silently when the field is absent or has
//! an unexpected shape:
//!
//! 1. `request.data`: denylisted keys are filtered at any depth.
//! 2. `message`: email addresses and secrets are replaced.
//! 3. `user`: reduced to `{id}`.
//! 4. `exception.values[*].value`: emails, quoted user content and secrets
//!    are replaced; `type` is kept.
//!
//! Steps write into the event's top-level mapping, which the caller has
//! already copied. Nested containers a step changes are copied before they
//! are written to, so the caller's original event is never modified.

use std::borrow::Cow;

use tracing::debug;

use crate::error::Result;
use crate::redact::RedactionEngine;
use crate::scrubber::Step;
use crate::value::{Mapping, Value};

/// Steps applied to every event, in order.
pub(crate) const STEPS: &[Step] = &[
    ("request_data", scrub_request_data),
    ("message", scrub_message),
    ("user", scrub_user),
    ("exception_values", scrub_exception_values),
];

fn scrub_request_data(engine: &RedactionEngine, event: &Mapping) -> Result<()> {
    let Some(Value::Mapping(request)) = event.try_get("request")? else {
        return Ok(());
    };
    let Some(data) = request.try_get("data")? else {
        return Ok(());
    };

    let redacted = engine.fields().redact(&data)?;
    let request = request.try_copy()?;
    request.try_insert("data", redacted)?;
    event.try_insert("request", request)?;
    debug!(kind = data.kind(), "Request data scrubbed");
    Ok(())
}

fn scrub_message(engine: &RedactionEngine, event: &Mapping) -> Result<()> {
    let Some(Value::String(message)) = event.try_get("message")? else {
        return Ok(());
    };

    if let Cow::Owned(redacted) = engine.text().redact(&message) {
        event.try_insert("message", redacted)?;
        debug!("Event message redacted");
    }
    Ok(())
}

fn scrub_user(_engine: &RedactionEngine, event: &Mapping) -> Result<()> {
    match event.try_get("user")? {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(user)) => {
            let reduced = Mapping::new();
            if let Some(id) = user.try_get("id")? {
                reduced.try_insert("id", id)?;
            }
            event.try_insert("user", reduced)?;
            debug!("Event user reduced to id");
        }
        Some(other) => {
            event.try_remove("user")?;
            debug!(kind = other.kind(), "Malformed event user removed");
        }
    }
    Ok(())
}

fn scrub_exception_values(engine: &RedactionEngine, event: &Mapping) -> Result<()> {
    let Some(Value::Mapping(exception)) = event.try_get("exception")? else {
        return Ok(());
    };
    let Some(Value::Sequence(values)) = exception.try_get("values")? else {
        return Ok(());
    };

    let scrubbed = values
        .iter()
        .map(|entry| scrub_exception_entry(engine, entry))
        .collect::<Result<Vec<_>>>()?;

    let exception = exception.try_copy()?;
    exception.try_insert("values", scrubbed)?;
    event.try_insert("exception", exception)?;
    debug!(count = values.len(), "Exception values scrubbed");
    Ok(())
}

fn scrub_exception_entry(engine: &RedactionEngine, entry: &Value) -> Result<Value> {
    let Value::Mapping(fields) = entry else {
        return Ok(entry.clone());
    };
    let Some(Value::String(text)) = fields.try_get("value")? else {
        return Ok(entry.clone());
    };

    let fields = fields.try_copy()?;
    fields.try_insert("value", engine.text().redact_exception(&text).into_owned())?;
    Ok(Value::Mapping(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrubber::Scrubber;
    use crate::value::CIRCULAR_MARKER;
    use serde_json::json;

    fn scrub(json: serde_json::Value) -> serde_json::Value {
        Scrubber::new()
            .before_send(&Value::from(json))
            .unwrap()
            .to_json()
    }

    #[test]
    fn test_strips_message_content_from_request_data() {
        let out = scrub(json!({
            "request": {"data": {
                "message": "Sensitive recovery message",
                "content": "Task description",
                "user_id": "123"
            }}
        }));

        assert_eq!(out["request"]["data"]["message"], "[Filtered]");
        assert_eq!(out["request"]["data"]["content"], "[Filtered]");
        assert_eq!(out["request"]["data"]["user_id"], "123");
    }

    #[test]
    fn test_request_fields_other_than_data_kept() {
        let out = scrub(json!({
            "request": {"method": "POST", "data": {"password": "pw"}}
        }));
        assert_eq!(
            out["request"],
            json!({"method": "POST", "data": {"password": "[Filtered]"}})
        );
    }

    #[test]
    fn test_request_data_scalar() {
        let out = scrub(json!({"request": {"data": "raw body"}}));
        assert_eq!(out["request"]["data"], "raw body");
    }

    #[test]
    fn test_redacts_email_from_message() {
        let out = scrub(json!({"message": "Error for user test@example.com"}));
        assert_eq!(out["message"], "Error for user [email]");
    }

    #[test]
    fn test_redacts_multiple_emails_from_message() {
        let out = scrub(json!({
            "message": "Error for users test@example.com, admin@test.org, and user123@domain.co.uk"
        }));
        assert_eq!(out["message"], "Error for users [email], [email], and [email]");
        assert!(!out["message"].as_str().unwrap().contains('@'));
    }

    #[test]
    fn test_large_message() {
        let large = "a".repeat(50_000);
        let out = scrub(json!({"message": format!("Error: {large} with email test@example.com")}));

        let message = out["message"].as_str().unwrap();
        assert!(message.contains("[email]"));
        assert!(!message.contains("test@example.com"));
    }

    #[test]
    fn test_non_string_message_untouched() {
        let out = scrub(json!({"message": {"formatted": "x"}}));
        assert_eq!(out["message"], json!({"formatted": "x"}));
    }

    #[test]
    fn test_user_reduced_to_id() {
        let out = scrub(json!({
            "user": {
                "id": "user-123",
                "email": "test@example.com",
                "username": "testuser",
                "ip_address": "192.168.1.1",
                "role": "sponsor"
            }
        }));

        assert_eq!(out["user"], json!({"id": "user-123"}));
        let user = out["user"].as_object().unwrap();
        assert!(!user.contains_key("email"));
        assert!(!user.contains_key("username"));
        assert!(!user.contains_key("ip_address"));
    }

    #[test]
    fn test_user_without_id() {
        let out = scrub(json!({"user": {"email": "a@b.io"}}));
        assert_eq!(out["user"], json!({}));
    }

    #[test]
    fn test_malformed_user_removed() {
        let out = scrub(json!({"user": "test@example.com", "level": "error"}));
        assert_eq!(out, json!({"level": "error"}));
    }

    #[test]
    fn test_null_user_kept() {
        let out = scrub(json!({"user": null}));
        assert_eq!(out, json!({"user": null}));
    }

    #[test]
    fn test_sanitizes_exception_values() {
        let out = scrub(json!({
            "exception": {"values": [
                {"type": "Error", "value": "Failed to save message: \"Help me stay sober\""},
                {"type": "TypeError", "value": "no profile for a@b.io", "module": "auth"},
                {"type": "Error"},
                "not an entry"
            ]}
        }));

        let values = &out["exception"]["values"];
        assert!(!values[0]["value"].as_str().unwrap().contains("Help me"));
        assert_eq!(values[0]["type"], "Error");
        assert_eq!(values[1]["value"], "no profile for [email]");
        assert_eq!(values[1]["module"], "auth");
        assert_eq!(values[2], json!({"type": "Error"}));
        assert_eq!(values[3], "not an entry");
    }

    #[test]
    fn test_sanitizes_single_quoted_exception_values() {
        let out = scrub(json!({
            "exception": {"values": [
                {"type": "Error", "value": "Failed to save message: 'Help me stay sober'"},
                {"type": "Error", "value": "can't reach 'o'brien@example.com'"}
            ]}
        }));

        let values = &out["exception"]["values"];
        assert_eq!(values[0]["value"], "Failed to save message: '[Filtered]'");
        assert_eq!(values[1]["value"], "can't reach '[Filtered]'");
    }

    #[test]
    fn test_unrelated_fields_pass_through() {
        let input = json!({"level": "error", "tags": {"screen": "tasks"}, "extra": [1, 2]});
        assert_eq!(scrub(input.clone()), input);
    }

    #[test]
    fn test_non_mapping_event_passes_through() {
        assert_eq!(scrub(json!("just a string")), json!("just a string"));
        assert_eq!(scrub(json!(null)), json!(null));
        assert_eq!(scrub(json!([1, 2, 3])), json!([1, 2, 3]));
    }

    #[test]
    fn test_circular_request_data() {
        let circular: Mapping = [("name", "test"), ("user_id", "123")].into_iter().collect();
        circular.insert("self", circular.clone());
        let request: Mapping = [("data", circular)].into_iter().collect();
        let event: Mapping = [("request", request)].into_iter().collect();

        let out = Scrubber::new().before_send(&Value::Mapping(event)).unwrap();
        let data = out.pointer(&["request", "data"]).unwrap();
        assert_eq!(data.get("user_id").unwrap().as_str(), Some("123"));
        assert_eq!(data.get("self").unwrap().as_str(), Some(CIRCULAR_MARKER));
    }

    #[test]
    fn test_original_event_unchanged() {
        let input = json!({
            "message": "mail a@b.io",
            "request": {"data": {"message": "secret"}},
            "user": {"id": "1", "email": "a@b.io"},
            "exception": {"values": [{"type": "E", "value": "\"quoted\""}]}
        });
        let event = Value::from(input.clone());

        let _ = Scrubber::new().before_send(&event);
        assert_eq!(event.to_json(), input);
    }

    #[test]
    fn test_rescrub_is_noop() {
        let scrubber = Scrubber::new();
        let event = Value::from(json!({
            "message": "Error for a@b.io",
            "request": {"data": {"notes": "x", "nested": {"token": "t"}}},
            "user": {"id": "u", "email": "a@b.io"},
            "exception": {"values": [{"type": "E", "value": "saved \"x\" for a@b.io"}]}
        }));

        let once = scrubber.before_send(&event).unwrap();
        let twice = scrubber.before_send(&once).unwrap();
        assert_eq!(once.to_json(), twice.to_json());
    }
}
