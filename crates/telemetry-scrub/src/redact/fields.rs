//! Field-name redaction over nested values.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::FILTERED_PLACEHOLDER;
use crate::config::ScrubConfig;
use crate::error::Result;
use crate::value::{Map, Mapping, Value, CIRCULAR_MARKER};

/// Key names that are always redacted.
pub const SENSITIVE_KEYS: &[&str] = &["message", "content"];

/// Key fragments; any key containing one of these is redacted.
pub const SENSITIVE_KEY_FRAGMENTS: &[&str] =
    &["email", "phone", "password", "token", "secret", "note"];

/// Nesting depth past which containers are replaced outright.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Case-sensitive denylist of field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveKeys {
    exact: Vec<String>,
    fragments: Vec<String>,
}

impl Default for SensitiveKeys {
    fn default() -> Self {
        Self {
            exact: SENSITIVE_KEYS.iter().map(ToString::to_string).collect(),
            fragments: SENSITIVE_KEY_FRAGMENTS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl SensitiveKeys {
    /// Default denylist extended with extra exact names and fragments.
    #[must_use]
    pub fn with_extra(exact: &[String], fragments: &[String]) -> Self {
        let mut keys = Self::default();
        keys.exact.extend(exact.iter().cloned());
        keys.fragments
            .extend(fragments.iter().filter(|f| !f.is_empty()).cloned());
        keys
    }

    /// Whether values under `key` must be redacted.
    #[must_use]
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.exact.iter().any(|k| k == key)
            || self.fragments.iter().any(|f| key.contains(f.as_str()))
    }
}

/// Redact denylisted fields anywhere in `node` using the default denylist.
///
/// # Errors
///
/// Returns [`crate::Error::MappingBorrowed`] if a mapping in `node` is
/// mutably borrowed by the caller.
pub fn redact_sensitive_fields(node: &Value) -> Result<Value> {
    FieldRedactor::default().redact(node)
}

/// Recursive field redactor.
#[derive(Debug, Clone)]
pub struct FieldRedactor {
    keys: SensitiveKeys,
    placeholder: String,
    max_depth: usize,
}

impl Default for FieldRedactor {
    fn default() -> Self {
        Self {
            keys: SensitiveKeys::default(),
            placeholder: FILTERED_PLACEHOLDER.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Traversal state, keyed by input mapping identity.
#[derive(Default)]
struct Walk {
    /// Output for every mapping already redacted.
    done: HashMap<usize, Mapping>,
    /// Mappings on the path from the root to the current node.
    path: HashSet<usize>,
}

impl FieldRedactor {
    /// Build a redactor from `config`.
    #[must_use]
    pub fn from_config(config: &ScrubConfig) -> Self {
        Self {
            keys: SensitiveKeys::with_extra(
                &config.extra_sensitive_keys,
                &config.extra_sensitive_fragments,
            ),
            placeholder: config.filtered_placeholder.clone(),
            max_depth: config.max_depth,
        }
    }

    /// The denylist in use.
    #[must_use]
    pub fn keys(&self) -> &SensitiveKeys {
        &self.keys
    }

    /// Return a redacted copy of `node`.
    ///
    /// Every mapping and sequence in the result is a new container. A
    /// mapping shared by several parents is redacted once and the output
    /// mapping is shared the same way. A reference back to a mapping that
    /// is still being redacted (a cycle) becomes [`CIRCULAR_MARKER`], so the
    /// output is always acyclic and traversal always terminates.
    ///
    /// Depth is bounded: any container nested deeper than the configured
    /// `max_depth` is replaced by the placeholder as a whole, non-sensitive
    /// content included, instead of being traversed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MappingBorrowed`] if a mapping in `node` is
    /// mutably borrowed by the caller.
    pub fn redact(&self, node: &Value) -> Result<Value> {
        self.redact_node(node, 0, &mut Walk::default())
    }

    fn redact_node(&self, node: &Value, depth: usize, walk: &mut Walk) -> Result<Value> {
        match node {
            Value::Mapping(_) | Value::Sequence(_) if depth > self.max_depth => {
                debug!(depth, "Nesting limit reached, subtree filtered");
                Ok(self.filtered())
            }
            Value::Mapping(mapping) => self.redact_mapping(mapping, depth, walk),
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.redact_node(item, depth + 1, walk))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            scalar => Ok(scalar.clone()),
        }
    }

    fn redact_mapping(&self, mapping: &Mapping, depth: usize, walk: &mut Walk) -> Result<Value> {
        let id = mapping.id();
        if walk.path.contains(&id) {
            trace!(depth, "Circular reference cut");
            return Ok(Value::String(CIRCULAR_MARKER.to_string()));
        }
        if let Some(out) = walk.done.get(&id) {
            trace!(depth, "Shared mapping reused");
            return Ok(Value::Mapping(out.clone()));
        }

        walk.path.insert(id);
        let entries = mapping.try_borrow()?;
        let mut redacted = Map::new();
        for (key, value) in entries.iter() {
            let value = if self.keys.is_sensitive(key) {
                trace!(key = %key, depth, "Field filtered");
                self.filtered()
            } else {
                self.redact_node(value, depth + 1, walk)?
            };
            redacted.insert(key.clone(), value);
        }
        drop(entries);
        walk.path.remove(&id);

        let out = Mapping::from_map(redacted);
        walk.done.insert(id, out.clone());
        Ok(Value::Mapping(out))
    }

    fn filtered(&self) -> Value {
        Value::String(self.placeholder.clone())
    }
}
