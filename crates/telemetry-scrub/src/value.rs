//! JSON-like value model for telemetry payloads.
//!
//! Telemetry SDKs hand over events and breadcrumbs as loosely shaped
//! records. This module models them as a tagged union whose mappings are
//! shared handles, so a payload can reference the same mapping from several
//! places, including from inside itself.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Marker emitted by [`Value::to_json`] in place of a circular reference.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Entries of a [`Mapping`].
pub type Map = BTreeMap<String, Value>;

/// A JSON-like telemetry value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// JSON `null`. Also stands in for an explicit `undefined`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number, kept exactly as parsed.
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// An ordered sequence of values.
    Sequence(Vec<Value>),
    /// A shared key/value mapping.
    Mapping(Mapping),
}

/// A shared, interiorly mutable mapping.
///
/// Cloning a `Mapping` clones the handle, not the entries. Two handles are
/// the same mapping when [`Mapping::id`] is equal.
#[derive(Clone, Default)]
pub struct Mapping(Rc<RefCell<Map>>);

impl Mapping {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing entries in a new mapping.
    #[must_use]
    pub fn from_map(map: Map) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Identity of the underlying mapping.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Whether both handles point at the same mapping.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the entries for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingBorrowed`] if the mapping is currently being
    /// modified elsewhere.
    pub fn try_borrow(&self) -> Result<Ref<'_, Map>> {
        self.0.try_borrow().map_err(|_| Error::MappingBorrowed)
    }

    /// Borrow the entries for writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingBorrowed`] if the mapping is currently
    /// borrowed elsewhere.
    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, Map>> {
        self.0.try_borrow_mut().map_err(|_| Error::MappingBorrowed)
    }

    /// Look up a key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingBorrowed`] if the mapping cannot be read.
    pub fn try_get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.try_borrow()?.get(key).cloned())
    }

    /// Insert an entry, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingBorrowed`] if the mapping cannot be written.
    pub fn try_insert(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        Ok(self.try_borrow_mut()?.insert(key.into(), value.into()))
    }

    /// Remove an entry, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingBorrowed`] if the mapping cannot be written.
    pub fn try_remove(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.try_borrow_mut()?.remove(key))
    }

    /// Create a new mapping holding the same entries.
    ///
    /// Nested mappings are shared with the original, not copied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingBorrowed`] if the mapping cannot be read.
    pub fn try_copy(&self) -> Result<Self> {
        Ok(Self::from_map(self.try_borrow()?.clone()))
    }

    /// Look up a key. Returns `None` if the mapping cannot be read.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.try_get(key).ok().flatten()
    }

    /// Insert an entry, returning the previous value.
    ///
    /// # Panics
    ///
    /// Panics if the mapping is currently borrowed.
    #[cfg(test)]
    pub(crate) fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> std::rc::Weak<RefCell<Map>> {
        Rc::downgrade(&self.0)
    }

    /// Whether the mapping holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.try_borrow().is_ok_and(|map| map.contains_key(key))
    }

    /// Number of entries, or zero if the mapping cannot be read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.try_borrow().map_or(0, |map| map.len())
    }

    /// Whether the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in order, or nothing if the mapping cannot be read.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.try_borrow()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// Entries are left out: a mapping may contain itself.
impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Mapping");
        debug.field("id", &format_args!("{:#x}", self.id()));
        match self.try_borrow() {
            Ok(map) => debug.field("keys", &map.keys().collect::<Vec<_>>()),
            Err(_) => debug.field("keys", &"<borrowed>"),
        };
        debug.finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Value {
    /// A new, empty mapping value.
    #[must_use]
    pub fn mapping() -> Self {
        Self::Mapping(Mapping::new())
    }

    /// Look up `key` if this is a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_mapping().and_then(|mapping| mapping.get(key))
    }

    /// Follow a path of keys through nested mappings.
    #[must_use]
    pub fn pointer(&self, path: &[&str]) -> Option<Value> {
        path.iter()
            .try_fold(self.clone(), |current, key| current.get(key))
    }

    /// The string slice, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The mapping handle, if this is a mapping.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// The elements, if this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Convert to a plain JSON tree.
    ///
    /// A mapping that is reached again while it is still being converted is
    /// written as [`CIRCULAR_MARKER`]. Shared, non-circular mappings are
    /// written out at every place they occur.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = HashSet::new();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut HashSet<usize>) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_inner(path)).collect())
            }
            Self::Mapping(mapping) => {
                let id = mapping.id();
                if !path.insert(id) {
                    return serde_json::Value::String(CIRCULAR_MARKER.to_string());
                }
                let object = match mapping.try_borrow() {
                    Ok(map) => map
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json_inner(path)))
                        .collect(),
                    Err(_) => serde_json::Map::new(),
                };
                path.remove(&id);
                serde_json::Value::Object(object)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(object) => Self::Mapping(object.into_iter().collect()),
        }
    }
}

impl From<Mapping> for Value {
    fn from(mapping: Mapping) -> Self {
        Self::Mapping(mapping)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}
