//! Key/value bindings shared by the preprocessor and its callers
//!
//! Collaborators seed a [`KeyValueMap`] with paths and build parameters
//! (`UK_BASE`, architecture, platform, ...) before parsing. `:=` assignments
//! in Kconfig files write back into the same map, so definitions made by an
//! included file stay visible to the rest of the parse.

use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;

/// A single `KEY=VALUE` binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl FromStr for KeyValue {
    type Err = String;

    /// Parse `KEY=VALUE`; the value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing key in '{}'", s));
        }
        Ok(KeyValue::new(key, value.trim()))
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Environment consulted by `$(NAME)` references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueMap {
    values: FxHashMap<String, String>,
}

impl KeyValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Bind `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Extend<KeyValue> for KeyValueMap {
    fn extend<T: IntoIterator<Item = KeyValue>>(&mut self, iter: T) {
        for kv in iter {
            self.values.insert(kv.key, kv.value);
        }
    }
}

impl FromIterator<KeyValue> for KeyValueMap {
    fn from_iter<T: IntoIterator<Item = KeyValue>>(iter: T) -> Self {
        let mut map = KeyValueMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| KeyValue::new(k, v))
            .collect()
    }
}
