// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DSL Commands
//!
//! `path[cmd:v,cmd2:v2]` parses into a `(path, Commands)` pair. `Commands` is
//! an order-preserving map: handlers iterate it, and the suggestion engine
//! needs to report "the key you probably meant" against the order the user
//! wrote things in, not an arbitrary hash order.

use indexmap::IndexMap;

/// A single parsed `key:value` pair from the bracket DSL, before any
/// handler-specific type coercion has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DslCommand {
    pub key: String,
    pub value: String,
}

/// Order-preserving, duplicate-free map from DSL key to raw string value.
///
/// Construction enforces "last wins" for duplicate keys (§4.1); the
/// duplicate-key warning itself is surfaced by the caller (the parser),
/// since only it knows whether a key was actually overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commands(IndexMap<String, String>);

impl Commands {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Inserts a command, returning the previous value if this key was
    /// already present (the "last wins" case callers should warn about).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Parses a command's value as a boolean, accepting the usual DSL
    /// spellings (`true`/`false`, `1`/`0`, `yes`/`no`).
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.parse().ok())
    }
}

impl FromIterator<(String, String)> for Commands {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Commands {
    type Item = (&'a str, &'a str);
    type IntoIter = std::vec::IntoIter<(&'a str, &'a str)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut c = Commands::new();
        assert_eq!(c.insert("pages", "1-3"), None);
        assert_eq!(c.insert("pages", "1-5"), Some("1-3".to_string()));
        assert_eq!(c.get("pages"), Some("1-5"));
    }

    #[test]
    fn bool_coercion_accepts_common_spellings() {
        let mut c = Commands::new();
        c.insert("images", "false");
        c.insert("rotate_flag", "yes");
        assert_eq!(c.get_bool("images"), Some(false));
        assert_eq!(c.get_bool("rotate_flag"), Some(true));
        assert_eq!(c.get_bool("missing"), None);
    }
}
