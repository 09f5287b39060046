//! Front-matter encoding.
//!
//! Every Markdown file this crate writes starts with a `---`-delimited block
//! of `key: value` lines. Keys keep insertion order; defaults are merged
//! in only for keys that are not already present.

use indexmap::IndexMap;
use std::fmt;

pub const DELIMITER: &str = "---";

/// Keys every converted document carries unless the source sets them.
pub const DEFAULT_FIELDS: &[(&str, &str)] = &[("layout", "default")];

/// An insertion-ordered string map serialised as a YAML block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: IndexMap<String, String>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, keeping its original position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Set `key` only if it is not present yet.
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Merge a default key set without overwriting anything.
    pub fn with_defaults<'a>(mut self, defaults: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (key, value) in defaults {
            self.insert_default(key, value);
        }
        self
    }

    /// Merge another map without overwriting existing keys.
    pub fn merge_missing(&mut self, other: &FrontMatter) {
        for (key, value) in &other.entries {
            self.insert_default(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render the delimited block. An empty map renders as `""`.
    pub fn to_yaml_block(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = String::from(DELIMITER);
        out.push('\n');
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out
    }

    /// Front-matter block followed by `body`.
    pub fn document(&self, body: &str) -> String {
        let mut out = self.to_yaml_block();
        out.push_str(body);
        if !body.is_empty() && !body.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FrontMatter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fm = FrontMatter::new();
        for (k, v) in iter {
            fm.insert(k, v);
        }
        fm
    }
}

impl fmt::Display for FrontMatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_yaml_block())
    }
}
