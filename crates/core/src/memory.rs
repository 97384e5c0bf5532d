//! Per-user memory: free-form key/value notes threaded across steps.
//!
//! A [`UserMemory`] is the memory of a single user. Keys are kept in a
//! `BTreeMap` so the rendered text block is byte-identical for identical
//! contents, which keeps prompts stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of keys generated by [`UserMemory::remember`].
pub const MEMORY_KEY_PREFIX: &str = "memory_";

/// The key/value memory of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserMemory {
    entries: BTreeMap<String, String>,
}

impl UserMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or overwrite an explicit key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Store `value` under the next free `memory_N` key and return that key.
    ///
    /// N starts at `len() + 1` and moves past keys that are already taken,
    /// so an existing entry is never overwritten.
    pub fn remember(&mut self, value: impl Into<String>) -> String {
        let key = self.next_key();
        self.entries.insert(key.clone(), value.into());
        key
    }

    /// The key the next [`remember`](Self::remember) call will use.
    pub fn next_key(&self) -> String {
        let mut n = self.entries.len() + 1;
        loop {
            let key = format!("{MEMORY_KEY_PREFIX}{n}");
            if !self.entries.contains_key(&key) {
                return key;
            }
            n += 1;
        }
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

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Render as a text block for the instruction prompt.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "(empty)".into();
        }
        self.entries
            .iter()
            .map(|(k, v)| format!("- {k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<BTreeMap<String, String>> for UserMemory {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl From<UserMemory> for BTreeMap<String, String> {
    fn from(memory: UserMemory) -> Self {
        memory.entries
    }
}
