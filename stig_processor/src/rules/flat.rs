//! Flat string map form of a finalized record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field names of the flat record, in camelCase as emitted
pub mod keys {
    pub const ID: &str = "id";
    pub const RULE_ID: &str = "ruleId";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const SEVERITY: &str = "severity";
    pub const KIND: &str = "kind";
    pub const CHECK_CONTENT: &str = "checkContent";
    pub const FIX_TEXT: &str = "fixText";
    pub const IS_DUPLICATE: &str = "isDuplicate";
    pub const DUPLICATE_OF: &str = "duplicateOf";
    pub const STATUS: &str = "status";
    pub const ORGANIZATION_VALUE_REQUIRED: &str = "organizationValueRequired";
    pub const HARD_CODED_VALUE: &str = "hardCodedValue";
    pub const RESOLVED_VALUE: &str = "resolvedValue";
}

/// Sorted key/value view of a record. Absent optional fields have no key;
/// line lists are joined with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord(BTreeMap<String, String>);

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn insert_optional(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn insert_lines(&mut self, key: &str, lines: &[String]) {
        self.insert(key, lines.join("\n"));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn lines(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|joined| {
            if joined.is_empty() {
                Vec::new()
            } else {
                joined.split('\n').map(str::to_string).collect()
            }
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for FlatRecord {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
