//! Batch-wide registry of rule identifiers

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Result of claiming an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    First,
    /// `occurrence` counts duplicates from 1
    Duplicate { first: String, occurrence: usize },
}

/// Identifiers seen so far, with how many times each was claimed
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    seen: Mutex<BTreeMap<String, usize>>,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-if-absent; the check and the insert happen under one lock
    pub fn claim(&self, id: &str) -> Claim {
        let mut seen = self.seen.lock().unwrap();
        match seen.get_mut(id) {
            Some(count) => {
                *count += 1;
                Claim::Duplicate {
                    first: id.to_string(),
                    occurrence: *count - 1,
                }
            }
            None => {
                seen.insert(id.to_string(), 1);
                Claim::First
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.lock().unwrap().contains_key(id)
    }

    pub fn occurrences(&self, id: &str) -> usize {
        self.seen.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of claims that were duplicates
    pub fn duplicate_count(&self) -> usize {
        self.seen
            .lock()
            .unwrap()
            .values()
            .map(|count| count - 1)
            .sum()
    }
}
