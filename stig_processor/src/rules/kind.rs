//! Rule kinds and check-content value extraction

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Kind of setting a rule audits; selects how a value is read from check-content
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RuleKind {
    Registry,
    AuditPolicy,
    AccountPolicy,
    Permission,
    #[default]
    Manual,
}

/// Outcome of reading a concrete value from check-content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    None,
    Single(String),
    /// Several distinct candidates; the organization has to pick
    Ambiguous(Vec<String>),
}

impl Extraction {
    fn from_candidates(candidates: Vec<String>) -> Self {
        let mut seen = BTreeSet::new();
        let distinct: Vec<String> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();

        match distinct.len() {
            0 => Extraction::None,
            1 => Extraction::Single(distinct.into_iter().next().unwrap_or_default()),
            _ => Extraction::Ambiguous(distinct),
        }
    }

    pub fn single(&self) -> Option<&str> {
        match self {
            Extraction::Single(value) => Some(value),
            _ => None,
        }
    }
}

struct Patterns {
    registry: Regex,
    registry_value: Regex,
    hex_with_decimal: Regex,
    audit: Regex,
    account: Regex,
    permission: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        registry: Regex::new(r"(?i)(registry hive|registry path|\bHKEY_[A-Z_]+)")
            .expect("registry pattern is valid"),
        registry_value: Regex::new(r"^Value:\s*(.+)$").expect("value pattern is valid"),
        hex_with_decimal: Regex::new(r"^0x[0-9a-fA-F]+\s*\((\d+)\)$")
            .expect("hex pattern is valid"),
        audit: Regex::new(r"(?i)>>.*-\s*(success|failure)\s*$").expect("audit pattern is valid"),
        account: Regex::new(r#"(?i)if the value for "[^"]+" is [^"]*"([^"]*)""#)
            .expect("account pattern is valid"),
        permission: Regex::new(
            r"(?i)^([^:]+?)\s+-\s+(full control|modify|read & execute|read|write|list folder contents)\b.*$",
        )
        .expect("permission pattern is valid"),
    })
}

impl RuleKind {
    /// Classify a rule from its normalized check-content
    pub fn detect(check_lines: &[String]) -> Self {
        let p = patterns();
        if check_lines.iter().any(|l| p.registry.is_match(l)) {
            RuleKind::Registry
        } else if check_lines.iter().any(|l| p.audit.is_match(l)) {
            RuleKind::AuditPolicy
        } else if check_lines.iter().any(|l| p.account.is_match(l)) {
            RuleKind::AccountPolicy
        } else if check_lines.iter().any(|l| p.permission.is_match(l)) {
            RuleKind::Permission
        } else {
            RuleKind::Manual
        }
    }

    /// Read the expected value for this kind of rule
    pub fn extract_value(&self, check_lines: &[String]) -> Extraction {
        let p = patterns();
        match self {
            RuleKind::Registry => Extraction::from_candidates(
                check_lines
                    .iter()
                    .filter_map(|l| p.registry_value.captures(l))
                    .map(|c| registry_value(c[1].trim()))
                    .collect(),
            ),
            RuleKind::AuditPolicy => Extraction::from_candidates(
                check_lines
                    .iter()
                    .filter_map(|l| p.audit.captures(l))
                    .map(|c| title_case(&c[1]))
                    .collect(),
            ),
            RuleKind::AccountPolicy => Extraction::from_candidates(
                check_lines
                    .iter()
                    .filter_map(|l| p.account.captures(l))
                    .map(|c| c[1].trim().to_string())
                    .collect(),
            ),
            RuleKind::Permission => {
                let entries: Vec<String> = check_lines
                    .iter()
                    .filter_map(|l| p.permission.captures(l))
                    .map(|c| format!("{} - {}", c[1].trim(), &c[2]))
                    .collect();
                if entries.is_empty() {
                    Extraction::None
                } else {
                    Extraction::Single(entries.join("; "))
                }
            }
            RuleKind::Manual => Extraction::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Registry => "Registry",
            RuleKind::AuditPolicy => "AuditPolicy",
            RuleKind::AccountPolicy => "AccountPolicy",
            RuleKind::Permission => "Permission",
            RuleKind::Manual => "Manual",
        }
    }
}

/// `0x00000001 (1)` reads as `1`
fn registry_value(raw: &str) -> String {
    match patterns().hex_with_decimal.captures(raw) {
        Some(c) => c[1].to_string(),
        None => raw.to_string(),
    }
}

fn title_case(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Registry" => Ok(RuleKind::Registry),
            "AuditPolicy" => Ok(RuleKind::AuditPolicy),
            "AccountPolicy" => Ok(RuleKind::AccountPolicy),
            "Permission" => Ok(RuleKind::Permission),
            "Manual" => Ok(RuleKind::Manual),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
