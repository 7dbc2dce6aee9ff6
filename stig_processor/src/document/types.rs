//! Benchmark document model

use crate::normalizer::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

/// Rule severity; high/medium/low map to CAT I/II/III
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Severity::High => "CAT I",
            Severity::Medium => "CAT II",
            Severity::Low => "CAT III",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "cat i" => Ok(Severity::High),
            "medium" | "cat ii" => Ok(Severity::Medium),
            "low" | "cat iii" => Ok(Severity::Low),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized check-content and fix text of one rule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NormalizedRule {
    pub check_lines: Vec<String>,
    pub fix_lines: Vec<String>,
}

/// Rule fields as they appear in the document
#[derive(Debug, Clone, Default)]
pub struct RawRule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub fix_text: String,
    pub check_content: String,
    pub severity: Severity,
    normalized: OnceLock<NormalizedRule>,
}

impl RawRule {
    pub fn new(id: impl Into<String>, title: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self.normalized = OnceLock::new();
        self
    }

    pub fn with_fix_text(mut self, fix_text: impl Into<String>) -> Self {
        self.fix_text = fix_text.into();
        self.normalized = OnceLock::new();
        self
    }

    pub fn with_check_content(mut self, check_content: impl Into<String>) -> Self {
        self.check_content = check_content.into();
        self.normalized = OnceLock::new();
        self
    }

    /// Normalized form, built on first access
    pub fn normalized(&self) -> &NormalizedRule {
        self.normalized.get_or_init(|| NormalizedRule {
            check_lines: normalize(&self.check_content),
            fix_lines: normalize(&self.fix_text),
        })
    }
}

/// One STIG group (`V-xxxx`) and its rule
#[derive(Debug, Clone)]
pub struct RuleGroup {
    pub id: String,
    pub title: String,
    pub rule: RawRule,
    /// Source line of the group element
    pub line: u32,
}

impl RuleGroup {
    pub fn new(id: impl Into<String>, title: impl Into<String>, rule: RawRule) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            rule,
            line: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BenchmarkMetadata {
    pub identifier: String,
    pub title: String,
    /// `release-info` text, e.g. "Release: 5 Benchmark Date: 23 Jul 2020"
    pub release_label: String,
    pub version: String,
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkDocument {
    pub path: Option<PathBuf>,
    pub metadata: BenchmarkMetadata,
    pub groups: Vec<RuleGroup>,
}

impl BenchmarkDocument {
    pub fn rule_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, id: &str) -> Option<&RuleGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Force normalization of every rule
    pub fn normalize_all(&self) {
        for group in &self.groups {
            group.rule.normalized();
        }
    }

    /// Display name for logs and reports
    pub fn source_name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => self.metadata.identifier.clone(),
        }
    }
}
