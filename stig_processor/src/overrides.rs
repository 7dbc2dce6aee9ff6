//! Organization settings and hard-coded rule values
//!
//! ```toml
//! # organization settings
//! ignore = ["V-1001"]
//!
//! [exceptions]
//! V-1002 = "Disabled"
//! V-1003 = 14
//! ```
//!
//! ```toml
//! # hard-coded values
//! [values]
//! V-1000 = "Enabled"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use stig_core::file_processor::{FileProcessor, FileProcessorError};
use stig_core::log_error;
use stig_core::logging::{codes, Code};

#[derive(Debug, Clone, thiserror::Error)]
pub enum OverrideError {
    #[error(transparent)]
    File(#[from] FileProcessorError),

    #[error("Invalid settings in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Value for {id} must be a string, number or boolean, found {found}")]
    UnsupportedValue { id: String, found: &'static str },
}

impl OverrideError {
    pub fn error_code(&self) -> Code {
        match self {
            OverrideError::File(e) => e.error_code(),
            OverrideError::Parse { .. } | OverrideError::UnsupportedValue { .. } => {
                codes::rules::SETTINGS_LOAD_ERROR
            }
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }
}

/// Organization-supplied ignore list and exception values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationSettings {
    pub ignore: BTreeSet<String>,
    pub exceptions: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawOrganizationSettings {
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(default)]
    exceptions: BTreeMap<String, toml::Value>,
}

impl OrganizationSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, OverrideError> {
        Self::parse(content, "<inline>")
    }

    pub fn load(path: &Path) -> Result<Self, OverrideError> {
        let file = FileProcessor::new().process_file(path)?;
        Self::parse(&file.source, &path.display().to_string()).inspect_err(|e| {
            log_error!(e.error_code(), &e.to_string(), "path" => path.display());
        })
    }

    fn parse(content: &str, origin: &str) -> Result<Self, OverrideError> {
        let raw: RawOrganizationSettings =
            toml::from_str(content).map_err(|e| OverrideError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            ignore: raw.ignore.into_iter().collect(),
            exceptions: scalar_map(raw.exceptions)?,
        })
    }

    pub fn with_ignored(mut self, id: impl Into<String>) -> Self {
        self.ignore.insert(id.into());
        self
    }

    pub fn with_exception(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.exceptions.insert(id.into(), value.into());
        self
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignore.contains(id)
    }

    pub fn exception(&self, id: &str) -> Option<&str> {
        self.exceptions.get(id).map(String::as_str)
    }
}

/// Rule values fixed by the resource author; they win over everything else
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HardCodedValues {
    pub values: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawHardCodedValues {
    #[serde(default)]
    values: BTreeMap<String, toml::Value>,
}

impl HardCodedValues {
    pub fn from_toml_str(content: &str) -> Result<Self, OverrideError> {
        Self::parse(content, "<inline>")
    }

    pub fn load(path: &Path) -> Result<Self, OverrideError> {
        let file = FileProcessor::new().process_file(path)?;
        Self::parse(&file.source, &path.display().to_string()).inspect_err(|e| {
            log_error!(e.error_code(), &e.to_string(), "path" => path.display());
        })
    }

    fn parse(content: &str, origin: &str) -> Result<Self, OverrideError> {
        let raw: RawHardCodedValues = toml::from_str(content).map_err(|e| OverrideError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            values: scalar_map(raw.values)?,
        })
    }

    pub fn with_value(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(id.into(), value.into());
        self
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }
}

fn scalar_map(raw: BTreeMap<String, toml::Value>) -> Result<BTreeMap<String, String>, OverrideError> {
    raw.into_iter()
        .map(|(id, value)| {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                toml::Value::Array(_) => {
                    return Err(OverrideError::UnsupportedValue { id, found: "array" })
                }
                toml::Value::Table(_) => {
                    return Err(OverrideError::UnsupportedValue { id, found: "table" })
                }
            };
            Ok((id, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_organization_settings() {
        let settings = OrganizationSettings::from_toml_str(
            r#"
            ignore = ["V-1001", "V-1001"]

            [exceptions]
            V-1002 = "Disabled"
            V-1003 = 14
            V-1004 = true
            "#,
        )
        .unwrap();

        assert!(settings.is_ignored("V-1001"));
        assert_eq!(settings.ignore.len(), 1);
        assert_eq!(settings.exception("V-1002"), Some("Disabled"));
        assert_eq!(settings.exception("V-1003"), Some("14"));
        assert_eq!(settings.exception("V-1004"), Some("true"));
        assert_eq!(settings.exception("V-9999"), None);
    }

    #[test]
    fn test_empty_settings() {
        let settings = OrganizationSettings::from_toml_str("").unwrap();
        assert_eq!(settings, OrganizationSettings::default());
    }

    #[test]
    fn test_rejects_structured_values() {
        assert_matches!(
            OrganizationSettings::from_toml_str("[exceptions]\nV-1 = [1, 2]\n"),
            Err(OverrideError::UnsupportedValue { id, found: "array" }) if id == "V-1"
        );
        assert_matches!(
            HardCodedValues::from_toml_str("values = 3"),
            Err(OverrideError::Parse { .. })
        );
    }

    #[test]
    fn test_load_hard_coded_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("WindowsServer.hardcoded.toml");
        fs::write(&path, "[values]\nV-1000 = \"Enabled\"\n").unwrap();

        let values = HardCodedValues::load(&path).unwrap();
        assert_eq!(values.get("V-1000"), Some("Enabled"));

        let missing = HardCodedValues::load(&dir.path().join("absent.toml"));
        assert_matches!(missing, Err(OverrideError::File(_)));
    }

    #[test]
    fn test_builders() {
        let settings = OrganizationSettings::default()
            .with_ignored("V-1")
            .with_exception("V-2", "0");
        assert!(settings.is_ignored("V-1"));
        assert_eq!(settings.exception("V-2"), Some("0"));
        assert_eq!(HardCodedValues::default().with_value("V-3", "1").get("V-3"), Some("1"));
    }
}
