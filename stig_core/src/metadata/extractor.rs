//! Static metadata extraction from DSC resource scripts
//!
//! Scripts are tokenized and parsed, never executed. The tree is only read.

use super::error::MetadataError;
use crate::config::runtime::MetadataPreferences;
use crate::file_processor::FileProcessor;
use crate::lexical::LexicalAnalyzer;
use crate::logging::codes;
use crate::syntax::{ParameterAst, ScriptBlockAst, ScriptParser};
use crate::{log_error, log_success};
use serde::Serialize;
use std::path::Path;

/// What a resource script declares about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceMetadata {
    pub configuration_names: Vec<String>,
    pub version_values: Vec<String>,
}

impl ResourceMetadata {
    pub fn supports_version(&self, version: &str) -> bool {
        self.version_values.iter().any(|v| v == version)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    preferences: MetadataPreferences,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(preferences: MetadataPreferences) -> Self {
        Self { preferences }
    }

    pub fn with_version_parameter(mut self, name: &str) -> Self {
        self.preferences.version_parameter_name = name.to_string();
        self
    }

    pub fn parse(&self, source: &str) -> Result<ScriptBlockAst, MetadataError> {
        let tokens = LexicalAnalyzer::new().tokenize(source)?;
        Ok(ScriptParser::new(tokens).parse_script()?)
    }

    pub fn extract_configuration_name(&self, source: &str) -> Result<String, MetadataError> {
        let script = self.parse(source)?;
        self.configuration_name(&script)
    }

    pub fn extract_version_validate_set(&self, source: &str) -> Result<Vec<String>, MetadataError> {
        let script = self.parse(source)?;
        self.version_values(&script)
    }

    /// Configuration names and version values from one parse of the source
    pub fn extract(&self, source: &str) -> Result<ResourceMetadata, MetadataError> {
        let script = self.parse(source)?;

        let configuration_names: Vec<String> = script
            .configurations()
            .iter()
            .map(|c| c.name.value.clone())
            .collect();
        if configuration_names.is_empty() {
            return Err(report(MetadataError::ConfigurationNotFound));
        }

        let version_values = self.version_values(&script)?;

        log_success!(codes::success::METADATA_EXTRACTED, "Resource metadata extracted",
            "configurations" => configuration_names.join(","),
            "versions" => version_values.len()
        );

        Ok(ResourceMetadata {
            configuration_names,
            version_values,
        })
    }

    pub fn extract_from_file(&self, path: &Path) -> Result<ResourceMetadata, MetadataError> {
        let file = FileProcessor::new().process_file(path)?;
        self.extract(&file.source)
    }

    /// The single configuration declared anywhere in the script
    pub fn configuration_name(&self, script: &ScriptBlockAst) -> Result<String, MetadataError> {
        let configurations = script.configurations();

        match configurations.as_slice() {
            [] => Err(report(MetadataError::ConfigurationNotFound)),
            [only] => Ok(only.name.value.clone()),
            many => Err(report(MetadataError::AmbiguousConfiguration {
                names: many.iter().map(|c| c.name.value.clone()).collect(),
            })),
        }
    }

    /// Literal values of the version parameter's allowed-values attribute, in declaration order
    pub fn version_values(&self, script: &ScriptBlockAst) -> Result<Vec<String>, MetadataError> {
        let parameter = self.find_version_parameter(script)?;
        let attribute_name = &self.preferences.allowed_values_attribute;

        let attribute = parameter.attribute(attribute_name).ok_or_else(|| {
            report(MetadataError::ConstraintNotFound {
                parameter: parameter.name.value.clone(),
                attribute: attribute_name.clone(),
            })
        })?;

        attribute
            .positional
            .iter()
            .map(|value| {
                value.literal_text().map(str::to_string).ok_or_else(|| {
                    report(MetadataError::NonLiteralValue {
                        parameter: parameter.name.value.clone(),
                        span: value.span(),
                    })
                })
            })
            .collect()
    }

    fn find_version_parameter<'a>(
        &self,
        script: &'a ScriptBlockAst,
    ) -> Result<&'a ParameterAst, MetadataError> {
        let wanted = &self.preferences.version_parameter_name;

        script
            .parameters()
            .into_iter()
            .find(|p| p.name.value.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                report(MetadataError::ParameterNotFound {
                    parameter: wanted.clone(),
                })
            })
    }
}

fn report(error: MetadataError) -> MetadataError {
    match error.span() {
        Some(span) => log_error!(error.error_code(), &error.to_string(), span = span),
        None => log_error!(error.error_code(), &error.to_string()),
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxError;
    use assert_matches::assert_matches;
    use std::io::Write;

    const FIREWALL: &str = r#"
configuration WindowsFirewall
{
    param
    (
        [Parameter()]
        [ValidateSet('1.7', '1.10')]
        [version]
        $StigVersion,

        [Parameter()]
        [ValidateSet('Domain', 'Private')]
        [string[]]
        $Profile
    )

    Node localhost
    {
        WindowsFirewall BaseLine
        {
            StigVersion = $StigVersion
        }
    }
}
"#;

    #[test]
    fn test_configuration_name() {
        let extractor = MetadataExtractor::new();
        assert_eq!(
            extractor.extract_configuration_name(FIREWALL).unwrap(),
            "WindowsFirewall"
        );
    }

    #[test]
    fn test_missing_and_ambiguous_configuration() {
        let extractor = MetadataExtractor::new();
        assert_matches!(
            extractor.extract_configuration_name("function Get-Rule { }"),
            Err(MetadataError::ConfigurationNotFound)
        );

        let error = extractor
            .extract_configuration_name("Configuration A { }\nif ($x) { Configuration B { } }")
            .unwrap_err();
        assert_matches!(error, MetadataError::AmbiguousConfiguration { ref names } if names == &["A", "B"]);
        assert_eq!(error.error_code(), codes::metadata::AMBIGUOUS_CONFIGURATION);
    }

    #[test]
    fn test_version_values_keep_literal_text_and_order() {
        let extractor = MetadataExtractor::new();
        assert_eq!(
            extractor.extract_version_validate_set(FIREWALL).unwrap(),
            vec!["1.7", "1.10"]
        );
    }

    #[test]
    fn test_parameter_name_is_case_insensitive_and_configurable() {
        let extractor = MetadataExtractor::new();
        let source = "Configuration X { param([ValidateSet('3.1')] $stigversion) }";
        assert_eq!(extractor.extract_version_validate_set(source).unwrap(), vec!["3.1"]);

        let profiles = MetadataExtractor::new().with_version_parameter("Profile");
        assert_eq!(
            profiles.extract_version_validate_set(FIREWALL).unwrap(),
            vec!["Domain", "Private"]
        );
    }

    #[test]
    fn test_first_declaration_wins() {
        let source = r#"
function Get-Helper { param([ValidateSet('helper')] $StigVersion) }
Configuration X { param([ValidateSet('outer')] $StigVersion) }
"#;
        let extractor = MetadataExtractor::new();
        assert_eq!(extractor.extract_version_validate_set(source).unwrap(), vec!["helper"]);
    }

    #[test]
    fn test_parameter_and_constraint_errors() {
        let extractor = MetadataExtractor::new();
        assert_matches!(
            extractor.extract_version_validate_set("Configuration X { param($Other) }"),
            Err(MetadataError::ParameterNotFound { ref parameter }) if parameter == "StigVersion"
        );
        assert_matches!(
            extractor.extract_version_validate_set("Configuration X { param([string] $StigVersion) }"),
            Err(MetadataError::ConstraintNotFound { .. })
        );
        assert_matches!(
            extractor.extract_version_validate_set(
                "Configuration X { param([ValidateSet($a, 'b')] $StigVersion) }"
            ),
            Err(MetadataError::NonLiteralValue { .. })
        );
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        let extractor = MetadataExtractor::new();
        let error = extractor
            .extract_configuration_name("Configuration X {\n  param(\n")
            .unwrap_err();
        assert_matches!(
            error,
            MetadataError::Syntax(SyntaxError::UnmatchedBlockDelimiter { span, .. }) if span.start.line == 2
        );
        assert!(error.span().is_some());
    }

    #[test]
    fn test_extract_from_file() {
        let mut file = tempfile::Builder::new().suffix(".ps1").tempfile().unwrap();
        file.write_all(FIREWALL.as_bytes()).unwrap();

        let metadata = MetadataExtractor::new().extract_from_file(file.path()).unwrap();
        assert_eq!(metadata.configuration_names, vec!["WindowsFirewall"]);
        assert!(metadata.supports_version("1.10"));
        assert!(!metadata.supports_version("1.1"));
    }
}
