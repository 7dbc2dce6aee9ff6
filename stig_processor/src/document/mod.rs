//! Benchmark documents: model, XCCDF extraction and validated loading

pub mod builder;
mod error;
mod parser;
mod types;

pub use error::DocumentError;
pub use parser::parse_benchmark;
pub use types::{BenchmarkDocument, BenchmarkMetadata, NormalizedRule, RawRule, RuleGroup, Severity};

use crate::schema::{self, Schema, ViolationHandler};
use std::path::Path;
use std::time::Instant;
use stig_core::file_processor::FileProcessor;
use stig_core::logging::codes;
use stig_core::{log_error, log_performance};

/// Read, validate and parse a benchmark file.
///
/// The handler decides how violations are treated: a strict handler turns the
/// first one into `DocumentError::Schema`, a collecting handler yields
/// `DocumentError::Invalid` with every violation. Rules are normalized before
/// the document is returned.
pub fn load_benchmark<H>(
    path: &Path,
    schema: &Schema,
    handler: &mut H,
) -> Result<BenchmarkDocument, DocumentError>
where
    H: ViolationHandler + ?Sized,
{
    let start = Instant::now();

    let result = read_validated(path, schema, handler);
    match &result {
        Ok(document) => log_performance!(
            codes::success::DOCUMENT_LOADED,
            "Benchmark loaded",
            duration = start.elapsed(),
            "path" => path.display(),
            "benchmark" => &document.metadata.identifier,
            "groups" => document.rule_count()
        ),
        Err(e) => log_error!(e.error_code(), &e.to_string(), "path" => path.display()),
    }
    result
}

fn read_validated<H>(
    path: &Path,
    schema: &Schema,
    handler: &mut H,
) -> Result<BenchmarkDocument, DocumentError>
where
    H: ViolationHandler + ?Sized,
{
    let file = FileProcessor::new().process_file(path)?;
    let xml = schema::parse_document(&file.source)?;

    let validation = schema::validate_document(&xml, schema, handler)?;
    if !validation.is_valid() {
        return Err(DocumentError::Invalid {
            path: path.display().to_string(),
            violations: validation.violations,
        });
    }

    let mut document = parse_benchmark(&xml)?;
    document.path = Some(path.to_path_buf());
    document.normalize_all();
    Ok(document)
}

/// Parse benchmark text without schema validation
pub fn parse_benchmark_text(text: &str) -> Result<BenchmarkDocument, DocumentError> {
    let xml = schema::parse_document(text)?;
    parse_benchmark(&xml)
}

#[cfg(test)]
mod tests {
    use super::builder::{BenchmarkBuilder, GroupBuilder, RuleElement, SAMPLE_SCHEMA};
    use super::*;
    use crate::schema::{CollectingHandler, SchemaError, StrictHandler};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_valid_benchmark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("U_Sample_STIG_V1R1_Manual-xccdf.xml");
        let xml = BenchmarkBuilder::new("Sample_STIG")
            .group(GroupBuilder::new("V-1000").check_content("Value: 1"))
            .build();
        fs::write(&path, xml).unwrap();

        let schema = Schema::parse(SAMPLE_SCHEMA).unwrap();
        let document = load_benchmark(&path, &schema, &mut StrictHandler).unwrap();

        assert_eq!(document.path.as_deref(), Some(path.as_path()));
        assert_eq!(document.groups[0].rule.normalized().check_lines, ["Value: 1"]);
    }

    #[test]
    fn test_strict_and_collecting_failures() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xml");
        let xml = BenchmarkBuilder::new("Sample_STIG")
            .group(
                GroupBuilder::new("V-1000")
                    .without(RuleElement::FixText)
                    .without(RuleElement::Check),
            )
            .build();
        fs::write(&path, xml).unwrap();
        let schema = Schema::parse(SAMPLE_SCHEMA).unwrap();

        let strict = load_benchmark(&path, &schema, &mut StrictHandler).unwrap_err();
        assert_matches!(strict, DocumentError::Schema(SchemaError::Violation(_)));
        assert!(strict.is_validation_failure());
        assert_eq!(strict.violations().len(), 1);

        let collecting = load_benchmark(&path, &schema, &mut CollectingHandler::new()).unwrap_err();
        assert_matches!(&collecting, DocumentError::Invalid { violations, .. } if violations.len() == 2);
        assert!(collecting.is_validation_failure());
    }

    #[test]
    fn test_missing_file() {
        let schema = Schema::parse(SAMPLE_SCHEMA).unwrap();
        let result = load_benchmark(
            Path::new("/nonexistent/benchmark.xml"),
            &schema,
            &mut StrictHandler,
        );
        assert_matches!(result, Err(DocumentError::File(_)));
    }

    #[test]
    fn test_parse_text() {
        let xml = BenchmarkBuilder::new("Sample_STIG")
            .group(GroupBuilder::new("V-1"))
            .build();
        assert_eq!(parse_benchmark_text(&xml).unwrap().rule_count(), 1);
        assert_matches!(
            parse_benchmark_text("<Benchmark"),
            Err(DocumentError::Schema(SchemaError::DocumentParse { .. }))
        );
    }
}
