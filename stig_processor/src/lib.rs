//! Benchmark processing for STIG rule data
//!
//! Benchmarks are validated against their XSD before any field is read, rule
//! text is normalized into lines, and every rule becomes a canonical,
//! de-duplicated [`RuleRecord`](rules::RuleRecord) with organization and
//! hard-coded overrides applied.
//!
//! ```no_run
//! use std::path::Path;
//! use stig_processor::{BatchProcessor, ProcessorConfig};
//!
//! let config = ProcessorConfig::new("schema/U_XCCDF_Benchmark.xsd").collecting();
//! let batch = BatchProcessor::new(config)?;
//! let results = batch.process_directory(Path::new("StigData/Archive"))?;
//! stig_processor::write_records_json(&results.records, Path::new("records.json"))?;
//! # Ok::<(), stig_processor::BatchError>(())
//! ```

pub mod batch;
pub mod catalog;
pub mod config;
pub mod document;
pub mod normalizer;
pub mod overrides;
pub mod rules;
pub mod schema;

pub use batch::{
    records_to_json, write_records_json, BatchConfig, BatchError, BatchProcessor, BatchResults,
    DocumentFailure,
};
pub use catalog::{build_version_table, cross_check_versions, list_catalog, CatalogIndex};
pub use config::{ProcessorConfig, ValidationMode};
pub use document::{load_benchmark, BenchmarkDocument};
pub use normalizer::normalize;
pub use overrides::{HardCodedValues, OrganizationSettings};
pub use rules::{RecordResolver, RuleContract, RuleRecord};
pub use schema::{validate, validate_collecting, validate_with, Schema};

use stig_core::logging::codes;

/// Initialize shared logging and check that every processor code is registered
pub fn init() -> Result<(), String> {
    if !stig_core::logging::is_initialized() {
        stig_core::init()?;
    }

    let processor_codes = [
        codes::schema::SCHEMA_FILE_MISSING,
        codes::schema::SCHEMA_PARSE_ERROR,
        codes::schema::UNRESOLVED_REFERENCE,
        codes::schema::DOCUMENT_PARSE_ERROR,
        codes::schema::SCHEMA_VIOLATION,
        codes::document::MISSING_FIELD,
        codes::document::INVALID_SEVERITY,
        codes::document::NOT_A_BENCHMARK,
        codes::catalog::ROOT_NOT_FOUND,
        codes::catalog::UNKNOWN_RESOURCE,
        codes::catalog::MALFORMED_FILE_NAME,
        codes::catalog::INVALID_FILTER,
        codes::catalog::WALK_ERROR,
        codes::rules::DUPLICATE_IDENTIFIER,
        codes::rules::INVALID_TRANSITION,
        codes::rules::RECORD_FROZEN,
        codes::rules::INVALID_FLAT_RECORD,
        codes::rules::SETTINGS_LOAD_ERROR,
        codes::batch::DIRECTORY_NOT_FOUND,
        codes::batch::NO_FILES_FOUND,
        codes::batch::TOO_MANY_FILES,
        codes::batch::THREAD_ERROR,
        codes::batch::DOCUMENT_FAILED,
        codes::batch::OUTPUT_ERROR,
    ];

    for code in &processor_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Processor error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init() {
        assert!(super::init().is_ok());
        assert!(super::init().is_ok());
    }
}
