use crate::schema::{SchemaError, SchemaViolation};
use stig_core::file_processor::FileProcessorError;
use stig_core::logging::{codes, Code};

#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    File(#[from] FileProcessorError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{path} failed validation with {} violation(s)", .violations.len())]
    Invalid {
        path: String,
        violations: Vec<SchemaViolation>,
    },

    #[error("Root element '{root}' is not a Benchmark")]
    NotABenchmark { root: String },

    #[error("{context} has no {field} (line {line})")]
    MissingField {
        context: String,
        field: &'static str,
        line: u32,
    },

    #[error("{context} has invalid severity '{value}' (line {line})")]
    InvalidSeverity {
        context: String,
        value: String,
        line: u32,
    },
}

impl DocumentError {
    pub fn error_code(&self) -> Code {
        match self {
            DocumentError::File(e) => e.error_code(),
            DocumentError::Schema(e) => e.error_code(),
            DocumentError::Invalid { .. } => codes::schema::SCHEMA_VIOLATION,
            DocumentError::NotABenchmark { .. } => codes::document::NOT_A_BENCHMARK,
            DocumentError::MissingField { .. } => codes::document::MISSING_FIELD,
            DocumentError::InvalidSeverity { .. } => codes::document::INVALID_SEVERITY,
        }
    }

    pub fn severity(&self) -> codes::Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    /// Violations behind this failure, if it was a validation failure
    pub fn violations(&self) -> Vec<SchemaViolation> {
        match self {
            DocumentError::Invalid { violations, .. } => violations.clone(),
            DocumentError::Schema(SchemaError::Violation(violation)) => vec![violation.clone()],
            _ => Vec::new(),
        }
    }

    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            DocumentError::Invalid { .. } | DocumentError::Schema(SchemaError::Violation(_))
        )
    }
}
