use super::handler::SchemaViolation;
use stig_core::file_processor::FileProcessorError;
use stig_core::logging::{codes, Code};

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema file not found: {path}")]
    SchemaFileMissing { path: String },

    #[error("Schema could not be parsed: {message}")]
    SchemaParse { message: String },

    #[error("Schema references undeclared {kind} '{name}'")]
    UnresolvedReference { kind: &'static str, name: String },

    #[error("Document is not well-formed XML: {message}")]
    DocumentParse { message: String },

    #[error(transparent)]
    File(#[from] FileProcessorError),

    #[error("Schema violation at {} line {}: {}", .0.path, .0.line, .0.message)]
    Violation(SchemaViolation),

    #[error("Element nesting deeper than {max} at {path}")]
    DepthExceeded { path: String, max: usize },
}

impl SchemaError {
    pub fn error_code(&self) -> Code {
        match self {
            SchemaError::SchemaFileMissing { .. } => codes::schema::SCHEMA_FILE_MISSING,
            SchemaError::SchemaParse { .. } => codes::schema::SCHEMA_PARSE_ERROR,
            SchemaError::UnresolvedReference { .. } => codes::schema::UNRESOLVED_REFERENCE,
            SchemaError::DocumentParse { .. } => codes::schema::DOCUMENT_PARSE_ERROR,
            SchemaError::File(e) => e.error_code(),
            SchemaError::Violation(_) | SchemaError::DepthExceeded { .. } => {
                codes::schema::SCHEMA_VIOLATION
            }
        }
    }

    pub fn severity(&self) -> codes::Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }
}
