use crate::file_processor::FileProcessorError;
use crate::lexical::LexerError;
use crate::logging::{codes, Code};
use crate::syntax::SyntaxError;
use crate::utils::Span;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    File(#[from] FileProcessorError),

    #[error(transparent)]
    Lexical(#[from] LexerError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("No configuration definition found")]
    ConfigurationNotFound,

    #[error("Expected one configuration definition, found {}: {}", .names.len(), .names.join(", "))]
    AmbiguousConfiguration { names: Vec<String> },

    #[error("Parameter '{parameter}' is not declared")]
    ParameterNotFound { parameter: String },

    #[error("Parameter '{parameter}' has no [{attribute}()] constraint")]
    ConstraintNotFound { parameter: String, attribute: String },

    #[error("Parameter '{parameter}' lists a non-literal allowed value at {span}")]
    NonLiteralValue { parameter: String, span: Span },
}

impl MetadataError {
    pub fn error_code(&self) -> Code {
        match self {
            MetadataError::File(e) => e.error_code(),
            MetadataError::Lexical(e) => e.error_code(),
            MetadataError::Syntax(e) => e.error_code(),
            MetadataError::ConfigurationNotFound => codes::metadata::CONFIGURATION_NOT_FOUND,
            MetadataError::AmbiguousConfiguration { .. } => {
                codes::metadata::AMBIGUOUS_CONFIGURATION
            }
            MetadataError::ParameterNotFound { .. } => codes::metadata::PARAMETER_NOT_FOUND,
            MetadataError::ConstraintNotFound { .. } => codes::metadata::CONSTRAINT_NOT_FOUND,
            MetadataError::NonLiteralValue { .. } => codes::metadata::NON_LITERAL_VALUE,
        }
    }

    pub fn severity(&self) -> codes::Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    /// Source location, when the failure points at script text
    pub fn span(&self) -> Option<Span> {
        match self {
            MetadataError::Syntax(e) => e.span(),
            MetadataError::NonLiteralValue { span, .. } => Some(*span),
            _ => None,
        }
    }
}
