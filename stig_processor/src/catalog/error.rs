use stig_core::logging::{codes, Code};

#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog root not found: {path}")]
    RootNotFound { path: String },

    #[error("Unknown resource type '{resource}' (known: {})", .known.join(", "))]
    UnknownResource {
        resource: String,
        known: Vec<&'static str>,
    },

    #[error("Invalid filter '{pattern}': {message}")]
    InvalidFilter { pattern: String, message: String },

    #[error("Cannot read catalog under {path}: {message}")]
    Walk { path: String, message: String },
}

impl CatalogError {
    pub fn error_code(&self) -> Code {
        match self {
            CatalogError::RootNotFound { .. } => codes::catalog::ROOT_NOT_FOUND,
            CatalogError::UnknownResource { .. } => codes::catalog::UNKNOWN_RESOURCE,
            CatalogError::InvalidFilter { .. } => codes::catalog::INVALID_FILTER,
            CatalogError::Walk { .. } => codes::catalog::WALK_ERROR,
        }
    }

    pub fn severity(&self) -> codes::Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }
}
