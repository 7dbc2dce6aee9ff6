use super::record::RecordState;
use stig_core::logging::{codes, Code};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Record {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: RecordState,
        to: RecordState,
    },

    #[error("Record {id} is finalized and cannot change")]
    Frozen { id: String },

    #[error("Flat record field '{key}' is invalid: {reason}")]
    InvalidFlatRecord { key: String, reason: String },
}

impl RecordError {
    pub fn error_code(&self) -> Code {
        match self {
            RecordError::InvalidTransition { .. } => codes::rules::INVALID_TRANSITION,
            RecordError::Frozen { .. } => codes::rules::RECORD_FROZEN,
            RecordError::InvalidFlatRecord { .. } => codes::rules::INVALID_FLAT_RECORD,
        }
    }

    pub fn severity(&self) -> codes::Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}
