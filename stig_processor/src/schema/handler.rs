//! Pluggable violation handling

use super::error::SchemaError;
use serde::Serialize;
use std::fmt;
use stig_core::config::compile_time::schema::MAX_COLLECTED_VIOLATIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    RootMismatch,
    MissingElement,
    UnexpectedElement,
    TooManyOccurrences,
    OutOfOrder,
    MissingAttribute,
    InvalidValue,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::RootMismatch => "root mismatch",
            ViolationKind::MissingElement => "missing element",
            ViolationKind::UnexpectedElement => "unexpected element",
            ViolationKind::TooManyOccurrences => "too many occurrences",
            ViolationKind::OutOfOrder => "out of order",
            ViolationKind::MissingAttribute => "missing attribute",
            ViolationKind::InvalidValue => "invalid value",
        }
    }
}

/// One structural problem found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub kind: ViolationKind,
    /// Element path, e.g. `/Benchmark/Group[2]/Rule`
    pub path: String,
    /// Offending element or attribute name (`@name` for attributes)
    pub field: String,
    pub message: String,
    pub line: u32,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} '{}' at {}: {}",
            self.line,
            self.kind.as_str(),
            self.field,
            self.path,
            self.message
        )
    }
}

/// Receives each violation as the validator finds it. Returning an error stops
/// validation.
pub trait ViolationHandler {
    fn on_violation(&mut self, violation: SchemaViolation) -> Result<(), SchemaError>;

    /// Violations the handler kept, moved into the validation result
    fn take_violations(&mut self) -> Vec<SchemaViolation> {
        Vec::new()
    }
}

/// First violation is fatal
#[derive(Debug, Default)]
pub struct StrictHandler;

impl ViolationHandler for StrictHandler {
    fn on_violation(&mut self, violation: SchemaViolation) -> Result<(), SchemaError> {
        Err(SchemaError::Violation(violation))
    }
}

/// Keeps every violation up to the collection limit
#[derive(Debug, Default)]
pub struct CollectingHandler {
    violations: Vec<SchemaViolation>,
    dropped: usize,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }

    /// Violations past the collection limit
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl ViolationHandler for CollectingHandler {
    fn on_violation(&mut self, violation: SchemaViolation) -> Result<(), SchemaError> {
        if self.violations.len() < MAX_COLLECTED_VIOLATIONS {
            self.violations.push(violation);
        } else {
            self.dropped += 1;
        }
        Ok(())
    }

    fn take_violations(&mut self) -> Vec<SchemaViolation> {
        std::mem::take(&mut self.violations)
    }
}

impl<F> ViolationHandler for F
where
    F: FnMut(SchemaViolation) -> Result<(), SchemaError>,
{
    fn on_violation(&mut self, violation: SchemaViolation) -> Result<(), SchemaError> {
        self(violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn violation(field: &str) -> SchemaViolation {
        SchemaViolation {
            kind: ViolationKind::MissingElement,
            path: "/Benchmark/Group/Rule".to_string(),
            field: field.to_string(),
            message: "required element is missing".to_string(),
            line: 7,
        }
    }

    #[test]
    fn test_strict_handler_fails_on_first() {
        let mut handler = StrictHandler;
        assert_matches!(
            handler.on_violation(violation("title")),
            Err(SchemaError::Violation(v)) if v.field == "title"
        );
        assert!(handler.take_violations().is_empty());
    }

    #[test]
    fn test_collecting_handler_keeps_all() {
        let mut handler = CollectingHandler::new();
        handler.on_violation(violation("title")).unwrap();
        handler.on_violation(violation("fixtext")).unwrap();

        assert_eq!(handler.violations().len(), 2);
        let taken = handler.take_violations();
        assert_eq!(taken[1].field, "fixtext");
        assert!(handler.violations().is_empty());
        assert_eq!(handler.dropped(), 0);
    }

    #[test]
    fn test_closure_handler() {
        let mut seen = Vec::new();
        let mut handler = |v: SchemaViolation| -> Result<(), SchemaError> {
            seen.push(v.field);
            Ok(())
        };
        handler.on_violation(violation("check-content")).unwrap();
        assert_eq!(seen, ["check-content"]);
    }

    #[test]
    fn test_display() {
        let text = violation("title").to_string();
        assert_eq!(
            text,
            "line 7: missing element 'title' at /Benchmark/Group/Rule: required element is missing"
        );
    }
}
