//! Consolidated error codes and classification system
//!
//! Single source of truth for all error codes, their metadata, and classification functions.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// File processing error codes
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const EMPTY_FILE: Code = Code::new("E008");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
    pub const TOO_MANY_LINES: Code = Code::new("E013");
}

/// Script lexical analysis error codes
pub mod lexical {
    use super::Code;

    pub const INVALID_CHARACTER: Code = Code::new("E020");
    pub const UNTERMINATED_STRING: Code = Code::new("E021");
    pub const UNTERMINATED_COMMENT: Code = Code::new("E022");
    pub const IDENTIFIER_TOO_LONG: Code = Code::new("E023");
    pub const STRING_TOO_LARGE: Code = Code::new("E024");
    pub const COMMENT_TOO_LONG: Code = Code::new("E025");
    pub const TOO_MANY_TOKENS: Code = Code::new("E026");
}

/// Script syntax error codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const UNEXPECTED_END_OF_INPUT: Code = Code::new("E041");
    pub const EMPTY_TOKEN_STREAM: Code = Code::new("E042");
    pub const MISSING_EOF: Code = Code::new("E043");
    pub const UNMATCHED_DELIMITER: Code = Code::new("E044");
    pub const MAX_RECURSION_DEPTH: Code = Code::new("E045");
    pub const GRAMMAR_VIOLATION: Code = Code::new("E046");
    pub const INTERNAL_PARSER_ERROR: Code = Code::new("E047");
}

/// Resource metadata extraction error codes
pub mod metadata {
    use super::Code;

    pub const CONFIGURATION_NOT_FOUND: Code = Code::new("E060");
    pub const AMBIGUOUS_CONFIGURATION: Code = Code::new("E061");
    pub const PARAMETER_NOT_FOUND: Code = Code::new("E062");
    pub const CONSTRAINT_NOT_FOUND: Code = Code::new("E063");
    pub const NON_LITERAL_VALUE: Code = Code::new("E064");
}

/// Schema validation error codes
pub mod schema {
    use super::Code;

    pub const SCHEMA_FILE_MISSING: Code = Code::new("E100");
    pub const SCHEMA_PARSE_ERROR: Code = Code::new("E101");
    pub const UNRESOLVED_REFERENCE: Code = Code::new("E102");
    pub const DOCUMENT_PARSE_ERROR: Code = Code::new("E103");
    pub const SCHEMA_VIOLATION: Code = Code::new("E104");
}

/// Benchmark document error codes
pub mod document {
    use super::Code;

    pub const MISSING_FIELD: Code = Code::new("E120");
    pub const INVALID_SEVERITY: Code = Code::new("E121");
    pub const NOT_A_BENCHMARK: Code = Code::new("E122");
}

/// Catalog index error codes
pub mod catalog {
    use super::Code;

    pub const ROOT_NOT_FOUND: Code = Code::new("E140");
    pub const UNKNOWN_RESOURCE: Code = Code::new("E141");
    pub const MALFORMED_FILE_NAME: Code = Code::new("E142");
    pub const INVALID_FILTER: Code = Code::new("E143");
    pub const WALK_ERROR: Code = Code::new("E144");
}

/// Rule record error codes
pub mod rules {
    use super::Code;

    pub const DUPLICATE_IDENTIFIER: Code = Code::new("E160");
    pub const INVALID_TRANSITION: Code = Code::new("E161");
    pub const RECORD_FROZEN: Code = Code::new("E162");
    pub const INVALID_FLAT_RECORD: Code = Code::new("E163");
    pub const SETTINGS_LOAD_ERROR: Code = Code::new("E164");
}

/// Batch pipeline error codes
pub mod batch {
    use super::Code;

    pub const DIRECTORY_NOT_FOUND: Code = Code::new("E180");
    pub const NO_FILES_FOUND: Code = Code::new("E181");
    pub const TOO_MANY_FILES: Code = Code::new("E182");
    pub const THREAD_ERROR: Code = Code::new("E183");
    pub const DOCUMENT_FAILED: Code = Code::new("E184");
    pub const OUTPUT_ERROR: Code = Code::new("E185");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const SCRIPT_PARSE_COMPLETE: Code = Code::new("I040");
    pub const METADATA_EXTRACTED: Code = Code::new("I060");
    pub const SCHEMA_COMPILED: Code = Code::new("I100");
    pub const VALIDATION_PASSED: Code = Code::new("I101");
    pub const DOCUMENT_LOADED: Code = Code::new("I120");
    pub const CATALOG_INDEXED: Code = Code::new("I140");
    pub const RECORDS_RESOLVED: Code = Code::new("I160");
    pub const BATCH_COMPLETE: Code = Code::new("I180");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

type RegistryRow = (
    &'static str,
    &'static str,
    Severity,
    bool,
    bool,
    &'static str,
    &'static str,
);

// (code, category, severity, recoverable, requires_halt, description, action)
#[rustfmt::skip]
const REGISTRY_ROWS: &[RegistryRow] = &[
    // System
    ("ERR001", "System", Severity::Critical, false, true,
        "Critical internal system error",
        "File a bug report with the failing input"),
    ("ERR002", "System", Severity::Critical, false, true,
        "System initialization failure",
        "Check logging configuration and environment"),
    ("ERR003", "System", Severity::High, false, true,
        "Invalid runtime configuration",
        "Correct the configuration file or STIG_* environment variables"),
    // File processing
    ("E005", "FileProcessing", Severity::High, false, true,
        "File not found",
        "Verify the file path exists"),
    ("E006", "FileProcessing", Severity::Medium, true, false,
        "Unsupported file extension",
        "Use a .ps1, .psm1, .xml or .xsd file"),
    ("E007", "FileProcessing", Severity::High, false, true,
        "File exceeds maximum size",
        "Split the file or raise the compile-time limit"),
    ("E008", "FileProcessing", Severity::Medium, true, false,
        "File is empty",
        "Provide a file with content"),
    ("E009", "FileProcessing", Severity::High, false, true,
        "Permission denied",
        "Check file permissions"),
    ("E010", "FileProcessing", Severity::High, false, true,
        "File is not valid UTF-8",
        "Re-encode the file as UTF-8"),
    ("E011", "FileProcessing", Severity::High, false, true,
        "I/O error while reading file",
        "Check disk and file system health"),
    ("E012", "FileProcessing", Severity::High, false, true,
        "Invalid file path",
        "Provide a path to a regular file"),
    ("E013", "FileProcessing", Severity::High, false, true,
        "File has too many lines",
        "Split the file into smaller units"),
    // Lexical
    ("E020", "Lexical", Severity::High, false, true,
        "Invalid character in script",
        "Remove or escape the character"),
    ("E021", "Lexical", Severity::High, false, true,
        "Unterminated string literal",
        "Close the string literal"),
    ("E022", "Lexical", Severity::High, false, true,
        "Unterminated block comment",
        "Close the comment with #>"),
    ("E023", "Lexical", Severity::Medium, false, true,
        "Identifier exceeds maximum length",
        "Shorten the identifier"),
    ("E024", "Lexical", Severity::Medium, false, true,
        "String literal exceeds maximum size",
        "Shorten the string literal"),
    ("E025", "Lexical", Severity::Medium, false, true,
        "Comment exceeds maximum length",
        "Shorten the comment"),
    ("E026", "Lexical", Severity::High, false, true,
        "Script exceeds maximum token count",
        "Split the script"),
    // Syntax
    ("E040", "Syntax", Severity::High, false, true,
        "Unexpected token",
        "Check the script syntax near the reported position"),
    ("E041", "Syntax", Severity::High, false, true,
        "Unexpected end of input",
        "Complete the unfinished construct"),
    ("E042", "Syntax", Severity::High, false, true,
        "Empty token stream",
        "Provide script content"),
    ("E043", "Syntax", Severity::Critical, false, true,
        "Token stream is missing its end marker",
        "File a bug report; the tokenizer output is inconsistent"),
    ("E044", "Syntax", Severity::High, false, true,
        "Unmatched block delimiter",
        "Balance braces, brackets and parentheses"),
    ("E045", "Syntax", Severity::High, false, true,
        "Maximum nesting depth exceeded",
        "Reduce script block nesting"),
    ("E046", "Syntax", Severity::High, false, true,
        "Grammar violation",
        "Check the construct against PowerShell syntax"),
    ("E047", "Syntax", Severity::Critical, false, true,
        "Internal parser error",
        "File a bug report with the failing script"),
    // Metadata
    ("E060", "Metadata", Severity::High, true, false,
        "No configuration definition found",
        "Declare exactly one Configuration block in the resource script"),
    ("E061", "Metadata", Severity::High, true, false,
        "More than one configuration definition found",
        "Keep a single Configuration block per resource script"),
    ("E062", "Metadata", Severity::High, true, false,
        "Version parameter not declared",
        "Declare the version parameter in the param block"),
    ("E063", "Metadata", Severity::High, true, false,
        "Version parameter has no allowed-values constraint",
        "Add a ValidateSet attribute to the version parameter"),
    ("E064", "Metadata", Severity::Medium, true, false,
        "Allowed-values constraint contains a non-literal value",
        "List the supported versions as string literals"),
    // Schema
    ("E100", "Schema", Severity::Critical, false, true,
        "Schema file not found",
        "Check the schema path"),
    ("E101", "Schema", Severity::Critical, false, true,
        "Schema could not be parsed",
        "Fix the XSD document"),
    ("E102", "Schema", Severity::Critical, false, true,
        "Schema references an undefined type or element",
        "Define the referenced type or element"),
    ("E103", "Schema", Severity::High, false, true,
        "Document is not well-formed XML",
        "Fix the XML document"),
    ("E104", "Schema", Severity::High, true, false,
        "Document violates its schema",
        "Correct the document structure"),
    // Document
    ("E120", "Document", Severity::High, true, false,
        "Benchmark field missing",
        "Add the missing field to the benchmark"),
    ("E121", "Document", Severity::Medium, true, false,
        "Unknown rule severity",
        "Use high, medium or low"),
    ("E122", "Document", Severity::High, false, true,
        "Root element is not a Benchmark",
        "Provide an XCCDF benchmark document"),
    // Catalog
    ("E140", "Catalog", Severity::Critical, false, true,
        "Catalog root not found",
        "Check the catalog root directory"),
    ("E141", "Catalog", Severity::High, false, true,
        "Unknown resource type",
        "Use a resource type from the allow-list"),
    ("E142", "Catalog", Severity::Low, true, false,
        "Catalog file name does not have four fields",
        "Rename the file to Technology-Version-Role-StigVersion"),
    ("E143", "Catalog", Severity::High, false, true,
        "Invalid filter pattern",
        "Correct the regular expression"),
    ("E144", "Catalog", Severity::Medium, true, false,
        "Directory walk error",
        "Check directory permissions"),
    // Rules
    ("E160", "Rules", Severity::Low, true, false,
        "Duplicate rule identifier",
        "Review the duplicate record"),
    ("E161", "Rules", Severity::Critical, false, true,
        "Invalid rule lifecycle transition",
        "File a bug report; resolution steps ran out of order"),
    ("E162", "Rules", Severity::High, false, true,
        "Finalized rule record mutated",
        "File a bug report; finalized records are read-only"),
    ("E163", "Rules", Severity::High, true, false,
        "Flat record cannot be converted back",
        "Check the record for missing or malformed fields"),
    ("E164", "Rules", Severity::High, false, true,
        "Override settings could not be loaded",
        "Fix the settings file"),
    // Batch
    ("E180", "Batch", Severity::High, false, true,
        "Batch directory not found",
        "Check the input directory"),
    ("E181", "Batch", Severity::Medium, true, false,
        "No benchmark documents found",
        "Check the input directory contents"),
    ("E182", "Batch", Severity::High, false, true,
        "Too many documents in batch",
        "Split the batch"),
    ("E183", "Batch", Severity::Critical, false, true,
        "Worker thread failed",
        "File a bug report"),
    ("E184", "Batch", Severity::High, true, false,
        "Benchmark document failed",
        "Inspect the document errors"),
    ("E185", "Batch", Severity::High, false, true,
        "Record output failed",
        "Check the output destination"),
];

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let mut registry = HashMap::new();
        for &(code, category, severity, recoverable, requires_halt, description, action) in
            REGISTRY_ROWS
        {
            registry.insert(
                code,
                ErrorMetadata::new(
                    code,
                    category,
                    severity,
                    recoverable,
                    requires_halt,
                    description,
                    action,
                ),
            );
        }
        registry
    })
}

// ============================================================================
// LOOKUP FUNCTIONS
// ============================================================================

/// Get complete metadata for a code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get error severity from error code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for error code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for error code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get error category from error code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_no_duplicate_rows() {
        assert_eq!(get_error_registry().len(), REGISTRY_ROWS.len());
    }

    #[test]
    fn test_metadata_lookup() {
        assert_eq!(get_category(metadata::AMBIGUOUS_CONFIGURATION.as_str()), "Metadata");
        assert_eq!(get_severity(system::INTERNAL_ERROR.as_str()), Severity::Critical);
        assert!(is_recoverable(catalog::MALFORMED_FILE_NAME.as_str()));
        assert!(requires_halt(schema::SCHEMA_FILE_MISSING.as_str()));
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("E999"), "Unknown error");
        assert_eq!(get_action("E999"), "No specific action available");
        assert_eq!(get_category("E999"), "Unknown");
        assert_eq!(get_severity("E999"), Severity::Medium);
    }

    #[test]
    fn test_success_codes_are_not_errors() {
        assert!(get_error_metadata(success::BATCH_COMPLETE.as_str()).is_none());
    }
}
