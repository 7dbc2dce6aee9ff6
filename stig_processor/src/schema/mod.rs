//! XSD validation of benchmark documents
//!
//! A document is only trusted after it validates. Callers choose how violations
//! are handled: [`StrictHandler`] aborts on the first, [`CollectingHandler`] keeps
//! them all for the report.

mod error;
mod handler;
mod model;
mod validator;

pub use error::SchemaError;
pub use handler::{
    CollectingHandler, SchemaViolation, StrictHandler, ViolationHandler, ViolationKind,
};
pub use model::{
    AttributeDecl, ComplexType, Content, ElementDecl, ElementParticle, ElementSource, Group,
    Occurs, Particle, Schema, SimpleType, TypeRef,
};
pub use validator::{validate_document, ValidationResult};

pub(crate) use model::line_of;

use std::path::{Path, PathBuf};
use std::time::Instant;
use stig_core::file_processor::FileProcessor;
use stig_core::logging::codes;
use stig_core::{log_debug, log_error, log_performance, log_success};

/// Document to validate
#[derive(Debug, Clone, Copy)]
pub enum DocumentInput<'a> {
    Path(&'a Path),
    Text(&'a str),
    Parsed(&'a roxmltree::Document<'a>),
}

impl<'a> From<&'a Path> for DocumentInput<'a> {
    fn from(path: &'a Path) -> Self {
        DocumentInput::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for DocumentInput<'a> {
    fn from(path: &'a PathBuf) -> Self {
        DocumentInput::Path(path)
    }
}

impl<'a> From<&'a str> for DocumentInput<'a> {
    fn from(text: &'a str) -> Self {
        DocumentInput::Text(text)
    }
}

impl<'a, 'input: 'a> From<&'a roxmltree::Document<'input>> for DocumentInput<'a> {
    fn from(document: &'a roxmltree::Document<'input>) -> Self {
        DocumentInput::Parsed(document)
    }
}

/// Schema to validate against
#[derive(Debug, Clone, Copy)]
pub enum SchemaInput<'a> {
    Path(&'a Path),
    Compiled(&'a Schema),
}

impl<'a> From<&'a Path> for SchemaInput<'a> {
    fn from(path: &'a Path) -> Self {
        SchemaInput::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for SchemaInput<'a> {
    fn from(path: &'a PathBuf) -> Self {
        SchemaInput::Path(path)
    }
}

impl<'a> From<&'a Schema> for SchemaInput<'a> {
    fn from(schema: &'a Schema) -> Self {
        SchemaInput::Compiled(schema)
    }
}

/// Read and compile an XSD file
pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    if !path.exists() {
        let error = SchemaError::SchemaFileMissing {
            path: path.display().to_string(),
        };
        log_error!(error.error_code(), &error.to_string(), "path" => path.display());
        return Err(error);
    }

    let start = Instant::now();
    let file = FileProcessor::new().process_file(path)?;
    let schema = Schema::parse(&file.source).inspect_err(|e| {
        log_error!(e.error_code(), &e.to_string(), "path" => path.display());
    })?;

    log_performance!(
        codes::success::SCHEMA_COMPILED,
        "Schema compiled",
        duration = start.elapsed(),
        "path" => path.display(),
        "global_elements" => schema.global_element_names().len()
    );
    Ok(schema)
}

/// Parse XML text into a document
pub fn parse_document(text: &str) -> Result<roxmltree::Document<'_>, SchemaError> {
    roxmltree::Document::parse(text).map_err(|e| SchemaError::DocumentParse {
        message: e.to_string(),
    })
}

/// Validate with the [`StrictHandler`]: the first violation is returned as
/// `SchemaError::Violation`
pub fn validate<'a>(
    document: impl Into<DocumentInput<'a>>,
    schema: impl Into<SchemaInput<'a>>,
) -> Result<ValidationResult, SchemaError> {
    validate_with(document, schema, &mut StrictHandler)
}

/// Validate with a [`CollectingHandler`]: every violation is listed in the result
pub fn validate_collecting<'a>(
    document: impl Into<DocumentInput<'a>>,
    schema: impl Into<SchemaInput<'a>>,
) -> Result<ValidationResult, SchemaError> {
    validate_with(document, schema, &mut CollectingHandler::new())
}

/// Validate with a caller-supplied handler
pub fn validate_with<'a, H>(
    document: impl Into<DocumentInput<'a>>,
    schema: impl Into<SchemaInput<'a>>,
    handler: &mut H,
) -> Result<ValidationResult, SchemaError>
where
    H: ViolationHandler + ?Sized,
{
    let compiled;
    let schema = match schema.into() {
        SchemaInput::Compiled(schema) => schema,
        SchemaInput::Path(path) => {
            compiled = load_schema(path)?;
            &compiled
        }
    };

    let result = match document.into() {
        DocumentInput::Parsed(document) => validate_document(document, schema, handler),
        DocumentInput::Text(text) => {
            let document = parse_document(text)?;
            validate_document(&document, schema, handler)
        }
        DocumentInput::Path(path) => {
            let file = FileProcessor::new().process_file(path)?;
            let document = parse_document(&file.source)?;
            validate_document(&document, schema, handler)
        }
    };

    match &result {
        Ok(outcome) if outcome.is_valid() => log_success!(
            codes::success::VALIDATION_PASSED,
            "Document validated",
            "root" => &outcome.root,
            "elements" => outcome.elements_checked
        ),
        Ok(outcome) => log_debug!(
            "Document validated with violations",
            "root" => &outcome.root,
            "violations" => outcome.violations.len()
        ),
        Err(e) => log_error!(e.error_code(), &e.to_string()),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    const XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Benchmark">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="title" type="xs:string"/>
        <xs:element name="status" type="xs:string"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    #[test]
    fn test_missing_schema_fails_fast() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("U_XCCDF_Benchmark.xsd");

        assert_matches!(
            validate("<Benchmark/>", missing.as_path()),
            Err(SchemaError::SchemaFileMissing { .. })
        );
    }

    #[test]
    fn test_inputs_from_paths_and_text() {
        let dir = tempdir().unwrap();
        let schema_path = dir.path().join("benchmark.xsd");
        let document_path = dir.path().join("benchmark.xml");
        fs::write(&schema_path, XSD).unwrap();
        fs::write(
            &document_path,
            "<Benchmark><title>t</title><status>accepted</status></Benchmark>",
        )
        .unwrap();

        let result = validate(&document_path, &schema_path).unwrap();
        assert!(result.is_valid());

        let schema = load_schema(&schema_path).unwrap();
        let text = "<Benchmark><title>t</title></Benchmark>";
        assert_matches!(
            validate(text, &schema),
            Err(SchemaError::Violation(v)) if v.field == "status"
        );
    }

    #[test]
    fn test_collecting_does_not_touch_parsed_document() {
        let schema = Schema::parse(XSD).unwrap();
        let text = "<Benchmark><status>x</status><title>t</title><extra/></Benchmark>";
        let document = parse_document(text).unwrap();

        let result = validate_collecting(&document, &schema).unwrap();
        assert!(result.violations.len() >= 2);
        assert_eq!(document.root_element().children().count(), 3);
    }

    #[test]
    fn test_malformed_document() {
        let schema = Schema::parse(XSD).unwrap();
        assert_matches!(
            validate("<Benchmark>", &schema),
            Err(SchemaError::DocumentParse { .. })
        );
    }

    #[test]
    fn test_custom_handler_counts() {
        let schema = Schema::parse(XSD).unwrap();
        let mut count = 0;
        let mut handler = |_: SchemaViolation| -> Result<(), SchemaError> {
            count += 1;
            Ok(())
        };

        let result = validate_with("<Benchmark/>", &schema, &mut handler).unwrap();
        assert!(result.violations.is_empty());
        assert_eq!(count, 2);
    }
}
