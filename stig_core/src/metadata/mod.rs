//! Resource script metadata: configuration names and accepted STIG versions

mod error;
mod extractor;

pub use error::MetadataError;
pub use extractor::{MetadataExtractor, ResourceMetadata};

pub fn extract_configuration_name(source: &str) -> Result<String, MetadataError> {
    MetadataExtractor::new().extract_configuration_name(source)
}

pub fn extract_version_validate_set(source: &str) -> Result<Vec<String>, MetadataError> {
    MetadataExtractor::new().extract_version_validate_set(source)
}

pub fn extract_resource_metadata(
    path: impl AsRef<std::path::Path>,
) -> Result<ResourceMetadata, MetadataError> {
    MetadataExtractor::new().extract_from_file(path.as_ref())
}
