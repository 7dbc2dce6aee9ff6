//! File processor with compile-time limits and global logging integration

mod processor;

use std::path::Path;

pub use processor::{
    FileKind, FileMetadata, FileProcessingResult, FileProcessor, FileProcessorError,
};

/// Process a file with default settings
pub fn process_file(path: impl AsRef<Path>) -> Result<FileProcessingResult, FileProcessorError> {
    FileProcessor::new().process_file(path.as_ref())
}

/// Check that every file processing error code has registered metadata
pub fn init_file_processor_logging() -> Result<(), String> {
    use crate::logging::codes::{self, file_processing};

    let test_codes = [
        file_processing::FILE_NOT_FOUND,
        file_processing::INVALID_EXTENSION,
        file_processing::FILE_TOO_LARGE,
        file_processing::EMPTY_FILE,
        file_processing::PERMISSION_DENIED,
        file_processing::INVALID_ENCODING,
        file_processing::IO_ERROR,
        file_processing::INVALID_PATH,
        file_processing::TOO_MANY_LINES,
    ];

    for code in &test_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "File processor error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_module_api() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("settings.toml");
        fs::write(&file_path, "ignore = []\n").unwrap();

        let result = process_file(&file_path).unwrap();
        assert_eq!(result.metadata.kind, FileKind::Settings);
    }

    #[test]
    fn test_init_logging() {
        assert!(init_file_processor_logging().is_ok());
    }
}
