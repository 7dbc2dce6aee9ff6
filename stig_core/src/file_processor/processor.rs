//! File reading with size, encoding and line-count limits

use crate::config::constants::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, MAX_LINE_COUNT_FOR_ANALYSIS,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// File processor specific errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum FileProcessorError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported file extension: {extension:?}")]
    InvalidExtension { extension: Option<String> },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("File is empty: {path}")]
    EmptyFile { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid UTF-8 encoding in file: {path}")]
    InvalidEncoding { path: String },

    #[error("I/O error reading file: {message}")]
    IoError { message: String },

    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },

    #[error("File exceeds maximum line count: {lines} (max: {max_lines})")]
    TooManyLines { lines: usize, max_lines: usize },
}

impl FileProcessorError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            FileProcessorError::FileNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            FileProcessorError::InvalidExtension { .. } => {
                codes::file_processing::INVALID_EXTENSION
            }
            FileProcessorError::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            FileProcessorError::EmptyFile { .. } => codes::file_processing::EMPTY_FILE,
            FileProcessorError::PermissionDenied { .. } => {
                codes::file_processing::PERMISSION_DENIED
            }
            FileProcessorError::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            FileProcessorError::IoError { .. } => codes::file_processing::IO_ERROR,
            FileProcessorError::InvalidPath { .. } => codes::file_processing::INVALID_PATH,
            FileProcessorError::TooManyLines { .. } => codes::file_processing::TOO_MANY_LINES,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}

/// Kind of input file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// PowerShell script, module or manifest
    Script,
    /// XML benchmark or processed rule data
    Xml,
    /// XSD schema
    Schema,
    /// TOML settings
    Settings,
    Other,
}

impl FileKind {
    pub fn from_extension(extension: Option<&str>) -> Self {
        match extension {
            Some("ps1") | Some("psm1") | Some("psd1") => FileKind::Script,
            Some("xml") => FileKind::Xml,
            Some("xsd") => FileKind::Schema,
            Some("toml") => FileKind::Settings,
            _ => FileKind::Other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FileKind::Other)
    }
}

/// File metadata collected during processing
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Canonical file path
    pub path: PathBuf,
    pub size: u64,
    /// Lowercased extension, if any
    pub extension: Option<String>,
    pub kind: FileKind,
    pub line_count: usize,
    pub modified: Option<DateTime<Utc>>,
}

impl FileMetadata {
    pub fn is_large_file(&self) -> bool {
        self.size > LARGE_FILE_THRESHOLD
    }
}

/// Source text plus the metadata gathered while reading it
#[derive(Debug, Clone)]
pub struct FileProcessingResult {
    pub source: String,
    pub metadata: FileMetadata,
    pub processing_duration: std::time::Duration,
}

impl FileProcessingResult {
    pub fn char_count(&self) -> usize {
        self.source.chars().count()
    }
}

/// Reads input files under the compile-time limits
#[derive(Debug, Clone)]
pub struct FileProcessor {
    pub require_known_extension: bool,
    pub enable_performance_logging: bool,
}

impl FileProcessor {
    pub fn new() -> Self {
        Self::from_preferences(&FileProcessorPreferences::default())
    }

    pub fn from_preferences(prefs: &FileProcessorPreferences) -> Self {
        Self {
            require_known_extension: prefs.require_known_extension,
            enable_performance_logging: prefs.enable_performance_logging,
        }
    }

    pub fn with_known_extension_required(mut self, required: bool) -> Self {
        self.require_known_extension = required;
        self
    }

    pub fn max_file_size() -> u64 {
        MAX_FILE_SIZE
    }

    /// Validate, read and decode a file
    pub fn process_file(&self, path: &Path) -> Result<FileProcessingResult, FileProcessorError> {
        let start_time = std::time::Instant::now();
        let display = path.display().to_string();

        log_debug!("Starting file processing", "file" => display);

        let canonical = self.validate_path(path)?;
        let mut metadata = self.get_metadata(&canonical)?;
        self.validate_file(&metadata)?;
        let source = self.read_file(&canonical)?;

        let line_count = source.lines().count();
        if line_count > MAX_LINE_COUNT_FOR_ANALYSIS {
            let error = FileProcessorError::TooManyLines {
                lines: line_count,
                max_lines: MAX_LINE_COUNT_FOR_ANALYSIS,
            };
            log_error!(error.error_code(), "File exceeds maximum line count",
                "file" => display,
                "lines" => line_count,
                "max_lines" => MAX_LINE_COUNT_FOR_ANALYSIS);
            return Err(error);
        }
        metadata.line_count = line_count;

        let result = FileProcessingResult {
            source,
            metadata,
            processing_duration: start_time.elapsed(),
        };

        if self.enable_performance_logging {
            log_success!(
                codes::success::FILE_PROCESSING_SUCCESS,
                "File processed successfully",
                "file" => display,
                "size_bytes" => result.metadata.size,
                "lines" => result.metadata.line_count,
                "is_large_file" => result.metadata.is_large_file(),
                "duration_ms" => format!("{:.2}", result.processing_duration.as_secs_f64() * 1000.0)
            );
        }

        Ok(result)
    }

    fn validate_path(&self, path: &Path) -> Result<PathBuf, FileProcessorError> {
        let display = path.display().to_string();

        if path.as_os_str().is_empty() {
            let error = FileProcessorError::InvalidPath { path: display };
            log_error!(error.error_code(), "Empty file path provided");
            return Err(error);
        }

        if !path.exists() {
            let error = FileProcessorError::FileNotFound {
                path: display.clone(),
            };
            log_error!(error.error_code(), "File not found", "path" => display);
            return Err(error);
        }

        if !path.is_file() {
            let error = FileProcessorError::InvalidPath {
                path: display.clone(),
            };
            log_error!(error.error_code(), "Path is not a file", "path" => display);
            return Err(error);
        }

        path.canonicalize().map_err(|e| {
            let error = FileProcessorError::IoError {
                message: format!("Failed to resolve path '{}': {}", display, e),
            };
            log_error!(error.error_code(), "Failed to canonicalize path",
                "path" => display,
                "io_error" => e);
            error
        })
    }

    fn get_metadata(&self, path: &Path) -> Result<FileMetadata, FileProcessorError> {
        let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase());
        let kind = FileKind::from_extension(extension.as_deref());

        Ok(FileMetadata {
            path: path.to_path_buf(),
            size: metadata.len(),
            extension,
            kind,
            line_count: 0,
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    fn validate_file(&self, metadata: &FileMetadata) -> Result<(), FileProcessorError> {
        let display = metadata.path.display().to_string();

        if metadata.size > MAX_FILE_SIZE {
            let error = FileProcessorError::FileTooLarge {
                size: metadata.size,
                max_size: MAX_FILE_SIZE,
            };
            log_error!(error.error_code(), "File exceeds compile-time maximum size limit",
                "file" => display,
                "size_bytes" => metadata.size,
                "limit_bytes" => MAX_FILE_SIZE);
            return Err(error);
        }

        if metadata.size == 0 {
            let error = FileProcessorError::EmptyFile {
                path: display.clone(),
            };
            log_error!(error.error_code(), "File is empty", "file" => display);
            return Err(error);
        }

        if self.require_known_extension && !metadata.kind.is_known() {
            let error = FileProcessorError::InvalidExtension {
                extension: metadata.extension.clone(),
            };
            log_error!(error.error_code(), "File extension is not supported",
                "file" => display,
                "extension" => metadata.extension.as_deref().unwrap_or("none"));
            return Err(error);
        }

        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<String, FileProcessorError> {
        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;

        let mut content = String::from_utf8(bytes).map_err(|_| {
            let error = FileProcessorError::InvalidEncoding {
                path: path.display().to_string(),
            };
            log_error!(error.error_code(), "Invalid UTF-8 encoding in file",
                "file" => path.display());
            error
        })?;

        // Benchmarks and scripts exported on Windows often carry a byte order mark
        if content.starts_with('\u{feff}') {
            content.drain(..'\u{feff}'.len_utf8());
        }

        Ok(content)
    }
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(path: &Path, e: std::io::Error) -> FileProcessorError {
    let error = match e.kind() {
        std::io::ErrorKind::PermissionDenied => FileProcessorError::PermissionDenied {
            path: path.display().to_string(),
        },
        _ => FileProcessorError::IoError {
            message: format!("'{}': {}", path.display(), e),
        },
    };
    log_error!(error.error_code(), "Failed to access file",
        "path" => path.display(),
        "io_error" => e);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_process_valid_script() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("WindowsServer.ps1");
        fs::write(&path, "Configuration WindowsServer\n{\n}\n").unwrap();

        let result = FileProcessor::new().process_file(&path).unwrap();
        assert_eq!(result.metadata.kind, FileKind::Script);
        assert_eq!(result.metadata.line_count, 3);
        assert!(result.metadata.modified.is_some());
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchmark.xml");
        fs::write(&path, "\u{feff}<Benchmark/>").unwrap();

        let result = FileProcessor::new().process_file(&path).unwrap();
        assert_eq!(result.source, "<Benchmark/>");
    }

    #[test]
    fn test_file_not_found() {
        let result = FileProcessor::new().process_file(Path::new("/nonexistent/file.xml"));
        assert_matches!(result, Err(FileProcessorError::FileNotFound { .. }));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xml");
        fs::write(&path, "").unwrap();

        let result = FileProcessor::new().process_file(&path);
        assert_matches!(result, Err(FileProcessorError::EmptyFile { .. }));
    }

    #[test]
    fn test_invalid_encoding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.ps1");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let result = FileProcessor::new().process_file(&path);
        assert_matches!(result, Err(FileProcessorError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_extension_requirement() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "text").unwrap();

        let strict = FileProcessor::new().with_known_extension_required(true);
        assert_matches!(
            strict.process_file(&path),
            Err(FileProcessorError::InvalidExtension { extension: Some(ext) }) if ext == "txt"
        );

        let lenient = FileProcessor::new().with_known_extension_required(false);
        assert!(lenient.process_file(&path).is_ok());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempdir().unwrap();
        let result = FileProcessor::new().process_file(dir.path());
        assert_matches!(result, Err(FileProcessorError::InvalidPath { .. }));
    }

    #[test]
    fn test_error_codes() {
        let error = FileProcessorError::TooManyLines {
            lines: 10,
            max_lines: 5,
        };
        assert_eq!(error.error_code().as_str(), "E013");
        assert!(error.requires_halt());
    }
}
