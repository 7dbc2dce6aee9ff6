//! # Processor Configuration

use crate::batch::BatchConfig;
use crate::catalog::DEFAULT_PROCESSED_DIR;
use std::env;
use std::path::PathBuf;
use stig_core::config::compile_time::batch_processing::MAX_WORKER_THREADS;

/// How schema violations are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// The first violation fails the document and, in a batch, the batch
    #[default]
    Strict,
    /// Every violation is collected; invalid documents are reported and skipped
    Collecting,
}

impl ValidationMode {
    fn from_env() -> Self {
        match env::var("STIG_VALIDATION_MODE") {
            Ok(value) if value.eq_ignore_ascii_case("collecting") => ValidationMode::Collecting,
            _ => ValidationMode::Strict,
        }
    }
}

/// Configuration for the benchmark processor
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub validation_mode: ValidationMode,

    /// XSD every benchmark must validate against
    pub schema_path: Option<PathBuf>,

    /// Name of the processed-data subtree under a catalog root
    pub processed_dir: String,

    /// Organization settings (ignore list and exceptions)
    pub settings_path: Option<PathBuf>,

    /// Author-supplied hard-coded rule values
    pub hard_coded_path: Option<PathBuf>,

    pub batch_config: BatchConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::from_env(),
            schema_path: env::var_os("STIG_SCHEMA_PATH").map(PathBuf::from),
            processed_dir: env::var("STIG_PROCESSED_DIR")
                .unwrap_or_else(|_| DEFAULT_PROCESSED_DIR.to_string()),
            settings_path: env::var_os("STIG_SETTINGS_PATH").map(PathBuf::from),
            hard_coded_path: env::var_os("STIG_HARD_CODED_VALUES").map(PathBuf::from),
            batch_config: BatchConfig::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn new(schema_path: impl Into<PathBuf>) -> Self {
        Self::default().with_schema_path(schema_path)
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    pub fn strict(self) -> Self {
        self.with_mode(ValidationMode::Strict)
    }

    pub fn collecting(self) -> Self {
        self.with_mode(ValidationMode::Collecting)
    }

    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn with_processed_dir(mut self, name: impl Into<String>) -> Self {
        self.processed_dir = name.into();
        self
    }

    pub fn with_settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn with_hard_coded_values(mut self, path: impl Into<PathBuf>) -> Self {
        self.hard_coded_path = Some(path.into());
        self
    }

    /// Set custom batch configuration
    pub fn with_batch_config(mut self, config: BatchConfig) -> Self {
        self.batch_config = config;
        self
    }

    /// Set worker threads for per-document stages, between 1 and the compile-time cap
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.batch_config.max_threads = max_threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.batch_config.recursive = recursive;
        self
    }

    pub fn with_max_files(mut self, max_files: Option<usize>) -> Self {
        self.batch_config.max_files = max_files;
        self
    }

    /// Stop the batch on the first document that cannot be read or parsed
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.batch_config.fail_fast = fail_fast;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ProcessorConfig::new("/stig/U_XCCDF_Benchmark.xsd")
            .collecting()
            .with_processed_dir("converted")
            .with_settings("/stig/org.toml")
            .with_hard_coded_values("/stig/hardcoded.toml")
            .with_max_threads(64)
            .with_recursive(false)
            .with_max_files(Some(10))
            .with_fail_fast(true);

        assert_eq!(config.validation_mode, ValidationMode::Collecting);
        assert_eq!(
            config.schema_path.as_deref(),
            Some(std::path::Path::new("/stig/U_XCCDF_Benchmark.xsd"))
        );
        assert_eq!(config.processed_dir, "converted");
        assert_eq!(config.batch_config.max_threads, MAX_WORKER_THREADS);
        assert!(!config.batch_config.recursive);
        assert_eq!(config.batch_config.max_files, Some(10));
        assert!(config.batch_config.fail_fast);
        assert!(config.settings_path.is_some());
        assert!(config.hard_coded_path.is_some());
    }

    #[test]
    fn test_thread_floor() {
        let config = ProcessorConfig::default().with_max_threads(0).strict();
        assert_eq!(config.batch_config.max_threads, 1);
        assert_eq!(config.validation_mode, ValidationMode::Strict);
    }
}
