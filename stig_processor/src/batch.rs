//! Batch processing of benchmark directories
//!
//! Reading, validation, parsing and normalization run per document on worker
//! threads. Record resolution then runs once over the consolidated batch, in
//! sorted path order, so cross-document duplicates are found and the output is
//! deterministic.

use crate::catalog::{is_catalog_data, is_xml, CatalogError, CatalogIndex};
use crate::config::{ProcessorConfig, ValidationMode};
use crate::document::{load_benchmark, BenchmarkDocument, DocumentError};
use crate::overrides::{HardCodedValues, OrganizationSettings, OverrideError};
use crate::rules::{flatten, FlatRecord, RecordError, RecordResolver, RuleRecord};
use crate::schema::{self, CollectingHandler, Schema, SchemaError, SchemaViolation, StrictHandler};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use stig_core::config::compile_time::batch_processing::{
    MAX_CHUNK_SIZE, MAX_FILES_PER_BATCH, MAX_WORKER_THREADS,
};
use stig_core::logging::{self, codes, Code, LogEvent};
use stig_core::{log_debug, log_error, log_info, log_success, log_warning};
use walkdir::WalkDir;

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

/// Batch processing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let available = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            max_threads: env::var("STIG_MAX_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(available)
                .clamp(1, MAX_WORKER_THREADS),
            recursive: true,
            max_files: None,
            progress_reporting: false,
            fail_fast: env::var("STIG_FAIL_FAST")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
        }
    }
}

/// A document that was excluded from record building
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: DocumentError,
}

impl DocumentFailure {
    pub fn code(&self) -> Code {
        self.error.error_code()
    }

    pub fn violations(&self) -> Vec<SchemaViolation> {
        self.error.violations()
    }
}

/// Batch processing results
#[derive(Debug)]
pub struct BatchResults {
    pub records: Vec<RuleRecord>,
    pub failures: Vec<DocumentFailure>,
    pub documents_processed: usize,
    pub files_discovered: usize,
    pub duplicate_count: usize,
    /// Errors and warnings logged while each document was loaded
    pub diagnostics: BTreeMap<PathBuf, Vec<LogEvent>>,
    pub processing_duration: Duration,
    pub generated_at: DateTime<Utc>,
}

impl BatchResults {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            failures: Vec::new(),
            documents_processed: 0,
            files_discovered: 0,
            duplicate_count: 0,
            diagnostics: BTreeMap::new(),
            processing_duration: Duration::new(0, 0),
            generated_at: Utc::now(),
        }
    }

    pub fn success_count(&self) -> usize {
        self.documents_processed - self.failures.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.documents_processed == 0 {
            0.0
        } else {
            self.success_count() as f64 / self.documents_processed as f64
        }
    }

    pub fn violation_count(&self) -> usize {
        self.failures.iter().map(|f| f.violations().len()).sum()
    }

    /// Per-document diagnostics, grouped by path
    pub fn diagnostics_report(&self) -> String {
        logging::format_file_report(&self.diagnostics)
    }

    pub fn flat_records(&self) -> Result<Vec<FlatRecord>, RecordError> {
        flatten(&self.records)
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch processing completed: {} documents processed, {} valid ({:.1}%), {} failed with {} violations, {} records ({} duplicates), {:.2}s total",
            self.documents_processed,
            self.success_count(),
            self.success_rate() * 100.0,
            self.failure_count(),
            self.violation_count(),
            self.records.len(),
            self.duplicate_count,
            self.processing_duration.as_secs_f64()
        )
    }
}

impl Default for BatchResults {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch processing errors
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No benchmark files found in directory: {path}")]
    NoFilesFound { path: String },

    #[error("Too many files found: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("IO error during directory traversal: {error}")]
    IoError { error: String },

    #[error("Thread pool error: {message}")]
    ThreadError { message: String },

    #[error("No schema configured; set a schema path or STIG_SCHEMA_PATH")]
    SchemaNotConfigured,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Overrides(#[from] OverrideError),

    #[error("{}: {error}", .path.display())]
    DocumentFailed { path: PathBuf, error: DocumentError },

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Cannot write records to {path}: {message}")]
    Output { path: String, message: String },
}

impl BatchError {
    pub fn error_code(&self) -> Code {
        match self {
            BatchError::DirectoryNotFound { .. } => codes::batch::DIRECTORY_NOT_FOUND,
            BatchError::NoFilesFound { .. } => codes::batch::NO_FILES_FOUND,
            BatchError::TooManyFiles { .. } => codes::batch::TOO_MANY_FILES,
            BatchError::IoError { .. } => codes::file_processing::IO_ERROR,
            BatchError::ThreadError { .. } => codes::batch::THREAD_ERROR,
            BatchError::SchemaNotConfigured => codes::system::CONFIGURATION_ERROR,
            BatchError::Schema(e) => e.error_code(),
            BatchError::Overrides(e) => e.error_code(),
            BatchError::DocumentFailed { error, .. } => error.error_code(),
            BatchError::Record(e) => e.error_code(),
            BatchError::Output { .. } => codes::batch::OUTPUT_ERROR,
        }
    }

    pub fn violations(&self) -> Vec<SchemaViolation> {
        match self {
            BatchError::DocumentFailed { error, .. } => error.violations(),
            BatchError::Schema(SchemaError::Violation(v)) => vec![v.clone()],
            _ => Vec::new(),
        }
    }
}

type DocumentOutcome = (
    usize,
    PathBuf,
    Result<BenchmarkDocument, DocumentError>,
    Vec<LogEvent>,
);

// ============================================================================
// BATCH PROCESSOR
// ============================================================================

/// Validated, resolved processing of benchmark sets
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    config: ProcessorConfig,
    schema: Arc<Schema>,
    settings: OrganizationSettings,
    hard_coded: HardCodedValues,
}

impl BatchProcessor {
    /// Load the schema and override files named by `config`
    pub fn new(config: ProcessorConfig) -> Result<Self, BatchError> {
        let schema_path = config
            .schema_path
            .clone()
            .ok_or(BatchError::SchemaNotConfigured)?;
        let schema = schema::load_schema(&schema_path)?;

        let settings = match &config.settings_path {
            Some(path) => OrganizationSettings::load(path)?,
            None => OrganizationSettings::default(),
        };
        let hard_coded = match &config.hard_coded_path {
            Some(path) => HardCodedValues::load(path)?,
            None => HardCodedValues::default(),
        };

        Ok(Self::with_parts(config, schema, settings, hard_coded))
    }

    /// Build from an already compiled schema and loaded overrides
    pub fn with_parts(
        config: ProcessorConfig,
        schema: Schema,
        settings: OrganizationSettings,
        hard_coded: HardCodedValues,
    ) -> Self {
        Self {
            config,
            schema: Arc::new(schema),
            settings,
            hard_coded,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Catalog index over `root` using the configured processed-data directory
    pub fn catalog(&self, root: &Path) -> Result<CatalogIndex, CatalogError> {
        Ok(CatalogIndex::new(root)?.with_processed_dir(self.config.processed_dir.clone()))
    }

    /// Benchmark XML files under `dir`, sorted
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
        let batch = &self.config.batch_config;
        log_info!("Starting file discovery",
            "directory" => dir.display(),
            "recursive" => batch.recursive
        );

        if !dir.is_dir() {
            return Err(BatchError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        let walker = if batch.recursive {
            WalkDir::new(dir)
        } else {
            WalkDir::new(dir).max_depth(1)
        };

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| BatchError::IoError {
                error: e.to_string(),
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && is_xml(path) && is_catalog_data(path) {
                files.push(entry.into_path());
            }
        }

        if files.is_empty() {
            return Err(BatchError::NoFilesFound {
                path: dir.display().to_string(),
            });
        }

        files.sort();

        if let Some(max_files) = batch.max_files {
            if files.len() > max_files {
                log_warning!(
                    "Reached maximum file limit",
                    "files_found" => files.len(),
                    "limit" => max_files
                );
                files.truncate(max_files);
            }
        }

        if files.len() > MAX_FILES_PER_BATCH {
            return Err(BatchError::TooManyFiles {
                count: files.len(),
                max: MAX_FILES_PER_BATCH,
            });
        }

        log_debug!("File discovery completed",
            "files_found" => files.len(),
            "directory" => dir.display()
        );
        Ok(files)
    }

    /// Discover and process every benchmark under `dir`
    pub fn process_directory(&self, dir: &Path) -> Result<BatchResults, BatchError> {
        let files = self.discover(dir)?;
        self.process_files(files)
    }

    /// Process the given files; order of the input does not affect the output
    pub fn process_files(&self, mut files: Vec<PathBuf>) -> Result<BatchResults, BatchError> {
        let start_time = Instant::now();
        files.sort();
        files.dedup();

        let batch = &self.config.batch_config;
        let chunk_size = calculate_chunk_size(files.len(), batch.max_threads);
        log_info!("Starting batch processing",
            "documents" => files.len(),
            "threads" => batch.max_threads,
            "chunk_size" => chunk_size,
            "mode" => format!("{:?}", self.config.validation_mode)
        );

        let mut outcomes: Vec<DocumentOutcome> = Vec::with_capacity(files.len());
        let mut offset = 0;
        for chunk in files.chunks(chunk_size.max(1)) {
            let mut chunk_outcomes = self.process_chunk(chunk, offset)?;
            offset += chunk.len();
            chunk_outcomes.sort_by_key(|(index, _, _, _)| *index);

            if self.config.validation_mode == ValidationMode::Strict {
                if let Some(position) = chunk_outcomes
                    .iter()
                    .position(|(_, _, r, _)| matches!(r, Err(e) if e.is_validation_failure()))
                {
                    let (_, path, result, _) = chunk_outcomes.swap_remove(position);
                    if let Err(error) = result {
                        log_error!(error.error_code(), "Strict validation failed, stopping batch",
                            "file" => path.display()
                        );
                        return Err(BatchError::DocumentFailed { path, error });
                    }
                }
            }

            let failed = chunk_outcomes.iter().any(|(_, _, r, _)| r.is_err());
            outcomes.extend(chunk_outcomes);

            if batch.fail_fast && failed {
                log_warning!("Fail-fast mode enabled, stopping batch processing");
                break;
            }
        }

        let mut results = BatchResults::new();
        results.files_discovered = files.len();
        results.documents_processed = outcomes.len();

        let mut documents = Vec::new();
        for (_, path, outcome, diagnostics) in outcomes {
            if !diagnostics.is_empty() {
                results.diagnostics.insert(path.clone(), diagnostics);
            }
            match outcome {
                Ok(document) => documents.push(document),
                Err(error) => {
                    log_error!(codes::batch::DOCUMENT_FAILED, &error.to_string(),
                        "file" => path.display(),
                        "cause" => error.error_code()
                    );
                    results.failures.push(DocumentFailure { path, error });
                }
            }
        }

        let resolver = RecordResolver::new(&self.settings, &self.hard_coded);
        results.records = resolver.resolve_all(&documents)?;
        results.duplicate_count = resolver.duplicate_count();
        results.processing_duration = start_time.elapsed();

        log_success!(
            codes::success::BATCH_COMPLETE,
            "Batch processing completed",
            "documents" => results.documents_processed,
            "failed" => results.failure_count(),
            "records" => results.records.len(),
            "duplicates" => results.duplicate_count,
            "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
        );

        Ok(results)
    }

    /// Read, validate and parse one chunk of files in parallel
    fn process_chunk(
        &self,
        files: &[PathBuf],
        offset: usize,
    ) -> Result<Vec<DocumentOutcome>, BatchError> {
        let outcomes = Arc::new(Mutex::new(Vec::with_capacity(files.len())));
        let max_threads = self.config.batch_config.max_threads.max(1);
        let files_per_thread = files.len().div_ceil(max_threads);
        let progress = self.config.batch_config.progress_reporting;

        let mut handles = Vec::new();
        for thread_id in 0..max_threads {
            let start_idx = thread_id * files_per_thread;
            let end_idx = ((thread_id + 1) * files_per_thread).min(files.len());
            if start_idx >= files.len() {
                break;
            }

            let thread_files: Vec<PathBuf> = files[start_idx..end_idx].to_vec();
            let outcomes = Arc::clone(&outcomes);
            let schema = Arc::clone(&self.schema);
            let mode = self.config.validation_mode;

            handles.push(thread::spawn(move || {
                for (local_id, path) in thread_files.into_iter().enumerate() {
                    let file_id = offset + start_idx + local_id;
                    if progress {
                        log_info!("Processing document", "file" => path.display(), "file_id" => file_id);
                    }

                    let result = logging::with_file_context(path.clone(), file_id, || {
                        load_document(&path, &schema, mode)
                    });
                    let diagnostics = logging::take_file_diagnostics(&path);
                    outcomes.lock().unwrap().push((file_id, path, result, diagnostics));
                }
            }));
        }

        for handle in handles {
            handle.join().map_err(|_| BatchError::ThreadError {
                message: "Thread panicked during processing".to_string(),
            })?;
        }

        let outcomes = Arc::try_unwrap(outcomes).map_err(|_| BatchError::ThreadError {
            message: "Failed to extract results from worker threads".to_string(),
        })?;
        Ok(outcomes.into_inner().unwrap())
    }
}

fn load_document(
    path: &Path,
    schema: &Schema,
    mode: ValidationMode,
) -> Result<BenchmarkDocument, DocumentError> {
    match mode {
        ValidationMode::Strict => load_benchmark(path, schema, &mut StrictHandler),
        ValidationMode::Collecting => load_benchmark(path, schema, &mut CollectingHandler::new()),
    }
}

/// Calculate chunk size for parallel processing
fn calculate_chunk_size(file_count: usize, max_threads: usize) -> usize {
    file_count
        .div_ceil(max_threads.max(1))
        .clamp(1, MAX_CHUNK_SIZE)
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Records as a pretty-printed JSON array of flat records
pub fn records_to_json(records: &[RuleRecord]) -> Result<String, BatchError> {
    let flat = flatten(records)?;
    serde_json::to_string_pretty(&flat).map_err(|e| BatchError::Output {
        path: "<memory>".to_string(),
        message: e.to_string(),
    })
}

pub fn write_records_json(records: &[RuleRecord], path: &Path) -> Result<(), BatchError> {
    let json = records_to_json(records)?;
    fs::write(path, json).map_err(|e| BatchError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    log_success!(
        codes::success::OPERATION_COMPLETED_SUCCESSFULLY,
        "Records written",
        "path" => path.display(),
        "records" => records.len()
    );
    Ok(())
}
