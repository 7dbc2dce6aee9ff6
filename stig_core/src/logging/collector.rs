//! Per-file diagnostics for batch runs
//!
//! Errors and warnings raised while a worker holds a file context are kept
//! under that file's path until the batch drains them into its results.

use super::events::LogEvent;
use crate::config::compile_time::logging::MAX_LOG_EVENTS_PER_FILE;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File a worker thread is currently processing
#[derive(Debug, Clone)]
pub struct FileProcessingContext {
    pub file_path: PathBuf,
    pub file_id: usize,
}

impl FileProcessingContext {
    pub fn new(file_path: PathBuf, file_id: usize) -> Self {
        Self { file_path, file_id }
    }
}

/// Thread-safe store of diagnostics keyed by file path
#[derive(Default)]
pub struct ErrorCollector {
    file_events: Mutex<BTreeMap<PathBuf, Vec<LogEvent>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `event` for `file_path`. Past the per-file limit a single
    /// truncation warning is kept and later events are dropped.
    pub fn record_event(&self, file_path: &Path, event: LogEvent) {
        let mut events = self.file_events.lock().unwrap();
        let file_events = events.entry(file_path.to_path_buf()).or_default();

        match file_events.len() {
            n if n < MAX_LOG_EVENTS_PER_FILE => file_events.push(event),
            n if n == MAX_LOG_EVENTS_PER_FILE => file_events.push(LogEvent::warning(&format!(
                "Too many events for file (limit: {})",
                MAX_LOG_EVENTS_PER_FILE
            ))),
            _ => {}
        }
    }

    pub fn file_events(&self, file_path: &Path) -> Vec<LogEvent> {
        let events = self.file_events.lock().unwrap();
        events.get(file_path).cloned().unwrap_or_default()
    }

    /// Files that recorded at least one error, in path order
    pub fn files_with_errors(&self) -> Vec<PathBuf> {
        let events = self.file_events.lock().unwrap();
        events
            .iter()
            .filter(|(_, events)| events.iter().any(LogEvent::is_error))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Remove and return everything recorded for `file_path`
    pub fn take_file(&self, file_path: &Path) -> Vec<LogEvent> {
        self.file_events
            .lock()
            .unwrap()
            .remove(file_path)
            .unwrap_or_default()
    }
}

/// Render diagnostics grouped by file, followed by a totals line
pub fn format_file_report(files: &BTreeMap<PathBuf, Vec<LogEvent>>) -> String {
    let mut output = String::new();
    let mut errors = 0;
    let mut warnings = 0;

    for (path, events) in files.iter().filter(|(_, events)| !events.is_empty()) {
        output.push_str(&format!("{}:\n", path.display()));
        for event in events {
            output.push_str(&format!("  {}\n", event.format()));
        }
        errors += events.iter().filter(|e| e.is_error()).count();
        warnings += events.iter().filter(|e| e.is_warning()).count();
    }

    output.push_str(&format!(
        "{} files, {} errors, {} warnings",
        files.values().filter(|events| !events.is_empty()).count(),
        errors,
        warnings
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_events_grouped_by_file() {
        let collector = ErrorCollector::new();
        let bad = PathBuf::from("bad.xml");
        let warn = PathBuf::from("warn.xml");

        collector.record_event(
            &bad,
            LogEvent::error(codes::schema::SCHEMA_VIOLATION, "missing title"),
        );
        collector.record_event(&warn, LogEvent::warning("malformed name"));

        assert_eq!(collector.files_with_errors(), vec![bad.clone()]);
        assert_eq!(collector.file_events(&warn).len(), 1);

        let taken = collector.take_file(&bad);
        assert_eq!(taken.len(), 1);
        assert!(collector.file_events(&bad).is_empty());
        assert!(collector.files_with_errors().is_empty());
    }

    #[test]
    fn test_per_file_limit() {
        let collector = ErrorCollector::new();
        let path = PathBuf::from("noisy.xml");

        for _ in 0..(MAX_LOG_EVENTS_PER_FILE + 10) {
            collector.record_event(&path, LogEvent::warning("event"));
        }

        let events = collector.file_events(&path);
        assert_eq!(events.len(), MAX_LOG_EVENTS_PER_FILE + 1);
        assert!(events[MAX_LOG_EVENTS_PER_FILE].message.starts_with("Too many events"));
    }

    #[test]
    fn test_file_report() {
        let mut files = BTreeMap::new();
        files.insert(
            PathBuf::from("a.xml"),
            vec![LogEvent::error(codes::document::MISSING_FIELD, "no check content")],
        );
        files.insert(PathBuf::from("b.xml"), Vec::new());

        let report = format_file_report(&files);
        assert!(report.starts_with("a.xml:"));
        assert!(report.contains("E120"));
        assert!(!report.contains("b.xml"));
        assert!(report.ends_with("1 files, 1 errors, 0 warnings"));
    }
}
