//! Logging service and its backends

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel};
use crate::config::compile_time::logging::LOG_BUFFER_SIZE;
use std::sync::{Arc, Mutex};

/// Destination for log events that passed the service's level filter
pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Level-filtering front end over a single backend
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Backend and level chosen from the installed logging preferences
    pub fn from_preferences() -> Self {
        let logger: Arc<dyn Logger> = if !config::use_console_logging() {
            Arc::new(NullLogger)
        } else if config::use_structured_logging() {
            Arc::new(ConsoleLogger::new(LineFormat::Json))
        } else {
            Arc::new(ConsoleLogger::new(LineFormat::Text))
        };

        Self::new(logger, config::get_min_log_level())
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if self.should_log(event.level) {
            self.logger.log(&event);
        }
    }

    pub fn log_error(&self, error_code: Code, message: &str) {
        self.log_event(LogEvent::error(error_code, message));
    }

    pub fn log_success(&self, success_code: Code, message: &str) {
        self.log_event(LogEvent::success(success_code, message));
    }
}

/// Discards everything; installed when console output is off
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _event: &LogEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Text,
    Json,
}

/// Writes one line per event; errors go to stderr
pub struct ConsoleLogger {
    format: LineFormat,
}

impl ConsoleLogger {
    pub fn new(format: LineFormat) -> Self {
        Self { format }
    }

    fn render(&self, event: &LogEvent) -> String {
        match self.format {
            LineFormat::Text => event.format(),
            LineFormat::Json => event.format_json().unwrap_or_else(|_| event.format()),
        }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        let line = self.render(event);
        if event.is_error() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Keeps the most recent events in memory, for assertions in tests
#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.events.lock().unwrap().iter().any(|e| e.code == code)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = self.events.lock().unwrap();
        if events.len() >= LOG_BUFFER_SIZE {
            events.remove(0);
        }
        events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_level_filtering() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Warning);

        service.log_event(LogEvent::debug("tokenizing"));
        service.log_event(LogEvent::info("indexed"));
        service.log_event(LogEvent::warning("malformed name"));
        service.log_error(codes::schema::SCHEMA_VIOLATION, "missing title");

        assert_eq!(memory.len(), 2);
        assert!(memory.has_code(codes::schema::SCHEMA_VIOLATION));
        assert!(memory.events().iter().all(|e| e.level <= LogLevel::Warning));
    }

    #[test]
    fn test_success_is_info_level() {
        let memory = Arc::new(MemoryLogger::new());
        let quiet = LoggingService::new(memory.clone(), LogLevel::Warning);
        quiet.log_success(codes::success::CATALOG_INDEXED, "Indexed");
        assert!(memory.is_empty());

        let verbose = LoggingService::new(memory.clone(), LogLevel::Info);
        verbose.log_success(codes::success::CATALOG_INDEXED, "Indexed");
        assert!(memory.has_code(codes::success::CATALOG_INDEXED));
    }

    #[test]
    fn test_memory_logger_is_bounded() {
        let memory = MemoryLogger::new();
        for i in 0..(LOG_BUFFER_SIZE + 5) {
            memory.log(&LogEvent::info(&format!("event {}", i)));
        }

        assert_eq!(memory.len(), LOG_BUFFER_SIZE);
        assert_eq!(memory.events()[0].message, "event 5");
    }

    #[test]
    fn test_console_rendering() {
        let event = LogEvent::error(codes::document::MISSING_FIELD, "no check content");

        assert!(ConsoleLogger::new(LineFormat::Text)
            .render(&event)
            .starts_with("[ERROR] E120"));
        assert!(ConsoleLogger::new(LineFormat::Json)
            .render(&event)
            .contains("\"code\":\"E120\""));
    }
}
