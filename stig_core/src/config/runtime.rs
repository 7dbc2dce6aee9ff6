// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to reject files whose extension is not a known script or data extension
    pub require_known_extension: bool,

    /// Whether to enable detailed performance logging
    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_known_extension: env::var("STIG_REQUIRE_KNOWN_EXTENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_performance_logging: env::var("STIG_ENABLE_PERFORMANCE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Whether to collect detailed token metrics
    pub collect_detailed_metrics: bool,

    /// Whether to show position information in error messages
    pub include_position_in_errors: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            collect_detailed_metrics: env::var("STIG_LEXICAL_DETAILED_METRICS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_position_in_errors: env::var("STIG_LEXICAL_INCLUDE_POSITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataPreferences {
    /// Parameter whose allowed-values attribute lists the accepted STIG versions
    pub version_parameter_name: String,

    /// Attribute name holding the allowed values of a parameter
    pub allowed_values_attribute: String,
}

impl Default for MetadataPreferences {
    fn default() -> Self {
        Self {
            version_parameter_name: env::var("STIG_VERSION_PARAMETER")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "StigVersion".to_string()),
            allowed_values_attribute: env::var("STIG_ALLOWED_VALUES_ATTRIBUTE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "ValidateSet".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to emit JSON log lines
    pub use_structured_logging: bool,

    /// Whether to log to the console at all
    pub enable_console_logging: bool,

    /// Minimum level that is logged
    pub min_log_level: LogLevel,

    /// Whether to log timing events
    pub log_performance_events: bool,

    /// Whether security-relevant events are kept at warning level or above
    pub log_security_metrics: bool,

    /// Whether to include file context in log messages
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var("STIG_LOGGING_USE_STRUCTURED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var("STIG_LOGGING_ENABLE_CONSOLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var("STIG_LOGGING_MIN_LEVEL")
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            log_performance_events: env::var("STIG_LOGGING_LOG_PERFORMANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_security_metrics: env::var("STIG_LOGGING_LOG_SECURITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_file_context: env::var("STIG_LOGGING_INCLUDE_FILE_CONTEXT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Errors raised while loading a runtime configuration file
#[derive(Debug, thiserror::Error)]
pub enum RuntimeConfigError {
    #[error("Cannot read configuration file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid configuration in {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub lexical: LexicalPreferences,
    pub metadata: MetadataPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a TOML configuration. Missing sections and keys fall back to the
    /// environment-driven defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, RuntimeConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| RuntimeConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| RuntimeConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const REQUIRE_KNOWN_EXTENSION: &str = "STIG_REQUIRE_KNOWN_EXTENSION";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "STIG_ENABLE_PERFORMANCE_LOGGING";

    // Lexical
    pub const LEXICAL_DETAILED_METRICS: &str = "STIG_LEXICAL_DETAILED_METRICS";
    pub const LEXICAL_INCLUDE_POSITIONS: &str = "STIG_LEXICAL_INCLUDE_POSITIONS";

    // Metadata
    pub const VERSION_PARAMETER: &str = "STIG_VERSION_PARAMETER";
    pub const ALLOWED_VALUES_ATTRIBUTE: &str = "STIG_ALLOWED_VALUES_ATTRIBUTE";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "STIG_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "STIG_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "STIG_LOGGING_MIN_LEVEL";
    pub const LOGGING_LOG_PERFORMANCE: &str = "STIG_LOGGING_LOG_PERFORMANCE";
    pub const LOGGING_LOG_SECURITY: &str = "STIG_LOGGING_LOG_SECURITY";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "STIG_LOGGING_INCLUDE_FILE_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("0"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("invalid"), None);
    }

    #[test]
    fn test_toml_overrides_metadata_preferences() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [metadata]
            version_parameter_name = "BenchmarkVersion"

            [logging]
            min_log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.metadata.version_parameter_name, "BenchmarkVersion");
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
        assert!(!config.metadata.allowed_values_attribute.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = RuntimeConfig::load(Path::new("/nonexistent/stig.toml"));
        assert!(matches!(result, Err(RuntimeConfigError::Read { .. })));
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(!env_vars::VERSION_PARAMETER.is_empty());
        assert!(!env_vars::LOGGING_MIN_LEVEL.is_empty());
        assert!(env_vars::ENABLE_PERFORMANCE_LOGGING.starts_with("STIG_"));
    }
}
