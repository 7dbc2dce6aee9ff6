//! Logging preferences in effect for the process
//!
//! Preferences come from a loaded `RuntimeConfig` when one is installed before
//! logging starts, otherwise from the `STIG_LOGGING_*` environment defaults.

use crate::config::compile_time::logging::SECURITY_MIN_LOG_LEVEL;
use crate::config::runtime::LoggingPreferences;
use crate::logging::events::LogLevel;
use std::sync::OnceLock;

static PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Install preferences; only the first call takes effect
pub fn install_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    PREFERENCES
        .set(preferences)
        .map_err(|_| "Logging preferences already installed".to_string())
}

fn preferences() -> &'static LoggingPreferences {
    PREFERENCES.get_or_init(LoggingPreferences::default)
}

/// Minimum level that reaches the backend. With security metrics on, warnings
/// are always kept.
pub fn get_min_log_level() -> LogLevel {
    let preferences = preferences();
    let level = preferences.min_log_level.to_events_log_level();

    if preferences.log_security_metrics && (level as u8) < SECURITY_MIN_LOG_LEVEL {
        LogLevel::Warning
    } else {
        level
    }
}

pub fn use_structured_logging() -> bool {
    preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    preferences().enable_console_logging
}

pub fn log_performance_events() -> bool {
    preferences().log_performance_events
}

pub fn include_file_context() -> bool {
    preferences().include_file_context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_floor() {
        let level = get_min_log_level();
        assert!(level >= LogLevel::Warning || !preferences().log_security_metrics);
    }

    #[test]
    fn test_second_install_is_rejected() {
        // The first read already fixed the preferences for this process
        let _ = preferences();
        assert!(install_preferences(LoggingPreferences::default()).is_err());
    }
}
