pub mod compile_time {
    pub mod file_processing {
        /// Maximum file size allowed for processing (10MB)
        /// SECURITY: Prevents DoS attacks via large benchmark or script files
        /// SSDF: PW.7.1 (Input Validation), PW.8.1 (DoS Protection)
        pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

        /// Threshold for considering a file "large" (1MB)
        /// PERFORMANCE: Affects logging detail for large benchmarks
        pub const LARGE_FILE_THRESHOLD: u64 = 1024 * 1024;

        /// Maximum line count accepted for a single file
        /// SECURITY: Prevents algorithmic complexity attacks
        pub const MAX_LINE_COUNT_FOR_ANALYSIS: usize = 500_000;
    }

    pub mod lexical {
        /// Maximum string literal size (1MB)
        /// SECURITY: Prevents DoS attacks via enormous string literals
        /// SSDF: PW.7.1 (Input Validation), PW.8.1 (DoS Protection)
        pub const MAX_STRING_SIZE: usize = 1_048_576;

        /// Maximum identifier length (255 characters)
        /// SECURITY: Prevents parser complexity attacks
        /// SSDF: PW.7.1 (Input Validation)
        pub const MAX_IDENTIFIER_LENGTH: usize = 255;

        /// Maximum comment length to prevent memory exhaustion
        /// SECURITY: Limits resource consumption per comment
        /// SSDF: PW.8.1 (DoS Protection)
        pub const MAX_COMMENT_LENGTH: usize = 65_536;

        /// Maximum number tokens allowed in a single script
        /// SECURITY: Prevents DoS via token explosion attacks
        /// SSDF: PW.8.1 (DoS Protection)
        pub const MAX_TOKEN_COUNT: usize = 1_000_000;
    }

    pub mod syntax {
        /// Maximum parser recursion depth to prevent stack overflow
        /// SECURITY: Prevents DoS attacks via deeply nested script blocks
        /// SSDF: PW.8.1 (DoS Protection)
        pub const MAX_PARSE_DEPTH: usize = 100;

        /// Maximum error history buffer size
        /// RESOURCE: Controls memory usage for error tracking
        pub const MAX_ERROR_HISTORY: usize = 50;

        /// Maximum context stack depth for error reporting
        /// RESOURCE: Prevents unbounded memory growth
        pub const MAX_CONTEXT_STACK_DEPTH: usize = 20;
    }

    pub mod schema {
        /// Maximum element nesting depth walked during validation
        /// SECURITY: Prevents stack exhaustion on hostile documents
        pub const MAX_ELEMENT_DEPTH: usize = 64;

        /// Maximum number of violations retained by a collecting handler
        /// RESOURCE: Bounds memory for badly broken documents
        pub const MAX_COLLECTED_VIOLATIONS: usize = 10_000;

        /// Maximum depth of named type references resolved while compiling a schema
        /// SECURITY: Prevents recursion through self-referencing types
        pub const MAX_TYPE_RESOLUTION_DEPTH: usize = 32;
    }

    pub mod catalog {
        /// Number of '-' separated fields in a catalog file name
        pub const FILE_NAME_FIELD_COUNT: usize = 4;

        /// Maximum files enumerated from a catalog root
        /// RESOURCE: Bounds directory walks
        pub const MAX_CATALOG_FILES: usize = 50_000;

        /// Maximum directory depth walked below a catalog root
        pub const MAX_CATALOG_DEPTH: usize = 8;
    }

    pub mod batch_processing {
        /// Upper bound on worker threads for per-document stages
        /// RESOURCE: Prevents thread exhaustion
        pub const MAX_WORKER_THREADS: usize = 8;

        /// Maximum documents accepted in a single batch
        /// SECURITY: Prevents resource exhaustion
        pub const MAX_FILES_PER_BATCH: usize = 1000;

        /// Maximum documents handed to one worker thread
        pub const MAX_CHUNK_SIZE: usize = 50;
    }

    pub mod logging {
        /// Maximum log events retained in memory
        /// RESOURCE: Controls memory usage for log buffering
        pub const LOG_BUFFER_SIZE: usize = 10_000;

        /// Maximum log events recorded per file
        /// RESOURCE: Prevents a single broken document from flooding the collector
        pub const MAX_LOG_EVENTS_PER_FILE: usize = 1_000;

        /// Maximum length of a single log message
        /// SECURITY: Prevents log injection via oversized messages
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 4096;

        /// Minimum log level for security-relevant events (1 = Warning)
        /// SECURITY: Security events cannot be filtered out
        pub const SECURITY_MIN_LOG_LEVEL: u8 = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time::*;

    #[test]
    fn test_limits_are_consistent() {
        assert!(file_processing::LARGE_FILE_THRESHOLD <= file_processing::MAX_FILE_SIZE);
        assert!(logging::MAX_LOG_EVENTS_PER_FILE <= logging::LOG_BUFFER_SIZE);
        assert!(batch_processing::MAX_CHUNK_SIZE <= batch_processing::MAX_FILES_PER_BATCH);
        assert_eq!(catalog::FILE_NAME_FIELD_COUNT, 4);
    }
}
