//! Syntax errors raised while building the script AST

use crate::logging::{codes, Code};
use crate::utils::Span;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unexpected token: expected {expected}, found {found} at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEndOfInput { expected: String },

    #[error("Empty token stream - no tokens to parse")]
    EmptyTokenStream,

    #[error("Missing EOF token in token stream")]
    MissingEof,

    #[error("Grammar violation: {message} at {span}")]
    GrammarViolation { message: String, span: Span },

    #[error("Unmatched block delimiter: '{delimiter}' opened at {span}")]
    UnmatchedBlockDelimiter { delimiter: String, span: Span },

    #[error("Maximum nesting depth exceeded at {span}")]
    MaxRecursionDepth { span: Span },

    #[error("Internal parser error: {message}")]
    InternalParserError { message: String },
}

impl SyntaxError {
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        }
    }

    pub fn unexpected_end_of_input(expected: &str) -> Self {
        Self::UnexpectedEndOfInput {
            expected: expected.to_string(),
        }
    }

    pub fn grammar_violation(message: &str, span: Span) -> Self {
        Self::GrammarViolation {
            message: message.to_string(),
            span,
        }
    }

    pub fn unmatched_delimiter(delimiter: &str, span: Span) -> Self {
        Self::UnmatchedBlockDelimiter {
            delimiter: delimiter.to_string(),
            span,
        }
    }

    pub fn max_recursion_depth(span: Span) -> Self {
        Self::MaxRecursionDepth { span }
    }

    pub fn internal_parser_error(message: &str) -> Self {
        Self::InternalParserError {
            message: message.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::UnexpectedEndOfInput { .. } => codes::syntax::UNEXPECTED_END_OF_INPUT,
            Self::EmptyTokenStream => codes::syntax::EMPTY_TOKEN_STREAM,
            Self::MissingEof => codes::syntax::MISSING_EOF,
            Self::GrammarViolation { .. } => codes::syntax::GRAMMAR_VIOLATION,
            Self::UnmatchedBlockDelimiter { .. } => codes::syntax::UNMATCHED_DELIMITER,
            Self::MaxRecursionDepth { .. } => codes::syntax::MAX_RECURSION_DEPTH,
            Self::InternalParserError { .. } => codes::syntax::INTERNAL_PARSER_ERROR,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::GrammarViolation { span, .. }
            | Self::UnmatchedBlockDelimiter { span, .. }
            | Self::MaxRecursionDepth { span } => Some(*span),
            Self::UnexpectedEndOfInput { .. }
            | Self::EmptyTokenStream
            | Self::MissingEof
            | Self::InternalParserError { .. } => None,
        }
    }

    pub fn requires_halt(&self) -> bool {
        matches!(
            self,
            Self::InternalParserError { .. } | Self::MaxRecursionDepth { .. }
        )
    }

    pub fn is_recoverable(&self) -> bool {
        !self.requires_halt()
    }

    pub fn severity(&self) -> codes::Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }

    /// Error text followed by the registry's recommended action
    pub fn enhanced_message(&self) -> String {
        format!("{} ({})", self, self.recommended_action())
    }
}

/// Parser state captured when an error is reported
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub parsing_context: Vec<String>,
    pub surrounding_tokens: String,
    pub file_position: Option<(u32, u32)>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.parsing_context = context;
        self
    }

    pub fn with_tokens(mut self, tokens: String) -> Self {
        self.surrounding_tokens = tokens;
        self
    }

    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.file_position = Some((line, column));
        self
    }

    pub fn format_context(&self) -> String {
        let mut parts = Vec::new();
        if !self.parsing_context.is_empty() {
            parts.push(format!("in {}", self.parsing_context.join(" > ")));
        }
        if let Some((line, column)) = self.file_position {
            parts.push(format!("at {}:{}", line, column));
        }
        if !self.surrounding_tokens.is_empty() {
            parts.push(format!("near `{}`", self.surrounding_tokens));
        }
        parts.join(", ")
    }
}
