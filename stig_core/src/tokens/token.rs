//! Token definitions for the PowerShell subset used by DSC resource scripts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keywords the parser gives structure to. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Configuration,
    Param,
    Function,
    Filter,
    Workflow,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "configuration" => Some(Keyword::Configuration),
            "param" => Some(Keyword::Param),
            "function" => Some(Keyword::Function),
            "filter" => Some(Keyword::Filter),
            "workflow" => Some(Keyword::Workflow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Configuration => "Configuration",
            Keyword::Param => "param",
            Keyword::Function => "function",
            Keyword::Filter => "filter",
            Keyword::Workflow => "workflow",
        }
    }

    /// Keywords that introduce a named function-like definition
    pub fn is_function_like(&self) -> bool {
        matches!(self, Keyword::Function | Keyword::Filter | Keyword::Workflow)
    }
}

/// Quoting style of a string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringKind {
    SingleQuoted,
    DoubleQuoted,
    HereSingle,
    HereDouble,
}

impl StringKind {
    /// Whether the literal may contain variable expansion at runtime
    pub fn is_expandable(&self) -> bool {
        matches!(self, StringKind::DoubleQuoted | StringKind::HereDouble)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    Keyword(Keyword),
    /// Bareword: command names, unquoted arguments, member and type names
    Identifier(String),
    /// `$name`, `${name}`, `$scope:name` or splatted `@name`, stored without sigil
    Variable(String),
    /// `-Name` command parameter or dash operator such as `-eq`, stored without dash
    Parameter(String),
    StringLiteral {
        value: String,
        kind: StringKind,
    },
    /// Numeric literal kept as written so `1.10` stays distinct from `1.1`
    Number(String),

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    /// `@(`
    AtParen,
    /// `@{`
    AtBrace,
    /// `$(`
    DollarParen,

    Comma,
    Semicolon,
    Equals,
    Dot,
    DoubleColon,
    Pipe,
    Operator(String),

    Newline,
    Space,
    Tab,
    /// Backtick at end of line
    LineContinuation,
    Comment(String),
    Eof,
}

impl Token {
    /// Whether the parser sees this token; newlines stay significant as statement separators
    pub fn is_significant(&self) -> bool {
        !matches!(
            self,
            Token::Space | Token::Tab | Token::Comment(_) | Token::LineContinuation
        )
    }

    pub fn is_statement_terminator(&self) -> bool {
        matches!(self, Token::Newline | Token::Semicolon)
    }

    /// Opening delimiter that must be closed by `)`
    pub fn opens_paren(&self) -> bool {
        matches!(self, Token::LParen | Token::AtParen | Token::DollarParen)
    }

    pub fn display_name(&self) -> String {
        match self {
            Token::Keyword(k) => format!("keyword '{}'", k.as_str()),
            Token::Identifier(s) => format!("identifier '{}'", s),
            Token::Variable(s) => format!("variable '${}'", s),
            Token::Parameter(s) => format!("parameter '-{}'", s),
            Token::StringLiteral { value, .. } => format!("string '{}'", value),
            Token::Number(n) => format!("number '{}'", n),
            Token::Operator(op) => format!("operator '{}'", op),
            Token::Comment(_) => "comment".to_string(),
            Token::Newline => "newline".to_string(),
            Token::Space | Token::Tab => "whitespace".to_string(),
            Token::LineContinuation => "line continuation".to_string(),
            Token::Eof => "end of input".to_string(),
            other => format!("'{}'", other),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k.as_str()),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Variable(s) => write!(f, "${}", s),
            Token::Parameter(s) => write!(f, "-{}", s),
            Token::StringLiteral { value, kind } => match kind {
                StringKind::SingleQuoted | StringKind::HereSingle => write!(f, "'{}'", value),
                StringKind::DoubleQuoted | StringKind::HereDouble => write!(f, "\"{}\"", value),
            },
            Token::Number(n) => write!(f, "{}", n),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::AtParen => write!(f, "@("),
            Token::AtBrace => write!(f, "@{{"),
            Token::DollarParen => write!(f, "$("),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Equals => write!(f, "="),
            Token::Dot => write!(f, "."),
            Token::DoubleColon => write!(f, "::"),
            Token::Pipe => write!(f, "|"),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Newline => writeln!(f),
            Token::Space => write!(f, " "),
            Token::Tab => write!(f, "\t"),
            Token::LineContinuation => write!(f, "`"),
            Token::Comment(c) => write!(f, "#{}", c),
            Token::Eof => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(Keyword::from_word("CONFIGURATION"), Some(Keyword::Configuration));
        assert_eq!(Keyword::from_word("Param"), Some(Keyword::Param));
        assert_eq!(Keyword::from_word("Node"), None);
        assert!(Keyword::Filter.is_function_like());
    }

    #[test]
    fn test_significance() {
        assert!(Token::Newline.is_significant());
        assert!(!Token::Comment("x".into()).is_significant());
        assert!(!Token::LineContinuation.is_significant());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Token::Variable("StigVersion".into()).display_name(), "variable '$StigVersion'");
        assert_eq!(Token::AtBrace.display_name(), "'@{'");
    }
}
