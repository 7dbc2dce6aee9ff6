//! Tokenizer for the PowerShell subset found in DSC resource scripts
//!
//! Produces every token, whitespace and comments included, so spans stay exact.
//! The token stream filters what the parser does not need.

use crate::config::constants::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::file_processor::FileProcessingResult;
use crate::logging::codes;
use crate::tokens::{Keyword, SpannedToken, StringKind, Token, TokenStream};
use crate::utils::{Position, Span, Spanned};
use crate::{log_debug, log_error, log_success};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("Invalid character: '{character}' at line {line}, column {column}")]
    InvalidCharacter {
        character: char,
        line: u32,
        column: u32,
    },

    #[error("Unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: u32, column: u32 },

    #[error("Unterminated block comment starting at line {line}, column {column}")]
    UnterminatedComment { line: u32, column: u32 },

    #[error("Identifier too long: {length} characters (max {MAX_IDENTIFIER_LENGTH})")]
    IdentifierTooLong { length: usize },

    #[error("String too large: {size} bytes (max {MAX_STRING_SIZE})")]
    StringTooLarge { size: usize },

    #[error("Comment too long: {length} characters (max {MAX_COMMENT_LENGTH})")]
    CommentTooLong { length: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize },
}

impl LexerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::InvalidCharacter { .. } => codes::lexical::INVALID_CHARACTER,
            LexerError::UnterminatedString { .. } => codes::lexical::UNTERMINATED_STRING,
            LexerError::UnterminatedComment { .. } => codes::lexical::UNTERMINATED_COMMENT,
            LexerError::IdentifierTooLong { .. } => codes::lexical::IDENTIFIER_TOO_LONG,
            LexerError::StringTooLarge { .. } => codes::lexical::STRING_TOO_LARGE,
            LexerError::CommentTooLong { .. } => codes::lexical::COMMENT_TOO_LONG,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }

    pub fn severity(&self) -> codes::Severity {
        codes::get_severity(self.error_code().as_str())
    }
}

#[derive(Debug, Default, Clone)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub keyword_tokens: usize,
    pub identifier_tokens: usize,
    pub variable_tokens: usize,
    pub string_literals: usize,
    pub comment_count: usize,
    pub max_string_length: usize,
    pub max_comment_length: usize,
}

impl LexicalMetrics {
    fn record_token(&mut self, token: &Token) {
        self.total_tokens += 1;

        match token {
            Token::Keyword(_) => self.keyword_tokens += 1,
            Token::Identifier(_) => self.identifier_tokens += 1,
            Token::Variable(_) => self.variable_tokens += 1,
            Token::StringLiteral { value, .. } => {
                self.string_literals += 1;
                self.max_string_length = self.max_string_length.max(value.len());
            }
            Token::Comment(text) => {
                self.comment_count += 1;
                self.max_comment_length = self.max_comment_length.max(text.len());
            }
            _ => {}
        }
    }
}

/// Character cursor that keeps line and column in step with the byte offset
struct Cursor<'a> {
    source: &'a str,
    pos: Position,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: Position::start(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos = self.pos.advance(ch);
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }
}

fn is_single_quote(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}

fn is_double_quote(ch: char) -> bool {
    matches!(ch, '"' | '\u{201C}' | '\u{201D}' | '\u{201E}')
}

fn is_dash(ch: char) -> bool {
    matches!(ch, '-' | '\u{2013}' | '\u{2014}' | '\u{2015}')
}

fn is_bareword_start(ch: char) -> bool {
    ch.is_alphabetic() || matches!(ch, '_' | '\\' | '~')
}

fn is_bareword_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '\\' | '/' | '~')
}

fn is_variable_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

pub struct LexicalAnalyzer {
    metrics: LexicalMetrics,
    preferences: LexicalPreferences,
}

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self::with_preferences(LexicalPreferences::default())
    }

    pub fn with_preferences(preferences: LexicalPreferences) -> Self {
        Self {
            metrics: LexicalMetrics::default(),
            preferences,
        }
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn tokenize_file_result(
        &mut self,
        file_result: FileProcessingResult,
    ) -> Result<TokenStream, LexerError> {
        log_debug!("Starting lexical analysis",
            "file" => file_result.metadata.path.display(),
            "char_count" => file_result.char_count(),
            "line_count" => file_result.metadata.line_count
        );
        self.tokenize(&file_result.source)
    }

    pub fn tokenize(&mut self, source: &str) -> Result<TokenStream, LexerError> {
        self.metrics = LexicalMetrics::default();

        match self.scan(source) {
            Ok(tokens) => {
                log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
                    "tokens" => tokens.len(),
                    "keywords" => self.metrics.keyword_tokens,
                    "strings" => self.metrics.string_literals
                );
                Ok(TokenStream::new(tokens))
            }
            Err((error, span)) => {
                if self.preferences.include_position_in_errors {
                    log_error!(error.error_code(), &error.to_string(), span = span);
                } else {
                    log_error!(error.error_code(), &error.to_string());
                }
                Err(error)
            }
        }
    }

    fn scan(&mut self, source: &str) -> Result<Vec<SpannedToken>, (LexerError, Span)> {
        let mut cursor = Cursor::new(source);
        let mut tokens = Vec::new();

        while let Some(ch) = cursor.peek() {
            let start = cursor.pos;

            if tokens.len() >= MAX_TOKEN_COUNT {
                let error = LexerError::TooManyTokens {
                    count: tokens.len(),
                };
                return Err((error, Span::new(start, start)));
            }

            let token = self
                .next_token(&mut cursor, ch)
                .map_err(|error| (error, Span::new(start, cursor.pos)))?;

            if self.preferences.collect_detailed_metrics {
                self.metrics.record_token(&token);
            } else {
                self.metrics.total_tokens += 1;
            }
            tokens.push(Spanned::new(token, Span::new(start, cursor.pos)));
        }

        tokens.push(Spanned::new(Token::Eof, Span::new(cursor.pos, cursor.pos)));
        Ok(tokens)
    }

    fn next_token(&self, cursor: &mut Cursor<'_>, ch: char) -> Result<Token, LexerError> {
        let start = cursor.pos;
        let next = cursor.peek_nth(1);

        let token = match ch {
            ' ' | '\u{00A0}' => {
                cursor.bump();
                Token::Space
            }
            '\t' => {
                cursor.bump();
                Token::Tab
            }
            '\n' => {
                cursor.bump();
                Token::Newline
            }
            '\r' => {
                cursor.bump();
                cursor.eat('\n');
                Token::Newline
            }
            '#' => self.line_comment(cursor)?,
            '<' if next == Some('#') => self.block_comment(cursor)?,
            '`' => {
                cursor.bump();
                match cursor.peek() {
                    Some('\n') => {
                        cursor.bump();
                        Token::LineContinuation
                    }
                    Some('\r') => {
                        cursor.bump();
                        cursor.eat('\n');
                        Token::LineContinuation
                    }
                    Some(escaped) => {
                        cursor.bump();
                        Token::Identifier(escaped.to_string())
                    }
                    None => Token::LineContinuation,
                }
            }
            c if is_single_quote(c) => self.single_quoted(cursor)?,
            c if is_double_quote(c) => self.double_quoted(cursor)?,
            '@' => match next {
                Some('(') => {
                    cursor.bump();
                    cursor.bump();
                    Token::AtParen
                }
                Some('{') => {
                    cursor.bump();
                    cursor.bump();
                    Token::AtBrace
                }
                Some(q) if is_single_quote(q) || is_double_quote(q) => {
                    self.here_string(cursor, is_double_quote(q))?
                }
                Some(c) if is_variable_char(c) => {
                    cursor.bump();
                    Token::Variable(self.word(cursor, is_variable_char)?)
                }
                _ => {
                    return Err(LexerError::InvalidCharacter {
                        character: '@',
                        line: start.line,
                        column: start.column,
                    })
                }
            },
            '$' => self.variable(cursor)?,
            '(' => self.single(cursor, Token::LParen),
            ')' => self.single(cursor, Token::RParen),
            '{' => self.single(cursor, Token::LBrace),
            '}' => self.single(cursor, Token::RBrace),
            '[' => self.single(cursor, Token::LBracket),
            ']' => self.single(cursor, Token::RBracket),
            ',' => self.single(cursor, Token::Comma),
            ';' => self.single(cursor, Token::Semicolon),
            '=' => self.single(cursor, Token::Equals),
            '|' if next == Some('|') => {
                cursor.bump();
                cursor.bump();
                Token::Operator("||".to_string())
            }
            '|' => self.single(cursor, Token::Pipe),
            ':' if next == Some(':') => {
                cursor.bump();
                cursor.bump();
                Token::DoubleColon
            }
            ':' => self.single(cursor, Token::Operator(":".to_string())),
            '.' if next == Some('.') => {
                cursor.bump();
                cursor.bump();
                Token::Operator("..".to_string())
            }
            '.' if next.is_some_and(|c| c.is_ascii_digit()) => self.number_or_bareword(cursor)?,
            '.' => self.single(cursor, Token::Dot),
            c if is_dash(c) => self.dash(cursor)?,
            '0'..='9' => self.number_or_bareword(cursor)?,
            '+' | '*' | '/' | '%' | '!' | '>' | '<' | '&' | '?' | '^' => {
                cursor.bump();
                let mut op = ch.to_string();
                if let Some(second) = cursor.peek() {
                    if second == '=' || (second == ch && matches!(ch, '+' | '>' | '&' | '?')) {
                        cursor.bump();
                        op.push(second);
                    }
                }
                Token::Operator(op)
            }
            c if is_bareword_start(c) => {
                let text = self.bareword(cursor)?;
                match Keyword::from_word(&text) {
                    Some(keyword) => Token::Keyword(keyword),
                    None => Token::Identifier(text),
                }
            }
            other => {
                return Err(LexerError::InvalidCharacter {
                    character: other,
                    line: start.line,
                    column: start.column,
                })
            }
        };

        Ok(token)
    }

    fn single(&self, cursor: &mut Cursor<'_>, token: Token) -> Token {
        cursor.bump();
        token
    }

    fn word(
        &self,
        cursor: &mut Cursor<'_>,
        accept: impl Fn(char) -> bool,
    ) -> Result<String, LexerError> {
        let mut text = String::new();
        while let Some(ch) = cursor.peek() {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            cursor.bump();
        }
        check_identifier_length(&text)?;
        Ok(text)
    }

    fn bareword(&self, cursor: &mut Cursor<'_>) -> Result<String, LexerError> {
        let mut text = String::new();
        while let Some(ch) = cursor.peek() {
            let is_drive_colon = ch == ':' && cursor.peek_nth(1) != Some(':') && !text.is_empty();
            if !(is_bareword_char(ch) || is_drive_colon) {
                break;
            }
            // `a..b` is a range, not part of the word
            if ch == '.' && cursor.peek_nth(1) == Some('.') {
                break;
            }
            text.push(ch);
            cursor.bump();
        }
        check_identifier_length(&text)?;
        Ok(text)
    }

    fn number_or_bareword(&self, cursor: &mut Cursor<'_>) -> Result<Token, LexerError> {
        let text = self.bareword(cursor)?;
        if is_numeric_literal(&text) {
            Ok(Token::Number(text))
        } else {
            Ok(Token::Identifier(text))
        }
    }

    fn dash(&self, cursor: &mut Cursor<'_>) -> Result<Token, LexerError> {
        cursor.bump();
        match cursor.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name = self.word(cursor, |c| is_variable_char(c) || c == '-')?;
                Ok(Token::Parameter(name))
            }
            Some(c) if c == '=' || is_dash(c) => {
                cursor.bump();
                Ok(Token::Operator(format!("-{}", if c == '=' { '=' } else { '-' })))
            }
            _ => Ok(Token::Operator("-".to_string())),
        }
    }

    fn variable(&self, cursor: &mut Cursor<'_>) -> Result<Token, LexerError> {
        let start = cursor.pos;
        cursor.bump();

        match cursor.peek() {
            Some('(') => {
                cursor.bump();
                Ok(Token::DollarParen)
            }
            Some('{') => {
                cursor.bump();
                let mut name = String::new();
                loop {
                    match cursor.bump() {
                        Some('}') => break,
                        Some('`') => {
                            if let Some(escaped) = cursor.bump() {
                                name.push(escaped);
                            }
                        }
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(LexerError::UnterminatedString {
                                line: start.line,
                                column: start.column,
                            })
                        }
                    }
                }
                check_identifier_length(&name)?;
                Ok(Token::Variable(name))
            }
            Some(c @ ('$' | '?' | '^')) => {
                cursor.bump();
                Ok(Token::Variable(c.to_string()))
            }
            Some(c) if is_variable_char(c) => {
                let mut name = self.word(cursor, is_variable_char)?;
                // scope or drive qualifier such as $env:Path
                if cursor.peek() == Some(':')
                    && cursor.peek_nth(1).is_some_and(is_variable_char)
                {
                    cursor.bump();
                    name.push(':');
                    name.push_str(&self.word(cursor, is_variable_char)?);
                }
                Ok(Token::Variable(name))
            }
            _ => Ok(Token::Identifier("$".to_string())),
        }
    }

    fn line_comment(&self, cursor: &mut Cursor<'_>) -> Result<Token, LexerError> {
        cursor.bump();
        let mut text = String::new();
        while let Some(ch) = cursor.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            text.push(ch);
            cursor.bump();
        }
        check_comment_length(&text)?;
        Ok(Token::Comment(text))
    }

    fn block_comment(&self, cursor: &mut Cursor<'_>) -> Result<Token, LexerError> {
        let start = cursor.pos;
        cursor.bump();
        cursor.bump();

        let mut text = String::new();
        loop {
            if cursor.starts_with("#>") {
                cursor.bump();
                cursor.bump();
                break;
            }
            match cursor.bump() {
                Some(ch) => text.push(ch),
                None => {
                    return Err(LexerError::UnterminatedComment {
                        line: start.line,
                        column: start.column,
                    })
                }
            }
        }
        check_comment_length(&text)?;
        Ok(Token::Comment(text))
    }

    fn single_quoted(&self, cursor: &mut Cursor<'_>) -> Result<Token, LexerError> {
        let start = cursor.pos;
        cursor.bump();

        let mut value = String::new();
        loop {
            match cursor.bump() {
                Some(ch) if is_single_quote(ch) => {
                    // doubled quote is an escaped quote
                    if cursor.peek().is_some_and(is_single_quote) {
                        cursor.bump();
                        value.push('\'');
                    } else {
                        break;
                    }
                }
                Some(ch) => value.push(ch),
                None => {
                    return Err(LexerError::UnterminatedString {
                        line: start.line,
                        column: start.column,
                    })
                }
            }
        }

        check_string_size(&value)?;
        Ok(Token::StringLiteral {
            value,
            kind: StringKind::SingleQuoted,
        })
    }

    fn double_quoted(&self, cursor: &mut Cursor<'_>) -> Result<Token, LexerError> {
        let start = cursor.pos;
        let unterminated = LexerError::UnterminatedString {
            line: start.line,
            column: start.column,
        };
        cursor.bump();

        let mut value = String::new();
        loop {
            match cursor.bump() {
                Some(ch) if is_double_quote(ch) => {
                    if cursor.peek().is_some_and(is_double_quote) {
                        cursor.bump();
                        value.push('"');
                    } else {
                        break;
                    }
                }
                Some('`') => match cursor.bump() {
                    Some(escaped) => value.push(unescape(escaped)),
                    None => return Err(unterminated),
                },
                Some('$') if cursor.peek() == Some('(') => {
                    value.push('$');
                    self.raw_subexpression(cursor, &mut value)
                        .ok_or_else(|| unterminated.clone())?;
                }
                Some(ch) => value.push(ch),
                None => return Err(unterminated),
            }
        }

        check_string_size(&value)?;
        Ok(Token::StringLiteral {
            value,
            kind: StringKind::DoubleQuoted,
        })
    }

    /// Copy a `$( ... )` block embedded in a double-quoted string verbatim
    fn raw_subexpression(&self, cursor: &mut Cursor<'_>, out: &mut String) -> Option<()> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        loop {
            let ch = cursor.bump()?;
            out.push(ch);

            match quote {
                Some(open) => {
                    if ch == open {
                        quote = None;
                    }
                }
                None => match ch {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(());
                        }
                    }
                    '\'' | '"' => quote = Some(ch),
                    _ => {}
                },
            }
        }
    }

    fn here_string(&self, cursor: &mut Cursor<'_>, expandable: bool) -> Result<Token, LexerError> {
        let start = cursor.pos;
        let unterminated = LexerError::UnterminatedString {
            line: start.line,
            column: start.column,
        };
        cursor.bump();
        let open = cursor.bump().ok_or_else(|| unterminated.clone())?;
        let closes = |ch: char| {
            if is_double_quote(open) {
                is_double_quote(ch)
            } else {
                is_single_quote(ch)
            }
        };

        // header must end the line
        while matches!(cursor.peek(), Some(' ' | '\t')) {
            cursor.bump();
        }
        match cursor.bump() {
            Some('\n') => {}
            Some('\r') => {
                cursor.eat('\n');
            }
            _ => return Err(unterminated),
        }

        let mut value = String::new();
        let mut at_line_start = true;
        loop {
            if at_line_start
                && cursor.peek().is_some_and(closes)
                && cursor.peek_nth(1) == Some('@')
            {
                cursor.bump();
                cursor.bump();
                if value.ends_with('\n') {
                    value.pop();
                    if value.ends_with('\r') {
                        value.pop();
                    }
                }
                break;
            }

            let ch = cursor.bump().ok_or_else(|| unterminated.clone())?;
            at_line_start = ch == '\n' || ch == '\r';
            value.push(ch);
        }

        check_string_size(&value)?;
        let kind = if expandable {
            StringKind::HereDouble
        } else {
            StringKind::HereSingle
        };
        Ok(Token::StringLiteral { value, kind })
    }
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        'a' => '\u{07}',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        'v' => '\u{0B}',
        'e' => '\u{1B}',
        other => other,
    }
}

/// Decimal, real or hex literal with an optional type or multiplier suffix
fn is_numeric_literal(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }

    let body = ["kb", "mb", "gb", "tb", "pb", "l", "d"]
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .unwrap_or(&lower);

    let (mantissa, exponent) = match body.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (body, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();

    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let mantissa_ok = match fraction {
        Some(f) => digits(whole) && digits(f) && !(whole.is_empty() && f.is_empty()),
        None => !whole.is_empty() && digits(whole),
    };
    let exponent_ok = match exponent {
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

fn check_identifier_length(text: &str) -> Result<(), LexerError> {
    let length = text.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(LexerError::IdentifierTooLong { length });
    }
    Ok(())
}

fn check_string_size(value: &str) -> Result<(), LexerError> {
    if value.len() > MAX_STRING_SIZE {
        return Err(LexerError::StringTooLarge { size: value.len() });
    }
    Ok(())
}

fn check_comment_length(text: &str) -> Result<(), LexerError> {
    let length = text.chars().count();
    if length > MAX_COMMENT_LENGTH {
        return Err(LexerError::CommentTooLong { length });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn significant(source: &str) -> Vec<Token> {
        let mut analyzer = LexicalAnalyzer::new();
        let stream = analyzer.tokenize(source).unwrap();
        stream
            .all_tokens()
            .iter()
            .map(|t| t.value.clone())
            .filter(|t| t.is_significant())
            .collect()
    }

    fn string(value: &str, kind: StringKind) -> Token {
        Token::StringLiteral {
            value: value.to_string(),
            kind,
        }
    }

    #[test]
    fn test_configuration_header() {
        let tokens = significant("configuration WindowsServer\n{");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Configuration),
                Token::Identifier("WindowsServer".into()),
                Token::Newline,
                Token::LBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_validate_set_attribute() {
        let tokens = significant("[ValidateSet('2012R2','2016', \"2019\")]");
        assert_eq!(
            tokens,
            vec![
                Token::LBracket,
                Token::Identifier("ValidateSet".into()),
                Token::LParen,
                string("2012R2", StringKind::SingleQuoted),
                Token::Comma,
                string("2016", StringKind::SingleQuoted),
                Token::Comma,
                string("2019", StringKind::DoubleQuoted),
                Token::RParen,
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            significant("'it''s'")[0],
            string("it's", StringKind::SingleQuoted)
        );
        assert_eq!(
            significant("\"a`tb `\"q`\" \"\"x\"\"\"")[0],
            string("a\tb \"q\" \"x\"", StringKind::DoubleQuoted)
        );
        assert_eq!(
            significant("\"v $(Get-Date -f 'yyyy') end\"")[0],
            string("v $(Get-Date -f 'yyyy') end", StringKind::DoubleQuoted)
        );
    }

    #[test]
    fn test_here_strings() {
        let tokens = significant("@'\nline one\nline 'two'\n'@\n");
        assert_eq!(
            tokens[0],
            string("line one\nline 'two'", StringKind::HereSingle)
        );

        let tokens = significant("@\"\r\nvalue\r\n\"@");
        assert_eq!(tokens[0], string("value", StringKind::HereDouble));
    }

    #[test]
    fn test_variables_and_parameters() {
        let tokens = significant("$StigVersion ${odd name} $env:Path @splat -Name -eq $_");
        assert_eq!(
            tokens,
            vec![
                Token::Variable("StigVersion".into()),
                Token::Variable("odd name".into()),
                Token::Variable("env:Path".into()),
                Token::Variable("splat".into()),
                Token::Parameter("Name".into()),
                Token::Parameter("eq".into()),
                Token::Variable("_".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_and_barewords() {
        let tokens = significant("1.10 0x1F 10kb 1..3 2019Server Import-DscResource");
        assert_eq!(
            tokens,
            vec![
                Token::Number("1.10".into()),
                Token::Number("0x1F".into()),
                Token::Number("10kb".into()),
                Token::Number("1".into()),
                Token::Operator("..".into()),
                Token::Number("3".into()),
                Token::Identifier("2019Server".into()),
                Token::Identifier("Import-DscResource".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_continuations_are_insignificant() {
        let tokens = significant("<# header\n block #>\nNode `\n localhost # trailing");
        assert_eq!(
            tokens,
            vec![
                Token::Newline,
                Token::Identifier("Node".into()),
                Token::Identifier("localhost".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let mut analyzer = LexicalAnalyzer::new();
        let stream = analyzer.tokenize("param\n  ($a)").unwrap();
        let variable = stream
            .all_tokens()
            .iter()
            .find(|t| matches!(t.value, Token::Variable(_)))
            .unwrap();
        assert_eq!(variable.span.start.line, 2);
        assert_eq!(variable.span.start.column, 4);
        assert_eq!(variable.span.slice("param\n  ($a)"), "$a");
    }

    #[test]
    fn test_errors() {
        let mut analyzer = LexicalAnalyzer::new();
        assert_matches!(
            analyzer.tokenize("'open"),
            Err(LexerError::UnterminatedString { line: 1, column: 1 })
        );
        assert_matches!(
            analyzer.tokenize("<# never closed"),
            Err(LexerError::UnterminatedComment { .. })
        );
        assert_matches!(
            analyzer.tokenize("a\n @ b"),
            Err(LexerError::InvalidCharacter {
                character: '@',
                line: 2,
                column: 2
            })
        );
    }

    #[test]
    fn test_metrics() {
        let mut analyzer = LexicalAnalyzer::with_preferences(LexicalPreferences {
            collect_detailed_metrics: true,
            include_position_in_errors: true,
        });
        analyzer
            .tokenize("Configuration X { param([string] $v = 'abc') } # c")
            .unwrap();
        let metrics = analyzer.metrics();
        assert_eq!(metrics.keyword_tokens, 2);
        assert_eq!(metrics.variable_tokens, 1);
        assert_eq!(metrics.string_literals, 1);
        assert_eq!(metrics.comment_count, 1);
        assert_eq!(metrics.max_string_length, 3);
    }
}
