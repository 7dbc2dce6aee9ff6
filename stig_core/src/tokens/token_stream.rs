//! Token stream that hides whitespace and comments from the parser while
//! keeping their source spans available

use crate::tokens::token::Token;
use crate::utils::{Span, Spanned};

pub type SpannedToken = Spanned<Token>;

#[derive(Debug, Clone)]
pub struct TokenStream {
    /// All tokens (including whitespace and comments) with original spans
    all_tokens: Vec<SpannedToken>,
    /// Indices into all_tokens for significant tokens
    significant_indices: Vec<usize>,
    /// Current position in significant_indices
    position: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        let significant_indices = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.value.is_significant())
            .map(|(i, _)| i)
            .collect();

        Self {
            all_tokens: tokens,
            significant_indices,
            position: 0,
        }
    }

    pub fn current(&self) -> Option<&SpannedToken> {
        self.peek_ahead(0)
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.current().map(|t| &t.value)
    }

    /// Span of the current token, or of the last token once exhausted
    pub fn current_span(&self) -> Span {
        self.current()
            .or_else(|| self.all_tokens.last())
            .map(|t| t.span)
            .unwrap_or_else(Span::dummy)
    }

    pub fn peek_ahead(&self, n: usize) -> Option<&SpannedToken> {
        self.significant_indices
            .get(self.position + n)
            .and_then(|&i| self.all_tokens.get(i))
    }

    pub fn advance(&mut self) -> Option<&SpannedToken> {
        let index = *self.significant_indices.get(self.position)?;
        self.position += 1;
        self.all_tokens.get(index)
    }

    pub fn check(&self, expected: &Token) -> bool {
        self.current_token() == Some(expected)
    }

    pub fn advance_if(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.current_token(), None | Some(Token::Eof))
    }

    /// Number of significant tokens
    pub fn len(&self) -> usize {
        self.significant_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.significant_indices.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn restore_position(&mut self, saved_position: usize) {
        self.position = saved_position.min(self.significant_indices.len());
    }

    pub fn has_eof(&self) -> bool {
        matches!(
            self.all_tokens.last().map(|t| &t.value),
            Some(Token::Eof)
        )
    }

    pub fn all_tokens(&self) -> &[SpannedToken] {
        &self.all_tokens
    }

    /// Significant tokens around the current position, for error context
    pub fn context_snippet(&self, radius: usize) -> String {
        let start = self.position.saturating_sub(radius);
        let end = (self.position + radius + 1).min(self.significant_indices.len());

        self.significant_indices[start..end]
            .iter()
            .filter_map(|&i| self.all_tokens.get(i))
            .filter(|t| !matches!(t.value, Token::Newline | Token::Eof))
            .map(|t| t.value.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
