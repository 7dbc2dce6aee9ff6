//! Recursive-descent parser for DSC resource scripts

use crate::config::constants::compile_time::syntax::*;
use crate::logging::codes;
use crate::syntax::ast::*;
use crate::syntax::error::{ErrorContext, SyntaxError, SyntaxResult};
use crate::tokens::{Keyword, SpannedToken, Token, TokenStream};
use crate::utils::{Span, Spanned};
use crate::{log_debug, log_error, log_success};
use std::collections::VecDeque;

/// Result of parsing a `[ ... ]` construct
enum Bracket {
    Attribute(AttributeAst),
    Type(Spanned<String>),
    /// Index or slice, as in `$values[0]`
    Index(ExpressionAst),
}

pub struct ScriptParser {
    tokens: TokenStream,
    context_stack: Vec<String>,
    error_history: VecDeque<SyntaxError>,
    parse_depth: usize,
    last_span: Span,
}

impl ScriptParser {
    pub fn new(tokens: TokenStream) -> Self {
        log_debug!("Creating script parser", "tokens" => tokens.len());

        Self {
            tokens,
            context_stack: Vec::new(),
            error_history: VecDeque::new(),
            parse_depth: 0,
            last_span: Span::dummy(),
        }
    }

    pub fn parse_script(&mut self) -> SyntaxResult<ScriptBlockAst> {
        if self.tokens.is_empty() {
            let error = SyntaxError::EmptyTokenStream;
            log_error!(error.error_code(), "Cannot parse empty token stream");
            return Err(error);
        }

        if !self.tokens.has_eof() {
            let error = SyntaxError::MissingEof;
            log_error!(error.error_code(), "Token stream missing EOF token");
            return Err(error);
        }

        self.push_context("script");
        let result = self.parse_block_contents(None);

        match result {
            Ok(script) => {
                log_success!(codes::success::SCRIPT_PARSE_COMPLETE, "Script parsing completed",
                    "statements" => script.statements.len(),
                    "has_param_block" => script.param_block.is_some()
                );
                self.pop_context();
                Ok(script)
            }
            Err(error) => {
                let context = self.error_context();
                self.record_error(error.clone());

                log_error!(error.error_code(), &error.to_string(),
                    span = error.span().unwrap_or_else(|| self.tokens.current_span()),
                    "context" => context.format_context()
                );

                self.pop_context();
                Err(error)
            }
        }
    }

    pub fn error_history(&self) -> Vec<&SyntaxError> {
        self.error_history.iter().collect()
    }

    fn record_error(&mut self, error: SyntaxError) {
        if self.error_history.len() >= MAX_ERROR_HISTORY {
            self.error_history.pop_front();
        }
        self.error_history.push_back(error);
    }

    fn error_context(&self) -> ErrorContext {
        let skip = self
            .context_stack
            .len()
            .saturating_sub(MAX_CONTEXT_STACK_DEPTH);
        let span = self.tokens.current_span();

        ErrorContext::new()
            .with_context(self.context_stack[skip..].to_vec())
            .with_tokens(self.tokens.context_snippet(3))
            .with_position(span.start.line, span.start.column)
    }

    fn push_context(&mut self, context: &str) {
        self.context_stack.push(context.to_string());
    }

    fn pop_context(&mut self) {
        self.context_stack.pop();
    }

    fn enter(&mut self) -> SyntaxResult<()> {
        if self.parse_depth >= MAX_PARSE_DEPTH {
            return Err(SyntaxError::max_recursion_depth(self.tokens.current_span()));
        }
        self.parse_depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.parse_depth = self.parse_depth.saturating_sub(1);
    }

    // ------------------------------------------------------------------
    // token helpers
    // ------------------------------------------------------------------

    fn current(&self) -> Option<&Token> {
        self.tokens.current_token()
    }

    fn check(&self, expected: &Token) -> bool {
        self.tokens.check(expected)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.advance().cloned();
        if let Some(token) = &token {
            self.last_span = token.span;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while self.check(&Token::Newline) {
            self.advance();
        }
    }

    fn skip_terminators(&mut self) {
        while matches!(self.current(), Some(Token::Newline | Token::Semicolon)) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.tokens.current() {
            Some(token) if token.value != Token::Eof => {
                SyntaxError::unexpected_token(expected, &token.value.display_name(), token.span)
            }
            _ => SyntaxError::unexpected_end_of_input(expected),
        }
    }

    fn expect(&mut self, expected: &Token, description: &str) -> SyntaxResult<Span> {
        if self.check(expected) {
            Ok(self.last_span_after_advance())
        } else {
            Err(self.unexpected(description))
        }
    }

    fn last_span_after_advance(&mut self) -> Span {
        self.advance();
        self.last_span
    }

    // ------------------------------------------------------------------
    // blocks and statements
    // ------------------------------------------------------------------

    /// Parse the inside of a script block; `opener` is the `{` span for nested blocks
    fn parse_block_contents(&mut self, opener: Option<Span>) -> SyntaxResult<ScriptBlockAst> {
        self.enter()?;
        let start = opener.unwrap_or_else(|| self.tokens.current_span());

        self.skip_terminators();
        let (attributes, param_block) = self.parse_leading_param_block()?;

        let mut statements = Vec::new();
        loop {
            self.skip_terminators();
            match self.current() {
                None | Some(Token::Eof) => {
                    if let Some(open) = opener {
                        return Err(SyntaxError::unmatched_delimiter("{", open));
                    }
                    break;
                }
                Some(Token::RBrace) if opener.is_some() => {
                    self.advance();
                    break;
                }
                Some(Token::RBrace | Token::RParen | Token::RBracket) => {
                    return Err(self.unexpected("statement"));
                }
                _ => statements.push(self.parse_statement()?),
            }
        }

        self.leave();
        Ok(ScriptBlockAst {
            attributes,
            param_block,
            statements,
            span: start.merge(self.last_span),
        })
    }

    /// `[CmdletBinding()] param( ... )` at the top of a block
    fn parse_leading_param_block(
        &mut self,
    ) -> SyntaxResult<(Vec<AttributeAst>, Option<ParamBlockAst>)> {
        let saved = self.tokens.position();
        let saved_span = self.last_span;
        let mut attributes = Vec::new();

        while self.check(&Token::LBracket) {
            match self.parse_bracket()? {
                Bracket::Attribute(attribute) => attributes.push(attribute),
                Bracket::Type(_) | Bracket::Index(_) => break,
            }
            self.skip_newlines();
        }

        if self.check(&Token::Keyword(Keyword::Param)) {
            let param_block = self.parse_param_block()?;
            return Ok((attributes, Some(param_block)));
        }

        self.tokens.restore_position(saved);
        self.last_span = saved_span;
        Ok((Vec::new(), None))
    }

    fn parse_statement(&mut self) -> SyntaxResult<StatementAst> {
        let next_is_name = matches!(
            self.tokens.peek_ahead(1).map(|t| &t.value),
            Some(Token::Identifier(_) | Token::StringLiteral { .. })
        );

        match self.current() {
            Some(Token::Keyword(Keyword::Configuration)) if next_is_name => {
                Ok(StatementAst::Configuration(self.parse_configuration()?))
            }
            Some(Token::Keyword(k)) if k.is_function_like() && next_is_name => {
                Ok(StatementAst::Function(self.parse_function()?))
            }
            _ => Ok(StatementAst::Pipeline(self.parse_pipeline()?)),
        }
    }

    fn parse_definition_name(&mut self, what: &str) -> SyntaxResult<Spanned<String>> {
        match self.advance() {
            Some(Spanned {
                value: Token::Identifier(name) | Token::StringLiteral { value: name, .. },
                span,
            }) => Ok(Spanned::new(name, span)),
            _ => Err(SyntaxError::internal_parser_error(&format!(
                "{} name was checked before parsing",
                what
            ))),
        }
    }

    fn parse_configuration(&mut self) -> SyntaxResult<ConfigurationAst> {
        let keyword_span = self.advance().map(|t| t.span).unwrap_or(self.last_span);
        let name = self.parse_definition_name("configuration")?;
        self.push_context(&format!("configuration {}", name.value));

        self.skip_newlines();
        let open = self.expect(&Token::LBrace, "'{' after configuration name")?;
        let body = self.parse_block_contents(Some(open))?;

        self.pop_context();
        Ok(ConfigurationAst {
            name,
            span: keyword_span.merge(body.span),
            body,
        })
    }

    fn parse_function(&mut self) -> SyntaxResult<FunctionAst> {
        let keyword_span = self.advance().map(|t| t.span).unwrap_or(self.last_span);
        let name = self.parse_definition_name("function")?;
        self.push_context(&format!("function {}", name.value));

        self.skip_newlines();
        let parameters = if self.check(&Token::LParen) {
            let open = self.last_span_after_advance();
            let parameters = self.parse_parameter_list(open)?;
            self.skip_newlines();
            Some(ParamBlockAst {
                parameters,
                span: open.merge(self.last_span),
            })
        } else {
            None
        };

        let open = self.expect(&Token::LBrace, "'{' before function body")?;
        let body = self.parse_block_contents(Some(open))?;

        self.pop_context();
        Ok(FunctionAst {
            name,
            parameters,
            span: keyword_span.merge(body.span),
            body,
        })
    }

    fn parse_pipeline(&mut self) -> SyntaxResult<PipelineAst> {
        let start = self.tokens.current_span();
        let mut elements = Vec::new();

        loop {
            match self.current() {
                None | Some(Token::Eof | Token::RBrace | Token::RParen) => break,
                Some(Token::Newline) if self.continues_on_next_line(elements.last()) => {
                    self.skip_newlines();
                }
                Some(Token::Newline | Token::Semicolon) => {
                    self.advance();
                    break;
                }
                Some(Token::Pipe) => {
                    let span = self.last_span_after_advance();
                    elements.push(ExpressionAst::Operator {
                        text: "|".to_string(),
                        span,
                    });
                    // a trailing pipe continues the pipeline on the next line
                    self.skip_newlines();
                }
                _ => elements.push(self.parse_element()?),
            }
        }

        let end = elements.last().map(|e| e.span()).unwrap_or(start);
        Ok(PipelineAst {
            elements,
            span: start.merge(end),
        })
    }

    /// A block opening on the next line, or an `else`/`catch` clause after a
    /// closing brace, belongs to the current statement
    fn continues_on_next_line(&self, last: Option<&ExpressionAst>) -> bool {
        let Some(last) = last else {
            return false;
        };

        let mut ahead = 0;
        while matches!(
            self.tokens.peek_ahead(ahead).map(|t| &t.value),
            Some(Token::Newline)
        ) {
            ahead += 1;
        }

        match self.tokens.peek_ahead(ahead).map(|t| &t.value) {
            Some(Token::LBrace) => true,
            Some(Token::Identifier(word)) => {
                matches!(last, ExpressionAst::ScriptBlock(_))
                    && ["else", "elseif", "catch", "finally"]
                        .iter()
                        .any(|clause| word.eq_ignore_ascii_case(clause))
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // parameters and attributes
    // ------------------------------------------------------------------

    fn parse_param_block(&mut self) -> SyntaxResult<ParamBlockAst> {
        let keyword_span = self.last_span_after_advance();
        self.push_context("param block");

        self.skip_newlines();
        let open = self.expect(&Token::LParen, "'(' after param")?;
        let parameters = self.parse_parameter_list(open)?;

        self.pop_context();
        Ok(ParamBlockAst {
            parameters,
            span: keyword_span.merge(self.last_span),
        })
    }

    /// Comma-separated parameter declarations up to and including the closing `)`
    fn parse_parameter_list(&mut self, open: Span) -> SyntaxResult<Vec<ParameterAst>> {
        let mut parameters = Vec::new();

        loop {
            self.skip_newlines();
            match self.current() {
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                None | Some(Token::Eof) => return Err(SyntaxError::unmatched_delimiter("(", open)),
                _ => parameters.push(self.parse_parameter()?),
            }

            self.skip_newlines();
            match self.current() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {}
                None | Some(Token::Eof) => return Err(SyntaxError::unmatched_delimiter("(", open)),
                _ => return Err(self.unexpected("',' or ')' in parameter list")),
            }
        }

        Ok(parameters)
    }

    fn parse_parameter(&mut self) -> SyntaxResult<ParameterAst> {
        let start = self.tokens.current_span();
        let mut attributes = Vec::new();
        let mut type_constraints = Vec::new();

        while self.check(&Token::LBracket) {
            match self.parse_bracket()? {
                Bracket::Attribute(attribute) => attributes.push(attribute),
                Bracket::Type(name) => type_constraints.push(name),
                Bracket::Index(expression) => {
                    return Err(SyntaxError::grammar_violation(
                        "expected attribute or type constraint in parameter declaration",
                        expression.span(),
                    ))
                }
            }
            self.skip_newlines();
        }

        let name = match self.tokens.current().cloned() {
            Some(Spanned {
                value: Token::Variable(name),
                span,
            }) => {
                self.advance();
                Spanned::new(name, span)
            }
            _ => return Err(self.unexpected("parameter variable")),
        };

        self.skip_newlines();
        let default_value = if self.check(&Token::Equals) {
            self.advance();
            Some(self.parse_argument_value()?)
        } else {
            None
        };

        Ok(ParameterAst {
            name,
            attributes,
            type_constraints,
            default_value,
            span: start.merge(self.last_span),
        })
    }

    fn parse_bracket(&mut self) -> SyntaxResult<Bracket> {
        self.enter()?;
        let open = self.expect(&Token::LBracket, "'['")?;
        self.skip_newlines();

        let is_name = matches!(self.current(), Some(Token::Identifier(_)));
        let follows = self.tokens.peek_ahead(1).map(|t| t.value.clone());

        let bracket = match (is_name, follows) {
            (true, Some(Token::LParen)) => {
                let name = self.parse_definition_name("attribute")?;
                let paren = self.last_span_after_advance();
                let (positional, named) = self.parse_attribute_arguments(paren)?;
                self.skip_newlines();
                self.expect_closing_bracket(open)?;
                Bracket::Attribute(AttributeAst {
                    name,
                    positional,
                    named,
                    span: open.merge(self.last_span),
                })
            }
            (true, Some(Token::RBracket | Token::LBracket)) => {
                let name = self.parse_type_name()?;
                self.expect_closing_bracket(open)?;
                Bracket::Type(name)
            }
            _ => {
                let mut elements = Vec::new();
                loop {
                    self.skip_newlines();
                    match self.current() {
                        Some(Token::RBracket) => break,
                        None | Some(Token::Eof) => {
                            return Err(SyntaxError::unmatched_delimiter("[", open))
                        }
                        _ => elements.push(self.parse_element()?),
                    }
                }
                self.advance();
                let span = open.merge(self.last_span);
                Bracket::Index(ExpressionAst::Compound { elements, span })
            }
        };

        self.leave();
        Ok(bracket)
    }

    fn expect_closing_bracket(&mut self, open: Span) -> SyntaxResult<()> {
        match self.current() {
            Some(Token::RBracket) => {
                self.advance();
                Ok(())
            }
            None | Some(Token::Eof) => Err(SyntaxError::unmatched_delimiter("[", open)),
            _ => Err(self.unexpected("']'")),
        }
    }

    /// Type name with array or generic suffixes such as `string[]` or `List[int]`
    fn parse_type_name(&mut self) -> SyntaxResult<Spanned<String>> {
        let mut name = self.parse_definition_name("type")?;

        while self.check(&Token::LBracket) {
            let open = self.last_span_after_advance();
            let mut depth = 1usize;
            name.value.push('[');

            loop {
                match self.advance() {
                    Some(Spanned {
                        value: Token::LBracket,
                        ..
                    }) => {
                        depth += 1;
                        name.value.push('[');
                    }
                    Some(Spanned {
                        value: Token::RBracket,
                        ..
                    }) => {
                        depth -= 1;
                        name.value.push(']');
                        if depth == 0 {
                            break;
                        }
                    }
                    Some(Spanned {
                        value: Token::Eof, ..
                    })
                    | None => return Err(SyntaxError::unmatched_delimiter("[", open)),
                    Some(token) => name.value.push_str(&token.value.to_string()),
                }
            }
            name.span = name.span.merge(self.last_span);
        }

        Ok(name)
    }

    fn parse_attribute_arguments(
        &mut self,
        open: Span,
    ) -> SyntaxResult<(Vec<ExpressionAst>, Vec<NamedArgumentAst>)> {
        let mut positional = Vec::new();
        let mut named = Vec::new();

        loop {
            self.skip_newlines();
            match self.current() {
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                None | Some(Token::Eof) => return Err(SyntaxError::unmatched_delimiter("(", open)),
                _ => {}
            }

            let named_form = match (self.current(), self.tokens.peek_ahead(1).map(|t| &t.value)) {
                (Some(Token::Identifier(_)), Some(Token::Equals)) => Some(true),
                (Some(Token::Identifier(_)), Some(Token::Comma | Token::RParen)) => Some(false),
                _ => None,
            };

            match named_form {
                Some(has_value) => {
                    let name = self.parse_definition_name("argument")?;
                    let value = if has_value {
                        self.advance();
                        Some(self.parse_argument_value()?)
                    } else {
                        None
                    };
                    named.push(NamedArgumentAst { name, value });
                }
                None => positional.push(self.parse_argument_value()?),
            }

            self.skip_newlines();
            match self.current() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {}
                None | Some(Token::Eof) => return Err(SyntaxError::unmatched_delimiter("(", open)),
                _ => return Err(self.unexpected("',' or ')' in attribute arguments")),
            }
        }

        Ok((positional, named))
    }

    /// One value in an argument or parameter list, ending before `,` or `)`
    fn parse_argument_value(&mut self) -> SyntaxResult<ExpressionAst> {
        let mut elements = Vec::new();

        loop {
            self.skip_newlines();
            match self.current() {
                None | Some(Token::Eof | Token::Comma | Token::RParen) => break,
                _ => elements.push(self.parse_element()?),
            }
        }

        match elements.len() {
            0 => Err(self.unexpected("value")),
            1 => Ok(elements.remove(0)),
            _ => {
                let span = elements[0].span().merge(self.last_span);
                Ok(ExpressionAst::Compound { elements, span })
            }
        }
    }

    // ------------------------------------------------------------------
    // elements
    // ------------------------------------------------------------------

    fn parse_element(&mut self) -> SyntaxResult<ExpressionAst> {
        let token = match self.tokens.current().cloned() {
            Some(token) => token,
            None => return Err(SyntaxError::unexpected_end_of_input("expression")),
        };
        let span = token.span;

        let element = match token.value {
            Token::StringLiteral { value, kind } => {
                self.advance();
                ExpressionAst::StringConstant {
                    value,
                    expandable: kind.is_expandable(),
                    span,
                }
            }
            Token::Number(text) => {
                self.advance();
                ExpressionAst::Number { text, span }
            }
            Token::Variable(name) => {
                self.advance();
                ExpressionAst::Variable { name, span }
            }
            Token::Identifier(text) => {
                self.advance();
                ExpressionAst::Bareword { text, span }
            }
            Token::Keyword(keyword) => {
                self.advance();
                ExpressionAst::Bareword {
                    text: keyword.as_str().to_string(),
                    span,
                }
            }
            Token::Parameter(name) => {
                self.advance();
                ExpressionAst::Parameter { name, span }
            }
            Token::LBrace => {
                self.advance();
                let block = self.parse_block_contents(Some(span))?;
                ExpressionAst::ScriptBlock(Box::new(block))
            }
            Token::AtBrace => self.parse_hashtable()?,
            Token::LParen | Token::DollarParen | Token::AtParen => {
                let kind = match token.value {
                    Token::DollarParen => SubExpressionKind::Dollar,
                    Token::AtParen => SubExpressionKind::Array,
                    _ => SubExpressionKind::Paren,
                };
                self.parse_sub_expression(kind)?
            }
            Token::LBracket => match self.parse_bracket()? {
                Bracket::Attribute(attribute) => ExpressionAst::Attribute(Box::new(attribute)),
                Bracket::Type(name) => ExpressionAst::TypeLiteral {
                    name: name.value,
                    span: name.span,
                },
                Bracket::Index(expression) => expression,
            },
            Token::Comma
            | Token::Equals
            | Token::Dot
            | Token::DoubleColon
            | Token::Pipe
            | Token::Operator(_) => {
                self.advance();
                ExpressionAst::Operator {
                    text: token.value.to_string(),
                    span,
                }
            }
            _ => return Err(self.unexpected("expression")),
        };

        Ok(element)
    }

    fn parse_sub_expression(&mut self, kind: SubExpressionKind) -> SyntaxResult<ExpressionAst> {
        self.enter()?;
        let open = self.last_span_after_advance();
        let mut statements = Vec::new();

        loop {
            self.skip_terminators();
            match self.current() {
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                None | Some(Token::Eof) => return Err(SyntaxError::unmatched_delimiter("(", open)),
                Some(Token::RBrace | Token::RBracket) => {
                    return Err(self.unexpected("')'"));
                }
                _ => statements.push(self.parse_statement()?),
            }
        }

        self.leave();
        Ok(ExpressionAst::SubExpression {
            kind,
            statements,
            span: open.merge(self.last_span),
        })
    }

    fn parse_hashtable(&mut self) -> SyntaxResult<ExpressionAst> {
        self.enter()?;
        let open = self.last_span_after_advance();
        let mut entries = Vec::new();

        loop {
            self.skip_terminators();
            match self.current() {
                Some(Token::RBrace) => {
                    self.advance();
                    break;
                }
                None | Some(Token::Eof) => return Err(SyntaxError::unmatched_delimiter("@{", open)),
                _ => {}
            }

            let key = self.parse_element()?;
            if !self.check(&Token::Equals) {
                return Err(self.unexpected("'=' after hashtable key"));
            }
            self.advance();
            self.skip_newlines();

            let mut value = Vec::new();
            loop {
                match self.current() {
                    None
                    | Some(Token::Eof | Token::Newline | Token::Semicolon | Token::RBrace) => break,
                    Some(Token::Pipe) => {
                        value.push(self.parse_element()?);
                        self.skip_newlines();
                    }
                    _ => value.push(self.parse_element()?),
                }
            }

            let span = key.span().merge(self.last_span);
            entries.push(HashEntryAst { key, value, span });
        }

        self.leave();
        Ok(ExpressionAst::Hashtable {
            entries,
            span: open.merge(self.last_span),
        })
    }
}

pub fn create_parser(tokens: TokenStream) -> ScriptParser {
    ScriptParser::new(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenize;
    use assert_matches::assert_matches;

    fn parse(source: &str) -> SyntaxResult<ScriptBlockAst> {
        ScriptParser::new(tokenize(source).unwrap()).parse_script()
    }

    const RESOURCE: &str = r#"
<#
    .SYNOPSIS
        Applies the Windows Server benchmark
#>
Configuration WindowsServer
{
    [CmdletBinding()]
    param
    (
        [Parameter(Mandatory = $true)]
        [ValidateSet('2012R2', '2016', '2019')]
        [string]
        $OsVersion,

        [Parameter()]
        [ValidateSet("1.10", '2.1')]
        [version]
        $StigVersion = '2.1',

        [Parameter()]
        [string[]]
        $Exception
    )

    Import-DscResource -ModuleName PSDscResources -ModuleVersion 2.12.0.0

    $rules = Get-StigRuleList -Version $StigVersion |
        Where-Object { $_.Severity -eq 'high' }

    foreach ($rule in $rules)
    {
        Registry (Get-ResourceTitle -Rule $rule)
        {
            Key       = $rule.Key
            ValueName = $rule.ValueName
            ValueData = @( $rule.ValueData )
        }
    }
}
"#;

    #[test]
    fn test_resource_script() {
        let script = parse(RESOURCE).unwrap();

        let configurations = script.configurations();
        assert_eq!(configurations.len(), 1);
        assert_eq!(configurations[0].name.value, "WindowsServer");

        let body = &configurations[0].body;
        assert_eq!(body.attributes.len(), 1);
        assert!(body.attributes[0].is_named("CmdletBinding"));

        let params = &body.param_block.as_ref().unwrap().parameters;
        let names: Vec<&str> = params.iter().map(|p| p.name.value.as_str()).collect();
        assert_eq!(names, vec!["OsVersion", "StigVersion", "Exception"]);

        let version = &params[1];
        let validate_set = version.attribute("ValidateSet").unwrap();
        let values: Vec<&str> = validate_set
            .positional
            .iter()
            .filter_map(|v| v.literal_text())
            .collect();
        assert_eq!(values, vec!["1.10", "2.1"]);
        assert_eq!(version.type_constraints[0].value, "version");
        assert_matches!(
            &version.default_value,
            Some(ExpressionAst::StringConstant { value, .. }) if value == "2.1"
        );
        assert_eq!(params[2].type_constraints[0].value, "string[]");

        let mandatory = &params[0].attribute("Parameter").unwrap().named[0];
        assert_eq!(mandatory.name.value, "Mandatory");
        assert_matches!(&mandatory.value, Some(ExpressionAst::Variable { name, .. }) if name == "true");

        // Import, the pipeline continued across lines, foreach, and its block
        assert_eq!(body.statements.len(), 3);
    }

    #[test]
    fn test_nested_blocks_are_walked() {
        let script = parse(RESOURCE).unwrap();
        let mut blocks = 0;
        script.walk(&mut |_| blocks += 1);
        // script, configuration, Where-Object block, foreach body, Registry body
        assert_eq!(blocks, 5);
    }

    #[test]
    fn test_function_with_inline_parameters() {
        let script = parse("function Get-Title([string] $Id, $Suffix = 'x') { \"$Id$Suffix\" }").unwrap();
        assert_matches!(&script.statements[0], StatementAst::Function(f) if f.name.value == "Get-Title");

        let params = script.parameters();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].type_constraints[0].value, "string");
    }

    #[test]
    fn test_multiple_configurations() {
        let script = parse("Configuration A { }\nconfiguration 'B' {\n}").unwrap();
        let names: Vec<&str> = script
            .configurations()
            .iter()
            .map(|c| c.name.value.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_hashtable_and_index() {
        let script = parse("$data = @{ AllNodes = @(@{ NodeName = 'localhost' }); Count = 1 }\n$data['AllNodes'][0]").unwrap();
        assert_eq!(script.statements.len(), 2);
        let StatementAst::Pipeline(assignment) = &script.statements[0] else {
            panic!("expected pipeline");
        };
        assert_matches!(
            &assignment.elements[2],
            ExpressionAst::Hashtable { entries, .. } if entries.len() == 2
        );
    }

    #[test]
    fn test_keyword_used_as_argument() {
        let script = parse("Get-Item -Path Configuration").unwrap();
        assert!(script.configurations().is_empty());
    }

    #[test]
    fn test_unclosed_brace() {
        let error = parse("Configuration Broken {\n  Node localhost {\n}").unwrap_err();
        assert_matches!(error, SyntaxError::UnmatchedBlockDelimiter { ref delimiter, span } if delimiter == "{" && span.start.line == 1);
        assert_eq!(error.error_code(), codes::syntax::UNMATCHED_DELIMITER);
    }

    #[test]
    fn test_unexpected_closing() {
        assert_matches!(parse("Write-Output 1 )"), Err(SyntaxError::UnexpectedToken { .. }));
        assert_matches!(parse("}"), Err(SyntaxError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_parameter_list_errors() {
        assert_matches!(
            parse("param([string] 'oops')"),
            Err(SyntaxError::UnexpectedToken { .. })
        );
        assert_matches!(
            parse("param($a"),
            Err(SyntaxError::UnmatchedBlockDelimiter { .. })
        );
    }

    #[test]
    fn test_depth_limit() {
        let source = format!("{}{}", "{".repeat(MAX_PARSE_DEPTH + 1), "}".repeat(MAX_PARSE_DEPTH + 1));
        assert_matches!(parse(&source), Err(SyntaxError::MaxRecursionDepth { .. }));
    }

    #[test]
    fn test_empty_stream() {
        let mut parser = ScriptParser::new(TokenStream::new(vec![]));
        assert_matches!(parser.parse_script(), Err(SyntaxError::EmptyTokenStream));
    }

    #[test]
    fn test_error_history_is_kept() {
        let mut parser = ScriptParser::new(tokenize("function f { ").unwrap());
        assert!(parser.parse_script().is_err());
        assert_eq!(parser.error_history().len(), 1);
    }
}
