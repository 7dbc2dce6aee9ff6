//! Syntax analysis: token stream to script AST

pub mod ast;
mod error;
mod parser;

pub use ast::{
    AttributeAst, ConfigurationAst, ExpressionAst, FunctionAst, ParamBlockAst, ParameterAst,
    ScriptBlockAst, StatementAst,
};
pub use error::{ErrorContext, SyntaxError, SyntaxResult};
pub use parser::{create_parser, ScriptParser};

use crate::logging::codes;
use crate::tokens::TokenStream;

pub fn parse_script(token_stream: TokenStream) -> SyntaxResult<ScriptBlockAst> {
    ScriptParser::new(token_stream).parse_script()
}

/// Check that every syntax error code is registered
pub fn init_syntax_logging() -> Result<(), String> {
    let syntax_codes = [
        codes::syntax::UNEXPECTED_TOKEN,
        codes::syntax::UNEXPECTED_END_OF_INPUT,
        codes::syntax::EMPTY_TOKEN_STREAM,
        codes::syntax::MISSING_EOF,
        codes::syntax::UNMATCHED_DELIMITER,
        codes::syntax::MAX_RECURSION_DEPTH,
        codes::syntax::GRAMMAR_VIOLATION,
        codes::syntax::INTERNAL_PARSER_ERROR,
    ];

    for code in &syntax_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Syntax error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}
