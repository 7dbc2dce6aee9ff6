//! Script tokens and the filtered stream the parser consumes

pub mod token;
pub mod token_stream;

pub use token::{Keyword, StringKind, Token};
pub use token_stream::{SpannedToken, TokenStream};
