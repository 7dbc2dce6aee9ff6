//! Shared source-location types used by the script tokenizer and parser

pub mod span;

pub use span::{Position, Span, Spanned};
