//! Postgres-dialect lexer.
//!
//! Produces a stream of tokens for statement analysis. Only the parts of the
//! dialect that matter for locating bind parameters and INSERT targets are
//! modelled precisely; everything else is still tokenized so that a statement
//! the server accepted never trips the lexer.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
