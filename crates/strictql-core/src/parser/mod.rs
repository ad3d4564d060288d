//! Postgres statement parser.
//!
//! A hand-written recursive descent parser with Pratt expression parsing,
//! plus a cheap classifier that looks only at the leading keyword.

mod classify;
mod error;
mod parser;
mod pratt;

pub use classify::StatementKind;
pub use error::ParseError;
pub use parser::Parser;
