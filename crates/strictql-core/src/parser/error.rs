//! Parser error types.

use crate::lexer::{Span, TokenKind};

/// A parse error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at position {}..{}", .span.start, .span.end)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// Expected tokens (if applicable).
    pub expected: Option<String>,
    /// The actual token found.
    pub found: Option<TokenKind>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// Creates an "unexpected token" error.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        let expected: String = expected.into();
        let message = match &found {
            TokenKind::Eof => format!("Unexpected end of input: expected {expected}"),
            TokenKind::Error(reason) => reason.clone(),
            other => format!("Unexpected token: expected {expected}, found {other:?}"),
        };
        Self {
            message,
            span,
            expected: Some(expected),
            found: Some(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position() {
        let err = ParseError::new("Expected VALUES", Span::new(4, 9));
        assert_eq!(err.to_string(), "Expected VALUES at position 4..9");
    }

    #[test]
    fn test_unexpected_eof_message() {
        let err = ParseError::unexpected("')'", TokenKind::Eof, Span::new(10, 10));
        assert!(err.message.starts_with("Unexpected end of input"));
        assert_eq!(err.found, Some(TokenKind::Eof));
    }

    #[test]
    fn test_lexer_error_is_reported_verbatim() {
        let err = ParseError::unexpected(
            "expression",
            TokenKind::Error("Unterminated string literal".into()),
            Span::new(0, 3),
        );
        assert_eq!(err.message, "Unterminated string literal");
    }
}
