//! Statement classification by leading keyword.

use crate::lexer::{Keyword, Lexer, TokenKind};

/// The broad shape of a statement, decided from its first keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    With,
    Values,
    Insert,
    Update,
    Delete,
    /// Blank input or only comments.
    Empty,
    /// Anything else; carries the leading word.
    Other(String),
}

impl StatementKind {
    /// Classifies `sql` by its first token, looking through leading
    /// parentheses so `(select ...)` is still a SELECT.
    #[must_use]
    pub fn of(sql: &str) -> Self {
        let mut lexer = Lexer::new(sql);
        let mut token = lexer.next_token();
        while matches!(token.kind, TokenKind::LeftParen) {
            token = lexer.next_token();
        }

        match token.kind {
            TokenKind::Keyword(Keyword::Select) => Self::Select,
            TokenKind::Keyword(Keyword::With) => Self::With,
            TokenKind::Keyword(Keyword::Values) => Self::Values,
            TokenKind::Keyword(Keyword::Insert) => Self::Insert,
            TokenKind::Keyword(Keyword::Update) => Self::Update,
            TokenKind::Keyword(Keyword::Delete) => Self::Delete,
            TokenKind::Eof => Self::Empty,
            _ => Self::Other(token.span.text(sql).to_ascii_uppercase()),
        }
    }

    /// Statements whose parameters cannot be tied to table columns.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        matches!(
            self,
            Self::Select | Self::With | Self::Values | Self::Update | Self::Delete
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_keyword() {
        assert_eq!(StatementKind::of("select 1"), StatementKind::Select);
        assert_eq!(StatementKind::of("  (SELECT 1)"), StatementKind::Select);
        assert_eq!(
            StatementKind::of("-- upsert\ninsert into t default values"),
            StatementKind::Insert
        );
        assert_eq!(
            StatementKind::of("with x as (select 1) select * from x"),
            StatementKind::With
        );
        assert_eq!(StatementKind::of("/* nothing */"), StatementKind::Empty);
    }

    #[test]
    fn test_other_statements() {
        assert_eq!(
            StatementKind::of("truncate users"),
            StatementKind::Other("TRUNCATE".into())
        );
        assert!(!StatementKind::of("copy t from stdin").is_simple());
        assert!(StatementKind::of("delete from t").is_simple());
        assert!(!StatementKind::of("insert into t default values").is_simple());
    }
}
