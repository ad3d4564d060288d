//! Token types for the lexer.

use super::Span;

macro_rules! keywords {
    ($($variant:ident => $text:literal),+ $(,)?) => {
        /// SQL keywords recognised by the parser.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $(
                #[doc = $text]
                $variant,
            )+
        }

        impl Keyword {
            /// Attempts to parse a keyword from a word (case-insensitive).
            #[must_use]
            pub fn from_word(word: &str) -> Option<Self> {
                match word.to_ascii_uppercase().as_str() {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Returns the keyword as upper-case text.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }
    };
}

keywords! {
    Select => "SELECT",
    From => "FROM",
    Where => "WHERE",
    Group => "GROUP",
    By => "BY",
    Having => "HAVING",
    Order => "ORDER",
    Limit => "LIMIT",
    Offset => "OFFSET",
    Distinct => "DISTINCT",
    All => "ALL",
    As => "AS",
    Join => "JOIN",
    Inner => "INNER",
    Left => "LEFT",
    Right => "RIGHT",
    Full => "FULL",
    Outer => "OUTER",
    Cross => "CROSS",
    On => "ON",
    Using => "USING",
    With => "WITH",
    Insert => "INSERT",
    Into => "INTO",
    Values => "VALUES",
    Default => "DEFAULT",
    Update => "UPDATE",
    Set => "SET",
    Delete => "DELETE",
    Returning => "RETURNING",
    Conflict => "CONFLICT",
    Do => "DO",
    Nothing => "NOTHING",
    And => "AND",
    Or => "OR",
    Not => "NOT",
    In => "IN",
    Between => "BETWEEN",
    Like => "LIKE",
    Ilike => "ILIKE",
    Is => "IS",
    Null => "NULL",
    True => "TRUE",
    False => "FALSE",
    Exists => "EXISTS",
    Case => "CASE",
    When => "WHEN",
    Then => "THEN",
    Else => "ELSE",
    End => "END",
    Cast => "CAST",
    Array => "ARRAY",
    Asc => "ASC",
    Desc => "DESC",
    Nulls => "NULLS",
    First => "FIRST",
    Last => "LAST",
}

impl Keyword {
    /// Returns true when the keyword can never be used as a bare column or
    /// table name.
    ///
    /// Non-reserved keywords (`first`, `nothing`, ...) are legal identifiers
    /// in Postgres and the parser accepts them wherever a name is expected.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        !matches!(
            self,
            Self::By
                | Self::Conflict
                | Self::Do
                | Self::Nothing
                | Self::Nulls
                | Self::First
                | Self::Last
                | Self::Set
                | Self::Insert
                | Self::Update
                | Self::Delete
                | Self::Values
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Float literal (e.g., 3.14)
    Float(f64),
    /// String literal in any quoting style ('x', E'x', $$x$$)
    String(String),
    /// Identifier, bare or double-quoted
    Identifier(String),
    /// SQL keyword
    Keyword(Keyword),
    /// Positional bind parameter (`$1`)
    Parameter(u32),

    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// Any other operator (`->>`, `@>`, `~*`, ...)
    Operator(String),

    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// :
    Colon,
    /// ::
    DoubleColon,

    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}
