//! Postgres tokenizer.

use super::{Keyword, Span, Token, TokenKind};

/// Characters that may appear in a Postgres operator.
const OPERATOR_CHARS: &str = "+-*/<>=~!@#%^&|`?";

/// Operator characters that let a multi-character operator end in `+` or `-`.
const OPERATOR_TAIL_ALLOWING: &str = "~!@#%^&|`?";

/// A lexer that tokenizes Postgres statement text.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn rest(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or("")
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace, line comments and (nested) block comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            if self.rest().starts_with("--") {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            if self.rest().starts_with("/*") {
                self.pos += 2;
                let mut depth = 1usize;
                while depth > 0 {
                    if self.rest().starts_with("/*") {
                        self.pos += 2;
                        depth += 1;
                    } else if self.rest().starts_with("*/") {
                        self.pos += 2;
                        depth -= 1;
                    } else if self.advance().is_none() {
                        break;
                    }
                }
                continue;
            }

            break;
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.start, self.pos))
    }

    fn error(&self, message: &str) -> Token {
        self.make_token(TokenKind::Error(message.to_string()))
    }

    /// Scans a bare identifier or keyword. Bare names fold to lower case.
    fn scan_identifier(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];
        match Keyword::from_word(text) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier(text.to_lowercase())),
        }
    }

    /// Scans a double-quoted identifier, keeping its case.
    fn scan_quoted_identifier(&mut self) -> Token {
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') if self.peek() == Some('"') => {
                    self.advance();
                    value.push('"');
                }
                Some('"') => break,
                Some(c) => value.push(c),
                None => return self.error("Unterminated quoted identifier"),
            }
        }
        if value.is_empty() {
            return self.error("Zero-length delimited identifier");
        }
        self.make_token(TokenKind::Identifier(value))
    }

    fn scan_number(&mut self) -> Token {
        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next() != Some('.') {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.advance();
            }
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            let exponent_follows = match self.peek_next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self
                    .rest()
                    .chars()
                    .nth(2)
                    .is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                is_float = true;
                self.advance();
                if self.peek().is_some_and(|c| c == '+' || c == '-') {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text: String = self.input[self.start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return self.make_token(TokenKind::Integer(i));
            }
        }
        match text.parse::<f64>() {
            Ok(f) => self.make_token(TokenKind::Float(f)),
            Err(e) => self.make_token(TokenKind::Error(format!("Invalid number: {e}"))),
        }
    }

    /// Scans a standard string literal where `''` is the only escape.
    fn scan_string(&mut self) -> Token {
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.advance();
                    value.push('\'');
                }
                Some('\'') => break,
                Some(c) => value.push(c),
                None => return self.error("Unterminated string literal"),
            }
        }
        self.make_token(TokenKind::String(value))
    }

    /// Scans an `E'...'` string with backslash escapes.
    fn scan_escape_string(&mut self) -> Token {
        self.advance();
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some(c) => value.push(c),
                    None => return self.error("Unterminated string literal"),
                },
                Some('\'') if self.peek() == Some('\'') => {
                    self.advance();
                    value.push('\'');
                }
                Some('\'') => break,
                Some(c) => value.push(c),
                None => return self.error("Unterminated string literal"),
            }
        }
        self.make_token(TokenKind::String(value))
    }

    /// Scans `$N` parameters and `$tag$...$tag$` dollar-quoted strings.
    fn scan_dollar(&mut self) -> Token {
        self.advance();

        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            let digits = &self.input[self.start + 1..self.pos];
            return match digits.parse::<u32>() {
                Ok(0) | Err(_) => self.make_token(TokenKind::Error(format!(
                    "Invalid parameter reference: ${digits}"
                ))),
                Ok(n) => self.make_token(TokenKind::Parameter(n)),
            };
        }

        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        if self.peek() != Some('$') {
            return self.error("Unexpected character: $");
        }
        self.advance();

        let delimiter = &self.input[self.start..self.pos];
        match self.rest().find(delimiter) {
            Some(offset) => {
                let value = self.rest()[..offset].to_string();
                self.pos += offset + delimiter.len();
                self.make_token(TokenKind::String(value))
            }
            None => {
                self.pos = self.input.len();
                self.error("Unterminated dollar-quoted string")
            }
        }
    }

    /// Scans an operator run following Postgres' rules: a run stops before
    /// a comment start, and a trailing `+`/`-` is split off unless the run
    /// contains one of `~!@#%^&|`?`.
    fn scan_operator(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if !OPERATOR_CHARS.contains(c) {
                break;
            }
            let rest = self.rest();
            if self.pos > self.start && (rest.starts_with("--") || rest.starts_with("/*")) {
                break;
            }
            self.advance();
        }

        let mut text = &self.input[self.start..self.pos];
        if text.len() > 1 && !text.chars().any(|c| OPERATOR_TAIL_ALLOWING.contains(c)) {
            while text.len() > 1 && (text.ends_with('+') || text.ends_with('-')) {
                text = &text[..text.len() - 1];
            }
            self.pos = self.start + text.len();
        }

        let kind = match text {
            "+" => TokenKind::Plus,
            "-" => TokenKind::Minus,
            "*" => TokenKind::Star,
            "/" => TokenKind::Slash,
            "%" => TokenKind::Percent,
            "=" => TokenKind::Eq,
            "<>" | "!=" => TokenKind::NotEq,
            "<" => TokenKind::Lt,
            "<=" => TokenKind::LtEq,
            ">" => TokenKind::Gt,
            ">=" => TokenKind::GtEq,
            "||" => TokenKind::Concat,
            other => TokenKind::Operator(other.to_string()),
        };
        self.make_token(kind)
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.peek() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            '(' | ')' | '[' | ']' | ',' | ';' => {
                self.advance();
                self.make_token(match c {
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    '[' => TokenKind::LeftBracket,
                    ']' => TokenKind::RightBracket,
                    ',' => TokenKind::Comma,
                    _ => TokenKind::Semicolon,
                })
            }
            '.' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => self.scan_number(),
            '.' => {
                self.advance();
                self.make_token(TokenKind::Dot)
            }
            ':' => {
                self.advance();
                if self.peek() == Some(':') {
                    self.advance();
                    self.make_token(TokenKind::DoubleColon)
                } else {
                    self.make_token(TokenKind::Colon)
                }
            }
            '\'' => self.scan_string(),
            '"' => self.scan_quoted_identifier(),
            '$' => self.scan_dollar(),
            'E' | 'e' if self.peek_next() == Some('\'') => self.scan_escape_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(),
            c if OPERATOR_CHARS.contains(c) => self.scan_operator(),
            _ => {
                self.advance();
                self.make_token(TokenKind::Error(format!("Unexpected character: {c}")))
            }
        }
    }

    /// Tokenizes the entire input, ending with an EOF token.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(token_kinds("  \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            token_kinds("select -- note\n /* outer /* inner */ still */ 1"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Integer(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_parameters() {
        assert_eq!(
            token_kinds("$1, $12"),
            vec![
                TokenKind::Parameter(1),
                TokenKind::Comma,
                TokenKind::Parameter(12),
                TokenKind::Eof,
            ]
        );
        assert!(matches!(token_kinds("$0")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_bare_identifiers_fold_to_lower_case() {
        assert_eq!(
            token_kinds(r#"Users "MixedCase""#),
            vec![
                TokenKind::Identifier("users".into()),
                TokenKind::Identifier("MixedCase".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_styles() {
        assert_eq!(
            token_kinds(r"'it''s' E'a\nb' $$raw $1$$ $fn$x$fn$"),
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("a\nb".into()),
                TokenKind::String("raw $1".into()),
                TokenKind::String("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_cast_and_array_tokens() {
        assert_eq!(
            token_kinds("$1::int4[]"),
            vec![
                TokenKind::Parameter(1),
                TokenKind::DoubleColon,
                TokenKind::Identifier("int4".into()),
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operator_trailing_minus_is_split() {
        assert_eq!(
            token_kinds("a=-1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Eq,
                TokenKind::Minus,
                TokenKind::Integer(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_generic_operators() {
        assert_eq!(
            token_kinds("data ->> 'k' @> x <> y"),
            vec![
                TokenKind::Identifier("data".into()),
                TokenKind::Operator("->>".into()),
                TokenKind::String("k".into()),
                TokenKind::Operator("@>".into()),
                TokenKind::Identifier("x".into()),
                TokenKind::NotEq,
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            token_kinds("42 3.5 .5 1e3 1_000"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(3.5),
                TokenKind::Float(0.5),
                TokenKind::Float(1000.0),
                TokenKind::Integer(1000),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(token_kinds("'abc")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_spans() {
        let tokens = Lexer::new("insert into t").tokenize();
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[2].span, Span::new(12, 13));
    }
}
