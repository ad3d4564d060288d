//! Operator precedence for the Pratt expression parser.
//!
//! Levels follow the Postgres operator precedence table, lowest first:
//! `OR`, `AND`, `NOT`, `IS`, comparisons, `BETWEEN`/`IN`/`LIKE`,
//! other operators, `+ -`, `* / %`, unary minus, `::` and subscripts.

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Binding power of `NOT` used as a prefix operator.
pub const NOT_PREFIX_BP: u8 = 5;

/// Binding power of unary `-` and `+`.
pub const SIGN_PREFIX_BP: u8 = 19;

/// Binding power of the postfix `::type` cast and `[...]` subscript.
pub const POSTFIX_BP: u8 = 21;

/// Returns the infix binding power for a token as `(left_bp, right_bp)`.
///
/// Returns `None` if the token is not an infix operator.
#[must_use]
pub const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Keyword(Keyword::Or) => Some((1, 2)),
        TokenKind::Keyword(Keyword::And) => Some((3, 4)),
        TokenKind::Keyword(Keyword::Is) => Some((7, 8)),
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq => Some((9, 10)),
        // NOT here only introduces NOT IN / NOT LIKE / NOT BETWEEN
        TokenKind::Keyword(
            Keyword::Between | Keyword::In | Keyword::Like | Keyword::Ilike | Keyword::Not,
        ) => Some((11, 12)),
        TokenKind::Concat | TokenKind::Operator(_) => Some((13, 14)),
        TokenKind::Plus | TokenKind::Minus => Some((15, 16)),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((17, 18)),
        TokenKind::DoubleColon | TokenKind::LeftBracket => Some((POSTFIX_BP, POSTFIX_BP + 1)),
        _ => None,
    }
}

/// Converts a token to a binary operator.
#[must_use]
pub fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::Keyword(Keyword::And) => BinaryOp::And,
        TokenKind::Keyword(Keyword::Or) => BinaryOp::Or,
        TokenKind::Concat => BinaryOp::Concat,
        TokenKind::Operator(op) => BinaryOp::Custom(op.clone()),
        _ => return None,
    };
    Some(op)
}

/// Converts a token to a unary operator and its binding power.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<(UnaryOp, u8)> {
    match kind {
        TokenKind::Minus => Some((UnaryOp::Neg, SIGN_PREFIX_BP)),
        TokenKind::Plus => Some((UnaryOp::Plus, SIGN_PREFIX_BP)),
        TokenKind::Keyword(Keyword::Not) => Some((UnaryOp::Not, NOT_PREFIX_BP)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        let add_bp = infix_binding_power(&TokenKind::Plus).unwrap();
        let mul_bp = infix_binding_power(&TokenKind::Star).unwrap();
        assert!(mul_bp.0 > add_bp.0);

        let and_bp = infix_binding_power(&TokenKind::Keyword(Keyword::And)).unwrap();
        let or_bp = infix_binding_power(&TokenKind::Keyword(Keyword::Or)).unwrap();
        assert!(and_bp.0 > or_bp.0);

        let eq_bp = infix_binding_power(&TokenKind::Eq).unwrap();
        assert!(eq_bp.0 > NOT_PREFIX_BP);
        assert!(eq_bp.0 > and_bp.0);

        let cast_bp = infix_binding_power(&TokenKind::DoubleColon).unwrap();
        assert!(cast_bp.0 > SIGN_PREFIX_BP);
    }

    #[test]
    fn test_left_associativity() {
        let (left, right) = infix_binding_power(&TokenKind::Minus).unwrap();
        assert!(left < right);
    }

    #[test]
    fn test_token_to_binary_op() {
        assert_eq!(token_to_binary_op(&TokenKind::Plus), Some(BinaryOp::Add));
        assert_eq!(
            token_to_binary_op(&TokenKind::Operator("->>".into())),
            Some(BinaryOp::Custom("->>".into()))
        );
        assert_eq!(token_to_binary_op(&TokenKind::LeftParen), None);
    }

    #[test]
    fn test_token_to_unary_op() {
        assert_eq!(
            token_to_unary_op(&TokenKind::Minus),
            Some((UnaryOp::Neg, SIGN_PREFIX_BP))
        );
        assert_eq!(
            token_to_unary_op(&TokenKind::Keyword(Keyword::Not)),
            Some((UnaryOp::Not, NOT_PREFIX_BP))
        );
        assert_eq!(token_to_unary_op(&TokenKind::Star), None);
    }
}
