//! Expression AST types.

use crate::lexer::Span;

use super::{DataType, SelectStatement};

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
    /// Boolean literal.
    Boolean(bool),
    /// NULL literal.
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Concat,
    /// Any other operator, kept verbatim (`->>`, `@>`, `~*`, ...).
    Custom(String),
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Custom(op) => op,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Unary plus (+)
    Plus,
    /// Logical NOT
    Not,
}

/// Pattern matching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOp {
    Like,
    Ilike,
}

/// The right-hand side of an `IS` test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsTest {
    Null,
    True,
    False,
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The function name, schema-qualified names joined with a dot.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
    /// Whether DISTINCT was specified.
    pub distinct: bool,
}

/// The list side of an `IN` test.
#[derive(Debug, Clone, PartialEq)]
pub enum InList {
    /// `IN (a, b, c)`
    Exprs(Vec<Expr>),
    /// `IN (SELECT ...)`
    Subquery(Box<SelectStatement>),
}

/// An SQL expression together with the source range it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// The shape of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal value.
    Literal(Literal),

    /// A positional bind parameter (`$N`).
    Parameter(u32),

    /// The `DEFAULT` marker inside a VALUES row or SET clause.
    Default,

    /// A column reference (optionally qualified with table name).
    Column {
        /// Table name or alias (optional).
        table: Option<String>,
        /// Column name.
        name: String,
    },

    /// `*` or `table.*`.
    Wildcard {
        /// Table qualifier (optional).
        table: Option<String>,
    },

    /// A binary expression.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// A function call.
    Function(FunctionCall),

    /// `expr::type`, `CAST(expr AS type)` or `type 'literal'`.
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
    },

    /// `IS [NOT] NULL | TRUE | FALSE`.
    Is {
        expr: Box<Expr>,
        test: IsTest,
        negated: bool,
    },

    /// `IS [NOT] DISTINCT FROM`.
    IsDistinctFrom {
        left: Box<Expr>,
        right: Box<Expr>,
        negated: bool,
    },

    /// `[NOT] IN (...)`.
    In {
        expr: Box<Expr>,
        list: InList,
        negated: bool,
    },

    /// `[NOT] BETWEEN low AND high`.
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// `[NOT] LIKE | ILIKE`.
    Pattern {
        expr: Box<Expr>,
        op: PatternOp,
        pattern: Box<Expr>,
        negated: bool,
    },

    /// CASE expression.
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    /// `[NOT] EXISTS (SELECT ...)`.
    Exists {
        query: Box<SelectStatement>,
        negated: bool,
    },

    /// A scalar subquery.
    Subquery(Box<SelectStatement>),

    /// `ARRAY[...]`.
    Array(Vec<Expr>),

    /// `expr[index]` or `expr[lower:upper]`.
    Subscript {
        expr: Box<Expr>,
        index: Box<Expr>,
        upper: Option<Box<Expr>>,
    },

    /// Parenthesized expression.
    Paren(Box<Expr>),

    /// Row constructor `(a, b, ...)`.
    Row(Vec<Expr>),
}

impl Expr {
    /// Creates an expression node.
    #[must_use]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the parameter number when this expression is exactly `$N`.
    #[must_use]
    pub const fn as_parameter(&self) -> Option<u32> {
        match self.kind {
            ExprKind::Parameter(n) => Some(n),
            _ => None,
        }
    }

    /// Returns true for the bare `DEFAULT` marker.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self.kind, ExprKind::Default)
    }

    /// Collects every `$N` referenced by this expression, including those
    /// nested in function arguments and subqueries, in source order.
    #[must_use]
    pub fn parameters(&self) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_parameters(&mut out);
        out
    }

    pub(crate) fn collect_parameters(&self, out: &mut Vec<u32>) {
        match &self.kind {
            ExprKind::Parameter(n) => out.push(*n),
            ExprKind::Literal(_)
            | ExprKind::Default
            | ExprKind::Column { .. }
            | ExprKind::Wildcard { .. } => {}
            ExprKind::Binary { left, right, .. }
            | ExprKind::IsDistinctFrom { left, right, .. } => {
                left.collect_parameters(out);
                right.collect_parameters(out);
            }
            ExprKind::Unary { operand: expr, .. }
            | ExprKind::Cast { expr, .. }
            | ExprKind::Is { expr, .. }
            | ExprKind::Paren(expr) => expr.collect_parameters(out),
            ExprKind::Function(call) => {
                for arg in &call.args {
                    arg.collect_parameters(out);
                }
            }
            ExprKind::In { expr, list, .. } => {
                expr.collect_parameters(out);
                match list {
                    InList::Exprs(items) => {
                        for item in items {
                            item.collect_parameters(out);
                        }
                    }
                    InList::Subquery(query) => query.collect_parameters(out),
                }
            }
            ExprKind::Between {
                expr, low, high, ..
            } => {
                expr.collect_parameters(out);
                low.collect_parameters(out);
                high.collect_parameters(out);
            }
            ExprKind::Pattern { expr, pattern, .. } => {
                expr.collect_parameters(out);
                pattern.collect_parameters(out);
            }
            ExprKind::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                if let Some(operand) = operand {
                    operand.collect_parameters(out);
                }
                for (when, then) in when_clauses {
                    when.collect_parameters(out);
                    then.collect_parameters(out);
                }
                if let Some(other) = else_clause {
                    other.collect_parameters(out);
                }
            }
            ExprKind::Exists { query, .. } | ExprKind::Subquery(query) => {
                query.collect_parameters(out);
            }
            ExprKind::Array(items) | ExprKind::Row(items) => {
                for item in items {
                    item.collect_parameters(out);
                }
            }
            ExprKind::Subscript { expr, index, upper } => {
                expr.collect_parameters(out);
                index.collect_parameters(out);
                if let Some(upper) = upper {
                    upper.collect_parameters(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(n: u32) -> Expr {
        Expr::new(ExprKind::Parameter(n), Span::default())
    }

    #[test]
    fn test_as_parameter() {
        assert_eq!(param(3).as_parameter(), Some(3));
        let default = Expr::new(ExprKind::Default, Span::default());
        assert_eq!(default.as_parameter(), None);
        assert!(default.is_default());
    }

    #[test]
    fn test_parameters_inside_function_call() {
        let call = Expr::new(
            ExprKind::Function(FunctionCall {
                name: "coalesce".into(),
                args: vec![param(2), param(1)],
                distinct: false,
            }),
            Span::default(),
        );
        assert_eq!(call.parameters(), vec![2, 1]);
    }
}
