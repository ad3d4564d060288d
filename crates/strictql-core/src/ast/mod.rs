//! Abstract Syntax Tree (AST) types for Postgres statements.

mod expression;
mod statement;
mod types;

pub use expression::{
    BinaryOp, Expr, ExprKind, FunctionCall, InList, IsTest, Literal, PatternOp, UnaryOp,
};
pub use statement::{
    ConflictAction, ConflictTarget, InsertSource, InsertStatement, JoinClause, JoinType,
    NullOrdering, ObjectName, OnConflict, OrderBy, OrderDirection, SelectColumn, SelectStatement,
    TableRef, UpdateAssignment,
};
pub use types::DataType;
