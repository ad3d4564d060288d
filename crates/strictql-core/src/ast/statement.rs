//! SQL statement AST types.

use super::expression::Expr;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Null ordering for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// NULLs come first.
    First,
    /// NULLs come last.
    Last,
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: Option<NullOrdering>,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// A possibly schema-qualified relation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    /// Schema (optional).
    pub schema: Option<String>,
    /// Relation name.
    pub name: String,
}

impl ObjectName {
    /// Creates an unqualified name.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }
}

impl core::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: TableRef,
    /// ON condition.
    pub on: Option<Expr>,
    /// USING columns.
    pub using: Vec<String>,
}

/// A table reference in FROM / USING.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A named relation.
    Table {
        name: ObjectName,
        alias: Option<String>,
    },
    /// A subquery with alias.
    Subquery {
        query: Box<SelectStatement>,
        alias: Option<String>,
    },
    /// A table-valued function call such as `unnest($1::int4[]) as t(id)`.
    Function { call: Expr, alias: Option<String> },
    /// A joined table.
    Join {
        left: Box<TableRef>,
        join: Box<JoinClause>,
    },
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub distinct: bool,
    pub columns: Vec<SelectColumn>,
    pub from: Option<TableRef>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

/// An item of a projection list (SELECT columns or RETURNING).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: Option<String>,
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target relation.
    pub table: ObjectName,
    /// Alias given with `AS`.
    pub alias: Option<String>,
    /// Explicit column list; empty when omitted.
    pub columns: Vec<String>,
    pub source: InsertSource,
    pub on_conflict: Option<OnConflict>,
    pub returning: Vec<SelectColumn>,
}

/// Where the inserted rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// `VALUES (...), (...)`
    Values(Vec<Vec<Expr>>),
    /// `SELECT ...`
    Query(Box<SelectStatement>),
    /// `DEFAULT VALUES`
    DefaultValues,
}

/// `ON CONFLICT` clause of an INSERT.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    pub target: ConflictTarget,
    pub action: ConflictAction,
}

/// Conflict arbiter.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictTarget {
    /// No arbiter given.
    Any,
    /// `(col, expr, ...) [WHERE predicate]`
    Columns {
        columns: Vec<Expr>,
        where_clause: Option<Expr>,
    },
    /// `ON CONSTRAINT name`
    Constraint(String),
}

/// Conflict resolution action.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    /// `DO NOTHING`
    DoNothing,
    /// `DO UPDATE SET ... [WHERE ...]`
    DoUpdate {
        assignments: Vec<UpdateAssignment>,
        where_clause: Option<Expr>,
    },
}

/// `column = value` in SET.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    pub column: String,
    pub value: Expr,
}

impl SelectStatement {
    pub(crate) fn collect_parameters(&self, out: &mut Vec<u32>) {
        for column in &self.columns {
            column.expr.collect_parameters(out);
        }
        if let Some(from) = &self.from {
            from.collect_parameters(out);
        }
        let clauses = self
            .where_clause
            .iter()
            .chain(&self.group_by)
            .chain(&self.having)
            .chain(self.order_by.iter().map(|o| &o.expr))
            .chain(&self.limit)
            .chain(&self.offset);
        for expr in clauses {
            expr.collect_parameters(out);
        }
    }
}

impl TableRef {
    fn collect_parameters(&self, out: &mut Vec<u32>) {
        match self {
            Self::Table { .. } => {}
            Self::Subquery { query, .. } => query.collect_parameters(out),
            Self::Function { call, .. } => call.collect_parameters(out),
            Self::Join { left, join } => {
                left.collect_parameters(out);
                join.table.collect_parameters(out);
                if let Some(on) = &join.on {
                    on.collect_parameters(out);
                }
            }
        }
    }
}
