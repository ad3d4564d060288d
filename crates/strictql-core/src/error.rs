//! Error types for type resolution and code rendering.

use crate::parser::ParseError;

/// Errors raised while resolving parameter and result types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// A bind parameter has a type with no catalog mapping.
    #[error("Unsupported bind parameter type '{postgres_type}'")]
    UnsupportedBindType {
        /// Postgres type name as reported for the parameter.
        postgres_type: String,
    },

    /// A result column has a type with no catalog mapping.
    #[error("Unsupported type '{postgres_type}' of result column '{column}'")]
    UnsupportedResultType {
        /// Postgres type name as reported for the column.
        postgres_type: String,
        /// Column name or alias.
        column: String,
    },

    /// The statement returns no columns where rows are expected.
    #[error("Statement returns no columns")]
    EmptySchema,

    /// Two or more result columns share a name.
    #[error("Duplicate result column names: {}", .0.join(", "))]
    DuplicateColumns(Vec<String>),

    /// Result column names that cannot be public model fields.
    #[error("Invalid result column names: {}", .0.join(", "))]
    InvalidColumnNames(Vec<String>),

    /// Declared parameter names do not match the statement's parameters.
    #[error("Statement has {expected} bind parameters but {actual} were declared")]
    ParameterCountMismatch {
        /// Number of parameters the statement uses.
        expected: usize,
        /// Number of declared parameter names.
        actual: usize,
    },

    /// The INSERT target table does not exist.
    #[error("Relation '{relation}' does not exist")]
    MissingRelation {
        /// Relation name as written in the statement.
        relation: String,
    },

    /// An INSERT names a column that the target table does not have.
    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownDestinationColumn {
        /// Target table.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A VALUES row length differs from the INSERT column list.
    #[error("INSERT has {columns} target columns but a VALUES row has {values} expressions")]
    InsertColumnCountMismatch {
        /// Number of target columns.
        columns: usize,
        /// Number of expressions in the offending row.
        values: usize,
    },

    /// The statement shape is not one that can be resolved.
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// The statement could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors raised while rendering generated code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Function names must be lower snake case.
    #[error("Invalid function name '{0}': expected lower snake case")]
    InvalidFunctionName(String),

    /// A parameter name cannot be used in the generated signature.
    #[error("Invalid parameter name '{0}'")]
    InvalidParameterName(String),

    /// A model contains itself.
    #[error("Model '{0}' refers to itself")]
    RecursiveModel(String),

    /// Two different models were given the same name.
    #[error("Conflicting definitions for model '{0}'")]
    ConflictingModel(String),
}

/// Result type for resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;
