//! Type resolution for bind parameters and result columns.
//!
//! The resolvers work on a driver-agnostic description of a prepared
//! statement plus, for INSERT statements, the catalog rows of the target
//! table. Fetching those is the caller's job.

mod bind_params;
mod result_schema;

pub use bind_params::{
    analyze_bind_params, bind_parameters, resolve_bind_params, BindAnalysis, InferredParam,
    InsertPlan, Nullability,
};
pub use result_schema::{resolve_result_schema, validate_result_schema};

use std::collections::BTreeMap;

/// A result column as described by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_name: String,
}

impl ColumnDescription {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// What the server reports after preparing a statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreparedStatement {
    /// Parameter type names, index 0 is `$1`.
    pub parameter_types: Vec<String>,
    /// Result columns in output order.
    pub columns: Vec<ColumnDescription>,
}

/// Catalog metadata for one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableField {
    /// 1-based position in the table.
    pub ordinal_position: i16,
    pub not_null: bool,
    pub type_name: String,
}

/// Columns of a table keyed by name.
pub type TableFields = BTreeMap<String, TableField>;

/// A parameter name from configuration with optional declared optionality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredParam {
    pub name: String,
    /// `Some(false)` demands a non-optional argument, `Some(true)` an
    /// optional one; `None` keeps what was inferred.
    pub optional: Option<bool>,
}

impl DeclaredParam {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: None,
        }
    }

    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }
}
