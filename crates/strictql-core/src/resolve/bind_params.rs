//! Bind parameter type and nullability inference.

use std::collections::BTreeMap;

use super::{DeclaredParam, PreparedStatement, TableFields};
use crate::ast::{Expr, InsertSource, ObjectName};
use crate::catalog;
use crate::error::{ResolveError, Result};
use crate::parser::{Parser, StatementKind};
use crate::types::{BindParameter, ResolvedType};

/// How a parameter's nullability was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    /// Derived from the NOT NULL flags of destination columns.
    Proven,
    /// Taken from the configured default.
    Assumed,
}

/// A parameter type before it is given a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredParam {
    pub ty: ResolvedType,
    pub nullability: Nullability,
}

/// The part of an `INSERT ... VALUES` that ties parameters to columns.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    /// Target relation whose fields must be looked up.
    pub table: ObjectName,
    /// Explicit column list; empty means all columns in table order.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Expr>>,
}

/// What a statement needs for parameter resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum BindAnalysis {
    /// No column mapping; every parameter uses the configured default.
    Simple,
    /// Parameters in VALUES rows take the nullability of their columns.
    Insert(InsertPlan),
}

impl BindAnalysis {
    /// The table whose fields [`resolve_bind_params`] needs, if any.
    #[must_use]
    pub const fn target_table(&self) -> Option<&ObjectName> {
        match self {
            Self::Simple => None,
            Self::Insert(plan) => Some(&plan.table),
        }
    }
}

/// Decides how the parameters of `sql` are resolved.
///
/// SELECT, WITH, VALUES, UPDATE and DELETE statements are classified by
/// their leading keyword only. INSERT statements are parsed.
///
/// # Errors
///
/// `UnsupportedStatement` for other statement kinds and for
/// `INSERT ... SELECT`; `Parse` when an INSERT cannot be parsed.
pub fn analyze_bind_params(sql: &str) -> Result<BindAnalysis> {
    match StatementKind::of(sql) {
        kind if kind.is_simple() => return Ok(BindAnalysis::Simple),
        StatementKind::Insert => {}
        StatementKind::Empty => {
            return Err(ResolveError::UnsupportedStatement(String::from("empty statement")))
        }
        StatementKind::Other(word) => return Err(ResolveError::UnsupportedStatement(word)),
        kind => return Err(ResolveError::UnsupportedStatement(format!("{kind:?}"))),
    }

    let insert = Parser::new(sql).parse_insert()?;

    match insert.source {
        InsertSource::Values(rows) => Ok(BindAnalysis::Insert(InsertPlan {
            table: insert.table,
            columns: insert.columns,
            rows,
        })),
        InsertSource::DefaultValues => Ok(BindAnalysis::Simple),
        InsertSource::Query(_) => Err(ResolveError::UnsupportedStatement(String::from(
            "INSERT ... SELECT",
        ))),
    }
}

impl InsertPlan {
    /// Maps each parameter used in a VALUES slot to whether any of its
    /// destination columns is NOT NULL.
    fn destination_constraints(&self, fields: &TableFields) -> Result<BTreeMap<u32, bool>> {
        let explicit = !self.columns.is_empty();
        let columns: Vec<&str> = if explicit {
            self.columns.iter().map(String::as_str).collect()
        } else {
            let mut ordered: Vec<_> = fields.iter().collect();
            ordered.sort_by_key(|(_, field)| field.ordinal_position);
            ordered.into_iter().map(|(name, _)| name.as_str()).collect()
        };

        let mut constraints = BTreeMap::new();
        for row in &self.rows {
            let too_long = row.len() > columns.len();
            if too_long || (explicit && row.len() != columns.len()) {
                return Err(ResolveError::InsertColumnCountMismatch {
                    columns: columns.len(),
                    values: row.len(),
                });
            }

            for (slot, column) in row.iter().zip(&columns) {
                let field = fields.get(*column).ok_or_else(|| {
                    ResolveError::UnknownDestinationColumn {
                        table: self.table.to_string(),
                        column: (*column).to_string(),
                    }
                })?;
                if slot.is_default() {
                    continue;
                }
                for parameter in slot.parameters() {
                    *constraints.entry(parameter).or_insert(false) |= field.not_null;
                }
            }
        }
        Ok(constraints)
    }
}

/// Resolves the type and nullability of every parameter, in ordinal order.
///
/// Types always come from the prepared statement. For INSERT plans,
/// parameters placed in VALUES slots are optional exactly when none of their
/// destination columns is NOT NULL; every other parameter is optional when
/// `assume_optional` is set.
///
/// # Errors
///
/// `UnsupportedBindType` for unmapped parameter types, `MissingRelation`
/// when an INSERT plan has no table fields, and the column mapping errors
/// of the plan.
pub fn resolve_bind_params(
    prepared: &PreparedStatement,
    analysis: &BindAnalysis,
    fields: Option<&TableFields>,
    assume_optional: bool,
) -> Result<Vec<InferredParam>> {
    let constraints = match analysis {
        BindAnalysis::Simple => BTreeMap::new(),
        BindAnalysis::Insert(plan) => {
            let fields = fields.ok_or_else(|| ResolveError::MissingRelation {
                relation: plan.table.to_string(),
            })?;
            plan.destination_constraints(fields)?
        }
    };

    (1u32..)
        .zip(&prepared.parameter_types)
        .map(|(ordinal, postgres_type)| {
            let ty = catalog::lookup(postgres_type).ok_or_else(|| {
                ResolveError::UnsupportedBindType {
                    postgres_type: postgres_type.clone(),
                }
            })?;
            Ok(match constraints.get(&ordinal) {
                Some(not_null) => InferredParam {
                    ty: ty.with_optional(!not_null),
                    nullability: Nullability::Proven,
                },
                None => InferredParam {
                    ty: ty.with_optional(assume_optional),
                    nullability: Nullability::Assumed,
                },
            })
        })
        .collect()
}

/// Pairs inferred parameters with their declared names.
///
/// A declared optionality replaces an assumed one and may narrow a proven
/// nullable parameter, but never widens a parameter bound to a NOT NULL
/// column.
///
/// # Errors
///
/// `ParameterCountMismatch` when the counts differ.
pub fn bind_parameters(
    inferred: Vec<InferredParam>,
    declared: &[DeclaredParam],
) -> Result<Vec<BindParameter>> {
    if inferred.len() != declared.len() {
        return Err(ResolveError::ParameterCountMismatch {
            expected: inferred.len(),
            actual: declared.len(),
        });
    }

    Ok(inferred
        .into_iter()
        .zip(declared)
        .map(|(param, declared)| {
            let inferred_optional = param.ty.is_optional();
            let optional = match (declared.optional, param.nullability) {
                (None, _) => inferred_optional,
                (Some(wanted), Nullability::Assumed) => wanted,
                (Some(wanted), Nullability::Proven) => inferred_optional && wanted,
            };
            BindParameter {
                name: declared.name.clone(),
                ty: param.ty.with_optional(optional),
            }
        })
        .collect())
}
