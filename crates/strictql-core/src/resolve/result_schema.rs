use std::collections::BTreeMap;

use super::PreparedStatement;
use crate::catalog;
use crate::error::{ResolveError, Result};
use crate::naming;
use crate::types::ResultSchema;

/// Maps every result column to its type. Result columns are always
/// optional: the server does not report nullability for expressions.
///
/// # Errors
///
/// `UnsupportedResultType` for the first column whose type has no mapping.
pub fn resolve_result_schema(prepared: &PreparedStatement) -> Result<ResultSchema> {
    let columns = prepared
        .columns
        .iter()
        .map(|column| {
            catalog::lookup(&column.type_name)
                .map(|ty| (column.name.clone(), ty))
                .ok_or_else(|| ResolveError::UnsupportedResultType {
                    postgres_type: column.type_name.clone(),
                    column: column.name.clone(),
                })
        })
        .collect::<Result<_>>()?;
    Ok(ResultSchema { columns })
}

/// Checks that the schema can become a record model.
///
/// # Errors
///
/// `EmptySchema`, then `DuplicateColumns`, then `InvalidColumnNames`; the
/// first failing check wins.
pub fn validate_result_schema(schema: &ResultSchema) -> Result<()> {
    if schema.columns.is_empty() {
        return Err(ResolveError::EmptySchema);
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (name, _) in &schema.columns {
        *counts.entry(name.as_str()).or_default() += 1;
    }
    let duplicates: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect();
    if !duplicates.is_empty() {
        return Err(ResolveError::DuplicateColumns(duplicates));
    }

    let invalid: Vec<String> = schema
        .columns
        .iter()
        .filter(|(name, _)| !naming::is_model_field(name))
        .map(|(name, _)| name.clone())
        .collect();
    if !invalid.is_empty() {
        return Err(ResolveError::InvalidColumnNames(invalid));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ColumnDescription;
    use crate::types::{ImportedKind, ResolvedType, SimpleKind};

    fn prepared(columns: &[(&str, &str)]) -> PreparedStatement {
        PreparedStatement {
            parameter_types: vec![],
            columns: columns
                .iter()
                .map(|(name, ty)| ColumnDescription::new(*name, *ty))
                .collect(),
        }
    }

    #[test]
    fn test_columns_are_optional() {
        let schema =
            resolve_result_schema(&prepared(&[("id", "int4"), ("created", "timestamptz")]))
                .unwrap();
        assert_eq!(
            schema.columns,
            vec![
                ("id".to_string(), ResolvedType::simple(SimpleKind::Int, true)),
                (
                    "created".to_string(),
                    ResolvedType::imported(ImportedKind::DateTime, true)
                ),
            ]
        );
        assert!(validate_result_schema(&schema).is_ok());
    }

    #[test]
    fn test_unsupported_column_type() {
        let err = resolve_result_schema(&prepared(&[("id", "int4"), ("payload", "jsonb")]))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnsupportedResultType {
                postgres_type: "jsonb".into(),
                column: "payload".into(),
            }
        );
    }

    #[test]
    fn test_validation_order() {
        let empty = ResultSchema::default();
        assert_eq!(validate_result_schema(&empty), Err(ResolveError::EmptySchema));

        let schema = resolve_result_schema(&prepared(&[
            ("b", "int4"),
            ("?column?", "int4"),
            ("a", "int4"),
            ("b", "int4"),
            ("a", "text"),
        ]))
        .unwrap();
        assert_eq!(
            validate_result_schema(&schema),
            Err(ResolveError::DuplicateColumns(vec!["a".into(), "b".into()]))
        );

        let schema = resolve_result_schema(&prepared(&[
            ("ok", "int4"),
            ("?column?", "int4"),
            ("class", "text"),
            ("_id", "int4"),
        ]))
        .unwrap();
        assert_eq!(
            validate_result_schema(&schema),
            Err(ResolveError::InvalidColumnNames(vec![
                "?column?".into(),
                "class".into(),
                "_id".into()
            ]))
        );
    }
}
