#![allow(dead_code)]

use strictql_core::ast::InsertStatement;
use strictql_core::resolve::{ColumnDescription, PreparedStatement, TableField, TableFields};
use strictql_core::{ParseError, Parser};

pub fn parse_insert(sql: &str) -> InsertStatement {
    Parser::new(sql)
        .parse_insert()
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> ParseError {
    Parser::new(sql)
        .parse_insert()
        .expect_err(&format!("Expected parse error for: {sql}"))
}

/// A prepared statement with the given parameter types and result columns.
pub fn prepared(parameter_types: &[&str], columns: &[(&str, &str)]) -> PreparedStatement {
    PreparedStatement {
        parameter_types: parameter_types.iter().map(ToString::to_string).collect(),
        columns: columns
            .iter()
            .map(|(name, ty)| ColumnDescription::new(*name, *ty))
            .collect(),
    }
}

/// Table fields in declaration order: `(name, not_null, type)`.
pub fn table(columns: &[(&str, bool, &str)]) -> TableFields {
    (1i16..)
        .zip(columns)
        .map(|(ordinal_position, (name, not_null, type_name))| {
            (
                (*name).to_string(),
                TableField {
                    ordinal_position,
                    not_null: *not_null,
                    type_name: (*type_name).to_string(),
                },
            )
        })
        .collect()
}
