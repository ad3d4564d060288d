//! Access to a database's prepared statement metadata and system catalog.
//!
//! The pipeline only talks to the database through [`CatalogSource`] and
//! [`CatalogSession`]; [`PgPool`] is the production implementation.

use std::future::Future;

use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPool;
use sqlx::{Column, Either, Executor, Postgres, TypeInfo};
use strictql_core::ast::ObjectName;
use strictql_core::resolve::{ColumnDescription, PreparedStatement, TableField, TableFields};

use crate::error::CatalogError;

/// Columns of a relation, resolved the way an unqualified name is resolved
/// by the server: through the search path unless a schema is given.
const TABLE_FIELDS_SQL: &str = r"
SELECT a.attname::text, a.attnum, a.attnotnull, t.typname::text
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
WHERE c.relname = $1
  AND CASE WHEN $2::text IS NULL THEN pg_catalog.pg_table_is_visible(c.oid)
           ELSE n.nspname = $2 END
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum
";

/// Something that hands out catalog sessions, e.g. a connection pool.
pub trait CatalogSource: Send + Sync + 'static {
    /// A session holds one connection until it is dropped.
    type Session: CatalogSession;

    /// Acquires a session. Waits while the source is at capacity.
    fn session(&self) -> impl Future<Output = Result<Self::Session, CatalogError>> + Send;
}

/// One exclusively held connection.
pub trait CatalogSession: Send {
    /// Prepares `sql` without executing it.
    fn prepare(
        &mut self,
        sql: &str,
    ) -> impl Future<Output = Result<PreparedStatement, CatalogError>> + Send;

    /// Looks up the columns of `table`.
    fn table_fields(
        &mut self,
        table: &ObjectName,
    ) -> impl Future<Output = Result<TableFields, CatalogError>> + Send;
}

impl CatalogSource for PgPool {
    type Session = PoolConnection<Postgres>;

    async fn session(&self) -> Result<Self::Session, CatalogError> {
        Ok(self.acquire().await?)
    }
}

impl CatalogSession for PoolConnection<Postgres> {
    async fn prepare(&mut self, sql: &str) -> Result<PreparedStatement, CatalogError> {
        let describe = (&mut **self).describe(sql).await.map_err(|err| match err {
            sqlx::Error::Database(db) => CatalogError::Syntax(db.message().to_string()),
            other => CatalogError::Database(other),
        })?;

        let parameter_types = match describe.parameters() {
            Some(Either::Left(types)) => types.iter().map(|ty| ty.name().to_string()).collect(),
            Some(Either::Right(count)) => vec![String::from("unknown"); count],
            None => Vec::new(),
        };
        let columns = describe
            .columns()
            .iter()
            .map(|column| ColumnDescription::new(column.name(), column.type_info().name()))
            .collect();

        Ok(PreparedStatement {
            parameter_types,
            columns,
        })
    }

    async fn table_fields(&mut self, table: &ObjectName) -> Result<TableFields, CatalogError> {
        let rows: Vec<(String, i16, bool, String)> = sqlx::query_as(TABLE_FIELDS_SQL)
            .bind(&table.name)
            .bind(table.schema.as_deref())
            .fetch_all(&mut **self)
            .await?;

        if rows.is_empty() {
            return Err(CatalogError::TableNotFound(table.to_string()));
        }

        Ok(rows
            .into_iter()
            .map(|(name, ordinal_position, not_null, type_name)| {
                (
                    name,
                    TableField {
                        ordinal_position,
                        not_null,
                        type_name,
                    },
                )
            })
            .collect())
    }
}
