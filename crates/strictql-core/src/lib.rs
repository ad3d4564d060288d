//! # strictql-core
//!
//! Turns Postgres statement metadata into typed Python wrappers.
//!
//! This crate provides:
//! - A Postgres-dialect lexer and a recursive descent parser with Pratt
//!   expression parsing, used to tie INSERT parameters to columns
//! - A static catalog from Postgres type names to [`ResolvedType`]
//! - Resolvers for bind parameter and result column types
//! - Rendering of asyncpg/pydantic Python modules
//!
//! It never talks to a database. Callers describe a prepared statement and,
//! for INSERT statements, the target table's columns:
//!
//! ```rust
//! use strictql_core::codegen::{render_query, QueryOutput};
//! use strictql_core::resolve::{
//!     analyze_bind_params, bind_parameters, resolve_bind_params, resolve_result_schema,
//!     validate_result_schema, ColumnDescription, DeclaredParam, PreparedStatement,
//! };
//!
//! let sql = "select name from users where id = $1";
//! let prepared = PreparedStatement {
//!     parameter_types: vec!["int4".into()],
//!     columns: vec![ColumnDescription::new("name", "text")],
//! };
//!
//! let analysis = analyze_bind_params(sql).unwrap();
//! let inferred = resolve_bind_params(&prepared, &analysis, None, false).unwrap();
//! let params = bind_parameters(inferred, &[DeclaredParam::new("id")]).unwrap();
//!
//! let schema = resolve_result_schema(&prepared).unwrap();
//! validate_result_schema(&schema).unwrap();
//!
//! let module = render_query("get_user_name", sql, &params, &QueryOutput::FetchRow(schema)).unwrap();
//! assert!(module.contains("async def get_user_name(connection: Connection, id: int)"));
//! assert!(module.contains("class GetUserNameModel(BaseModel):"));
//! ```

pub mod ast;
pub mod catalog;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod naming;
pub mod parser;
pub mod resolve;
pub mod types;

pub use codegen::{render_query, QueryMode, QueryOutput};
pub use error::{RenderError, ResolveError};
pub use parser::{ParseError, Parser, StatementKind};
pub use resolve::{DeclaredParam, PreparedStatement, TableField, TableFields};
pub use types::{BindParameter, ImportedKind, ModelType, ResolvedType, ResultSchema, SimpleKind};
