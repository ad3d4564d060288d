//! Generates typed Python database access code from Postgres statements.
//!
//! `strictql-gen` drives [`strictql_core`] against live databases:
//!
//! - **Catalog client** - prepares statements and reads table columns over
//!   a sqlx connection pool
//! - **Orchestrator** - resolves every configured query concurrently and
//!   fails the whole run on the first error
//! - **Publish** - replaces the output directory atomically, together with
//!   a checksum manifest that guards against hand edits
//! - **Quality** - an optional external formatter applied to every module
//!
//! # CLI Usage
//!
//! ```bash
//! # Regenerate everything listed in strictql.toml
//! strictql generate
//!
//! # Fail if the generated code is out of date
//! strictql check
//!
//! # Print the module for one statement
//! strictql render --database main --function get_user --mode fetch_row \
//!     --param id "select name from users where id = $1"
//! ```

pub mod catalog_client;
pub mod config;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod publish;
pub mod quality;

pub use catalog_client::{CatalogSession, CatalogSource};
pub use config::{Config, DatabaseConfig, QueryToGenerate};
pub use error::{CatalogError, GenerateError, QualityError, Result};
pub use manifest::{Manifest, ManifestDiff, MANIFEST_FILE};
pub use orchestrator::{GeneratedFile, Generator};
pub use quality::{CodeImprover, ExternalCommand, Passthrough};
