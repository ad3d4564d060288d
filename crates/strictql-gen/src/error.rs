//! Error types for the generation pipeline.

use std::path::PathBuf;

use strictql_core::{RenderError, ResolveError};

/// Errors reported by a catalog session.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The server rejected the statement while preparing it.
    #[error("{0}")]
    Syntax(String),

    /// The relation has no columns visible to the session.
    #[error("Relation '{0}' does not exist")]
    TableNotFound(String),

    /// Any other driver failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors from the code quality improver.
#[derive(Debug, thiserror::Error)]
pub enum QualityError {
    /// The improver could not be started or talked to.
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        /// Program name.
        command: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The improver rejected the code.
    #[error("'{command}' exited with {status}: {stderr}")]
    Rejected {
        /// Program name.
        command: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The improver produced output that is not UTF-8.
    #[error("'{0}' produced output that is not valid UTF-8")]
    InvalidOutput(String),
}

/// Errors that can occur while generating code.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The database rejected the statement.
    #[error("Query '{function}': statement rejected by the database: {message}\n{sql}")]
    Syntax {
        /// Function name of the query.
        function: String,
        /// Statement text.
        sql: String,
        /// Server message.
        message: String,
    },

    /// Parameter or result types could not be resolved.
    #[error("Query '{function}': {source}\n{sql}")]
    Resolve {
        /// Function name of the query.
        function: String,
        /// Statement text.
        sql: String,
        /// Resolution failure.
        source: ResolveError,
    },

    /// The resolved query could not be rendered.
    #[error("Query '{function}': {source}")]
    Render {
        /// Function name of the query.
        function: String,
        /// Rendering failure.
        source: RenderError,
    },

    /// Rendered code failed the quality pass.
    #[error("Query '{function}': code quality check failed: {source}")]
    Quality {
        /// Function name of the query.
        function: String,
        /// Improver failure.
        source: QualityError,
    },

    /// A connection could not be established or acquired.
    #[error("Connection to database '{database}' failed: {source}")]
    Connection {
        /// Database name from the configuration.
        database: String,
        /// Driver error.
        source: sqlx::Error,
    },

    /// The output directory exists but was not produced by a previous run.
    #[error(
        "Output directory '{}' exists but has no manifest file; is it the right directory?",
        .0.display()
    )]
    MissingManifest(PathBuf),

    /// The output directory was edited after the last run.
    #[error(
        "Output directory '{}' was modified after generation: {}",
        .path.display(),
        .changed.join(", ")
    )]
    ManifestDrift {
        /// Output directory.
        path: PathBuf,
        /// Relative paths whose checksums differ, appeared or disappeared.
        changed: Vec<String>,
    },

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configuration file is not valid TOML for the expected shape.
    #[error("Failed to parse configuration file '{}': {source}", .path.display())]
    ConfigParse {
        /// Path to the configuration file.
        path: PathBuf,
        /// TOML error.
        source: toml::de::Error,
    },

    /// Database error outside a query's resolution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading or publishing files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A generation task panicked or was cancelled.
    #[error("Generation task failed: {0}")]
    Task(String),
}

impl GenerateError {
    /// Wraps a catalog failure that happened while resolving `function`.
    pub(crate) fn from_catalog(function: &str, sql: &str, err: CatalogError) -> Self {
        match err {
            CatalogError::Syntax(message) => Self::Syntax {
                function: function.to_string(),
                sql: sql.to_string(),
                message,
            },
            CatalogError::TableNotFound(relation) => Self::Resolve {
                function: function.to_string(),
                sql: sql.to_string(),
                source: ResolveError::MissingRelation { relation },
            },
            CatalogError::Database(err) => Self::Database(err),
        }
    }
}

/// Result type for generation.
pub type Result<T> = std::result::Result<T, GenerateError>;
