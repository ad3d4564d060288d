//! The `strictql.toml` configuration file.
//!
//! ```toml
//! output_dir = "generated"
//! assume_params_optional = true
//! formatter = ["ruff", "format", "-"]
//!
//! [databases.main]
//! url_env = "DATABASE_URL"
//! max_connections = 5
//!
//! [queries.fetch_all_users]
//! database = "main"
//! path = "users/fetch_all_users.py"
//! mode = "fetch_all"
//! sql = "select id, name from users where id = $1"
//! params = ["id"]
//! ```
//!
//! Loading resolves the file into a [`Config`]: paths are made absolute,
//! database URLs are read from the environment and every query is checked.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use strictql_core::naming;
use strictql_core::resolve::DeclaredParam;
use strictql_core::QueryMode;

use crate::error::{GenerateError, Result};

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "strictql.toml";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    output_dir: PathBuf,
    #[serde(default = "default_assume_params_optional")]
    assume_params_optional: bool,
    #[serde(default)]
    formatter: Vec<String>,
    databases: BTreeMap<String, RawDatabase>,
    #[serde(default)]
    queries: BTreeMap<String, RawQuery>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDatabase {
    url_env: String,
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQuery {
    database: String,
    path: String,
    mode: String,
    sql: String,
    #[serde(default)]
    params: Vec<RawParam>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawParam {
    Name(String),
    Declared {
        name: String,
        #[serde(default)]
        optional: Option<bool>,
    },
}

const fn default_assume_params_optional() -> bool {
    true
}

const fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

/// A database the queries run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub name: String,
    pub url: String,
    pub max_connections: u32,
}

/// One query to turn into a Python module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToGenerate {
    /// Name of the generated function; lower snake case.
    pub function_name: String,
    pub sql: String,
    /// Output path relative to the output directory.
    pub relative_path: PathBuf,
    /// Declared parameter names in `$1..$N` order.
    pub params: Vec<DeclaredParam>,
    pub database: String,
    pub mode: QueryMode,
}

/// A validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute output directory.
    pub output_dir: PathBuf,
    /// Nullability of parameters whose columns are unknown.
    pub assume_params_optional: bool,
    /// Code quality command; empty when code is published as rendered.
    pub formatter: Vec<String>,
    pub databases: BTreeMap<String, DatabaseConfig>,
    /// Queries ordered by function name.
    pub queries: Vec<QueryToGenerate>,
}

impl Config {
    /// Databases referenced by at least one query.
    pub fn databases_in_use(&self) -> impl Iterator<Item = &DatabaseConfig> {
        let used: BTreeSet<&str> = self
            .queries
            .iter()
            .map(|query| query.database.as_str())
            .collect();
        self.databases
            .values()
            .filter(move |database| used.contains(database.name.as_str()))
    }

    /// Reads and validates the configuration at `path`, taking database
    /// URLs from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, `ConfigParse` for
    /// malformed TOML and `Config` for invalid content.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let base = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(std::env::current_dir, |parent| Ok(parent.to_path_buf()))?;
        let base = if base.is_absolute() {
            base
        } else {
            std::env::current_dir()?.join(base)
        };
        Self::parse(&text, &base, |name| std::env::var(name).ok()).map_err(|err| match err {
            GenerateError::ConfigParse { source, .. } => GenerateError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses configuration text. Relative paths are resolved against
    /// `base_dir`; `env` looks up environment variables.
    ///
    /// # Errors
    ///
    /// `ConfigParse` for malformed TOML and `Config` for invalid content.
    pub fn parse(
        text: &str,
        base_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| GenerateError::ConfigParse {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            source,
        })?;

        let mut databases = BTreeMap::new();
        for (name, database) in raw.databases {
            if database.max_connections == 0 {
                return Err(config_error(format!(
                    "database '{name}': max_connections must be at least 1"
                )));
            }
            let url = env(&database.url_env).ok_or_else(|| {
                config_error(format!(
                    "database '{name}': environment variable '{}' is not set",
                    database.url_env
                ))
            })?;
            databases.insert(
                name.clone(),
                DatabaseConfig {
                    name,
                    url,
                    max_connections: database.max_connections,
                },
            );
        }

        let mut paths = BTreeSet::new();
        let mut queries = Vec::with_capacity(raw.queries.len());
        for (function_name, query) in raw.queries {
            if !naming::is_snake_case(&function_name) {
                return Err(config_error(format!(
                    "query '{function_name}': function name must be lower snake case"
                )));
            }
            if !databases.contains_key(&query.database) {
                return Err(config_error(format!(
                    "query '{function_name}': unknown database '{}'",
                    query.database
                )));
            }
            let relative_path = validate_relative_path(&query.path)
                .map_err(|reason| config_error(format!("query '{function_name}': {reason}")))?;
            if !paths.insert(relative_path.clone()) {
                return Err(config_error(format!(
                    "query '{function_name}': output path '{}' is used by another query",
                    query.path
                )));
            }
            let mode = query
                .mode
                .parse::<QueryMode>()
                .map_err(|reason| config_error(format!("query '{function_name}': {reason}")))?;

            queries.push(QueryToGenerate {
                function_name,
                sql: query.sql,
                relative_path,
                params: query.params.into_iter().map(RawParam::into_declared).collect(),
                database: query.database,
                mode,
            });
        }

        Ok(Self {
            output_dir: base_dir.join(raw.output_dir),
            assume_params_optional: raw.assume_params_optional,
            formatter: raw.formatter,
            databases,
            queries,
        })
    }
}

impl RawParam {
    fn into_declared(self) -> DeclaredParam {
        match self {
            Self::Name(name) => DeclaredParam::new(name),
            Self::Declared { name, optional } => DeclaredParam { name, optional },
        }
    }
}

fn config_error(message: String) -> GenerateError {
    GenerateError::Config(message)
}

/// Accepts `a/b/c.py`-style paths that stay inside the output directory.
///
/// # Errors
///
/// Returns the reason the path is rejected.
pub fn validate_relative_path(path: &str) -> std::result::Result<PathBuf, String> {
    if path.is_empty() {
        return Err(String::from("output path is empty"));
    }
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return Err(format!("output path '{path}' must be relative"));
    }
    if let Some(segment) = path
        .split(&['/', '\\'][..])
        .find(|segment| matches!(*segment, "" | "." | ".." | "~"))
    {
        return Err(format!(
            "output path '{path}' contains the segment '{segment}'"
        ));
    }
    if !path.ends_with(".py") {
        return Err(format!("output path '{path}' must end with .py"));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
output_dir = "generated"
formatter = ["ruff", "format", "-"]

[databases.main]
url_env = "MAIN_URL"

[databases.reports]
url_env = "REPORTS_URL"
max_connections = 2

[queries.fetch_all_users]
database = "main"
path = "users/fetch_all_users.py"
mode = "fetch_all"
sql = "select id, name from users where id = $1 and name = $2"
params = ["id", { name = "name", optional = false }]

[queries.delete_report]
database = "reports"
path = "delete_report.py"
mode = "execute"
sql = "delete from reports where id = $1"
params = ["report_id"]
"#;

    fn env(name: &str) -> Option<String> {
        match name {
            "MAIN_URL" => Some("postgres://localhost/main".into()),
            "REPORTS_URL" => Some("postgres://localhost/reports".into()),
            _ => None,
        }
    }

    fn parse(text: &str) -> Result<Config> {
        Config::parse(text, Path::new("/project"), env)
    }

    fn config_message(text: &str) -> String {
        match parse(text) {
            Err(GenerateError::Config(message)) => message,
            other => panic!("Expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(CONFIG).unwrap();
        assert_eq!(config.output_dir, Path::new("/project/generated"));
        assert!(config.assume_params_optional);
        assert_eq!(config.formatter, vec!["ruff", "format", "-"]);
        assert_eq!(config.databases["main"].max_connections, 5);
        assert_eq!(config.databases["reports"].max_connections, 2);
        assert_eq!(config.databases["main"].url, "postgres://localhost/main");

        let names: Vec<_> = config.queries.iter().map(|q| q.function_name.as_str()).collect();
        assert_eq!(names, vec!["delete_report", "fetch_all_users"]);

        let users = &config.queries[1];
        assert_eq!(users.mode, QueryMode::FetchAll);
        assert_eq!(users.relative_path, Path::new("users/fetch_all_users.py"));
        assert_eq!(
            users.params,
            vec![
                DeclaredParam::new("id"),
                DeclaredParam::new("name").with_optional(false)
            ]
        );
    }

    #[test]
    fn test_databases_in_use() {
        let text = format!("{CONFIG}\n[databases.archive]\nurl_env = \"MAIN_URL\"\n");
        let config = parse(&text).unwrap();
        assert_eq!(config.databases.len(), 3);

        let used: Vec<_> = config.databases_in_use().map(|db| db.name.as_str()).collect();
        assert_eq!(used, vec!["main", "reports"]);

        let idle = parse("output_dir = \"out\"\n[databases.main]\nurl_env = \"MAIN_URL\"\n").unwrap();
        assert_eq!(idle.databases_in_use().count(), 0);
    }

    #[test]
    fn test_defaults() {
        let config = parse(
            r#"
output_dir = "out"
[databases.main]
url_env = "MAIN_URL"
"#,
        )
        .unwrap();
        assert!(config.assume_params_optional);
        assert!(config.formatter.is_empty());
        assert!(config.queries.is_empty());
    }

    #[test]
    fn test_rejects_invalid_queries() {
        let base = "output_dir = \"out\"\n[databases.main]\nurl_env = \"MAIN_URL\"\n";
        let query = |name: &str, database: &str, path: &str, mode: &str| {
            format!(
                "{base}[queries.{name}]\ndatabase = \"{database}\"\npath = \"{path}\"\nmode = \"{mode}\"\nsql = \"select 1\"\n"
            )
        };

        assert!(config_message(&query("FetchAll", "main", "a.py", "execute"))
            .contains("lower snake case"));
        assert!(config_message(&query("q", "other", "a.py", "execute"))
            .contains("unknown database 'other'"));
        assert!(config_message(&query("q", "main", "a.py", "fetch_one")).contains("unknown mode"));
        assert!(config_message(&query("q", "main", "a.txt", "execute")).contains(".py"));
        assert!(config_message(&query("q", "main", "../a.py", "execute")).contains("'..'"));

        let duplicate = format!(
            "{}[queries.r]\ndatabase = \"main\"\npath = \"a.py\"\nmode = \"execute\"\nsql = \"select 1\"\n",
            query("q", "main", "a.py", "execute")
        );
        assert!(config_message(&duplicate).contains("used by another query"));
    }

    #[test]
    fn test_rejects_unset_environment_variable() {
        let message = config_message(
            "output_dir = \"out\"\n[databases.main]\nurl_env = \"NOT_SET_ANYWHERE\"\n",
        );
        assert!(message.contains("NOT_SET_ANYWHERE"));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            parse("output_dir = \"out\"\nunknown_key = 1\n[databases]\n"),
            Err(GenerateError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path("a/b/c.py").is_ok());
        for bad in ["", "/abs.py", "./a.py", "a/../b.py", "~/a.py", "a//b.py", "a.py/"] {
            assert!(validate_relative_path(bad).is_err(), "{bad}");
        }
    }
}
