#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use strictql_core::ast::ObjectName;
use strictql_core::resolve::{
    ColumnDescription, DeclaredParam, PreparedStatement, TableField, TableFields,
};
use strictql_core::QueryMode;
use strictql_gen::{
    CatalogError, CatalogSession, CatalogSource, CodeImprover, Generator, Passthrough,
    QualityError, QueryToGenerate,
};

/// An in-memory catalog. Statements it does not know are rejected like
/// invalid SQL.
#[derive(Debug, Clone, Default)]
pub struct FakeCatalog {
    statements: Arc<BTreeMap<String, PreparedStatement>>,
    tables: Arc<BTreeMap<String, TableFields>>,
    delay: Option<Duration>,
    answered: Arc<AtomicBool>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statement(mut self, sql: &str, parameter_types: &[&str], columns: &[(&str, &str)]) -> Self {
        let prepared = PreparedStatement {
            parameter_types: parameter_types.iter().map(ToString::to_string).collect(),
            columns: columns
                .iter()
                .map(|(name, ty)| ColumnDescription::new(*name, *ty))
                .collect(),
        };
        Arc::make_mut(&mut self.statements).insert(sql.to_string(), prepared);
        self
    }

    /// Adds a table; columns are `(name, not_null, type)` in order.
    pub fn table(mut self, name: &str, columns: &[(&str, bool, &str)]) -> Self {
        let fields = (1i16..)
            .zip(columns)
            .map(|(ordinal_position, (column, not_null, type_name))| {
                (
                    (*column).to_string(),
                    TableField {
                        ordinal_position,
                        not_null: *not_null,
                        type_name: (*type_name).to_string(),
                    },
                )
            })
            .collect();
        Arc::make_mut(&mut self.tables).insert(name.to_string(), fields);
        self
    }

    /// Makes every prepare wait before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Whether any prepare has finished waiting out its delay.
    pub fn answered(&self) -> bool {
        self.answered.load(Ordering::SeqCst)
    }
}

pub struct FakeSession {
    catalog: FakeCatalog,
}

impl CatalogSource for FakeCatalog {
    type Session = FakeSession;

    async fn session(&self) -> Result<FakeSession, CatalogError> {
        Ok(FakeSession {
            catalog: self.clone(),
        })
    }
}

impl CatalogSession for FakeSession {
    async fn prepare(&mut self, sql: &str) -> Result<PreparedStatement, CatalogError> {
        if let Some(delay) = self.catalog.delay {
            tokio::time::sleep(delay).await;
        }
        self.catalog.answered.store(true, Ordering::SeqCst);
        self.catalog
            .statements
            .get(sql)
            .cloned()
            .ok_or_else(|| CatalogError::Syntax(format!("syntax error in \"{sql}\"")))
    }

    async fn table_fields(&mut self, table: &ObjectName) -> Result<TableFields, CatalogError> {
        self.catalog
            .tables
            .get(&table.name)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))
    }
}

/// Rejects every module.
#[derive(Debug, Clone, Copy)]
pub struct RejectAll;

impl CodeImprover for RejectAll {
    async fn improve(&self, _code: String) -> Result<String, QualityError> {
        Err(QualityError::Rejected {
            command: "lint".into(),
            status: "exit status: 1".into(),
            stderr: "E501 line too long".into(),
        })
    }
}

pub fn generator(catalog: FakeCatalog) -> Generator<FakeCatalog, Passthrough> {
    Generator::new(BTreeMap::from([("main".to_string(), catalog)]), Passthrough, true)
}

pub fn query(function: &str, sql: &str, path: &str, mode: QueryMode, params: &[&str]) -> QueryToGenerate {
    QueryToGenerate {
        function_name: function.to_string(),
        sql: sql.to_string(),
        relative_path: PathBuf::from(path),
        params: params.iter().map(|name| DeclaredParam::new(*name)).collect(),
        database: "main".to_string(),
        mode,
    }
}

/// Every file below `root` by `/`-separated relative path.
pub fn tree(root: &Path) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                files.insert(key, fs::read_to_string(&path).unwrap());
            }
        }
    }
    files
}

/// Names of the entries directly inside `dir`.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
