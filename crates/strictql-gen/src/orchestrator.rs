//! Concurrent resolution of all queries and publication of the results.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strictql_core::codegen::{render_query, QueryOutput};
use strictql_core::resolve::{
    analyze_bind_params, bind_parameters, resolve_bind_params, resolve_result_schema,
    validate_result_schema,
};
use strictql_core::{BindParameter, QueryMode, ResolveError};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::catalog_client::{CatalogSession, CatalogSource};
use crate::config::QueryToGenerate;
use crate::error::{CatalogError, GenerateError, Result};
use crate::manifest::{self, Manifest, ManifestDiff};
use crate::publish::ScopedReplace;
use crate::quality::CodeImprover;

/// A rendered module and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub relative_path: PathBuf,
    pub contents: String,
}

/// Resolves and renders queries against a set of named databases.
#[derive(Debug)]
pub struct Generator<S, I> {
    sources: BTreeMap<String, Arc<S>>,
    improver: Arc<I>,
    assume_params_optional: bool,
}

impl<S: CatalogSource, I: CodeImprover> Generator<S, I> {
    /// `sources` maps database names to their catalog sources.
    pub fn new(sources: BTreeMap<String, S>, improver: I, assume_params_optional: bool) -> Self {
        Self {
            sources: sources
                .into_iter()
                .map(|(name, source)| (name, Arc::new(source)))
                .collect(),
            improver: Arc::new(improver),
            assume_params_optional,
        }
    }

    /// The catalog sources by database name.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &S)> {
        self.sources
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_ref()))
    }

    fn source(&self, database: &str) -> Result<Arc<S>> {
        self.sources
            .get(database)
            .map(Arc::clone)
            .ok_or_else(|| GenerateError::Config(format!("unknown database '{database}'")))
    }

    /// Resolves, renders and improves a single query.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the query.
    pub async fn render(&self, query: &QueryToGenerate) -> Result<String> {
        let source = self.source(&query.database)?;
        render_one(
            source.as_ref(),
            self.improver.as_ref(),
            query,
            self.assume_params_optional,
        )
        .await
    }

    /// Renders every query concurrently. Files are returned in query order.
    ///
    /// On the first failure every other task is aborted and awaited before
    /// the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first failure observed.
    pub async fn render_all(&self, queries: &[QueryToGenerate]) -> Result<Vec<GeneratedFile>> {
        let mut tasks = JoinSet::new();
        for (index, query) in queries.iter().enumerate() {
            let source = self.source(&query.database)?;
            let improver = Arc::clone(&self.improver);
            let query = query.clone();
            let assume_params_optional = self.assume_params_optional;
            tasks.spawn(async move {
                let result = render_one(
                    source.as_ref(),
                    improver.as_ref(),
                    &query,
                    assume_params_optional,
                )
                .await;
                (index, result)
            });
        }

        let mut rendered: Vec<Option<String>> = vec![None; queries.len()];
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((index, Ok(contents))) => {
                    rendered[index] = Some(contents);
                    continue;
                }
                Ok((_, Err(err))) => err,
                Err(err) => GenerateError::Task(err.to_string()),
            };
            error!(error = %failure, "Generation failed, cancelling remaining queries");
            tasks.shutdown().await;
            return Err(failure);
        }

        rendered
            .into_iter()
            .zip(queries)
            .map(|(contents, query)| {
                contents
                    .map(|contents| GeneratedFile {
                        relative_path: query.relative_path.clone(),
                        contents,
                    })
                    .ok_or_else(|| {
                        GenerateError::Task(format!("no result for query '{}'", query.function_name))
                    })
            })
            .collect()
    }

    /// Runs the whole pipeline: verify the existing output, render every
    /// query and atomically publish the result with a fresh manifest.
    ///
    /// Nothing is written unless every query succeeds.
    ///
    /// # Errors
    ///
    /// `MissingManifest` or `ManifestDrift` before any work starts, the first
    /// query failure, or an IO error while publishing.
    pub async fn generate(
        &self,
        queries: &[QueryToGenerate],
        output_dir: &Path,
    ) -> Result<Manifest> {
        manifest::verify_output_dir(output_dir)?;

        info!(queries = queries.len(), "Generating code");
        let files = self.render_all(queries).await?;

        let replace = ScopedReplace::new(output_dir)?;
        for file in &files {
            replace.write(&file.relative_path, file.contents.as_bytes())?;
        }
        let manifest = replace.write_manifest()?;
        replace.commit()?;
        info!(files = files.len(), "Generation finished");
        Ok(manifest)
    }

    /// Renders every query and compares the result with `output_dir`
    /// without writing anything.
    ///
    /// # Errors
    ///
    /// The same verification and query failures as [`Self::generate`].
    pub async fn check(
        &self,
        queries: &[QueryToGenerate],
        output_dir: &Path,
    ) -> Result<ManifestDiff> {
        manifest::verify_output_dir(output_dir)?;

        let files = self.render_all(queries).await?;
        let expected = Manifest::from_contents(
            files
                .iter()
                .map(|file| (file.relative_path.as_path(), file.contents.as_bytes())),
        );
        let actual = if output_dir.exists() {
            Manifest::compute(output_dir)?
        } else {
            Manifest::default()
        };
        Ok(expected.diff(&actual))
    }
}

async fn render_one<S: CatalogSource, I: CodeImprover>(
    source: &S,
    improver: &I,
    query: &QueryToGenerate,
    assume_params_optional: bool,
) -> Result<String> {
    let function = query.function_name.as_str();
    debug!(query = %function, mode = %query.mode, "Resolving query");

    let (params, output) = {
        let mut session = source.session().await.map_err(|err| match err {
            CatalogError::Database(source) => GenerateError::Connection {
                database: query.database.clone(),
                source,
            },
            other => GenerateError::from_catalog(function, &query.sql, other),
        })?;
        resolve_query(&mut session, query, assume_params_optional).await?
    };

    let code = render_query(function, &query.sql, &params, &output).map_err(|source| {
        GenerateError::Render {
            function: function.to_string(),
            source,
        }
    })?;
    let code = improver
        .improve(code)
        .await
        .map_err(|source| GenerateError::Quality {
            function: function.to_string(),
            source,
        })?;
    debug!(query = %function, bytes = code.len(), "Rendered query");
    Ok(code)
}

/// Resolves the parameters and output of `query` over one session.
///
/// # Errors
///
/// `Syntax` when the server rejects the statement and `Resolve` for every
/// type resolution failure.
pub async fn resolve_query<S: CatalogSession>(
    session: &mut S,
    query: &QueryToGenerate,
    assume_params_optional: bool,
) -> Result<(Vec<BindParameter>, QueryOutput)> {
    let resolve_error = |source: ResolveError| GenerateError::Resolve {
        function: query.function_name.clone(),
        sql: query.sql.clone(),
        source,
    };
    let catalog_error =
        |err: CatalogError| GenerateError::from_catalog(&query.function_name, &query.sql, err);

    let prepared = session.prepare(&query.sql).await.map_err(catalog_error)?;
    let analysis = analyze_bind_params(&query.sql).map_err(resolve_error)?;
    let fields = match analysis.target_table() {
        Some(table) => Some(session.table_fields(table).await.map_err(catalog_error)?),
        None => None,
    };
    let inferred = resolve_bind_params(
        &prepared,
        &analysis,
        fields.as_ref(),
        assume_params_optional,
    )
    .map_err(resolve_error)?;
    let params = bind_parameters(inferred, &query.params).map_err(resolve_error)?;

    let output = match query.mode {
        QueryMode::Execute => QueryOutput::Execute,
        mode => {
            let schema = resolve_result_schema(&prepared).map_err(resolve_error)?;
            validate_result_schema(&schema).map_err(resolve_error)?;
            if mode == QueryMode::FetchAll {
                QueryOutput::FetchAll(schema)
            } else {
                QueryOutput::FetchRow(schema)
            }
        }
    };
    Ok((params, output))
}
