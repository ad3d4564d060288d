//! Python code generation.
//!
//! Each query becomes one module: imports, the pydantic models its result
//! needs, and one `async def` taking an asyncpg `Connection`.

mod models;
mod templates;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use self::models::{render_imports, ModelSet};
use self::templates::Template;
use crate::error::RenderError;
use crate::naming;
use crate::types::{BindParameter, Import, ResultSchema};

/// Local names used by the generated function body.
const RESERVED_NAMES: &[&str] = &["connection", "query", "record", "records"];

/// How the generated function runs its statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Every row, as a sequence of models.
    FetchAll,
    /// The first row as a model, or `None`.
    FetchRow,
    /// The command status string.
    Execute,
}

impl QueryMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchAll => "fetch_all",
            Self::FetchRow => "fetch_row",
            Self::Execute => "execute",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch_all" => Ok(Self::FetchAll),
            "fetch_row" => Ok(Self::FetchRow),
            "execute" => Ok(Self::Execute),
            other => Err(format!(
                "unknown mode '{other}', expected fetch_all, fetch_row or execute"
            )),
        }
    }
}

/// What the generated function returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    FetchAll(ResultSchema),
    FetchRow(ResultSchema),
    Execute,
}

impl QueryOutput {
    #[must_use]
    pub const fn mode(&self) -> QueryMode {
        match self {
            Self::FetchAll(_) => QueryMode::FetchAll,
            Self::FetchRow(_) => QueryMode::FetchRow,
            Self::Execute => QueryMode::Execute,
        }
    }
}

/// Name of the record model generated for `function_name`.
#[must_use]
pub fn model_name(function_name: &str) -> String {
    format!("{}Model", naming::pascal_case(function_name))
}

/// Renders the Python module for one query.
///
/// # Errors
///
/// `InvalidFunctionName` unless `function_name` is lower snake case,
/// `InvalidParameterName` for parameter names that are not identifiers or
/// clash with the function's locals, and the model errors of nested result
/// types.
pub fn render_query(
    function_name: &str,
    sql: &str,
    params: &[BindParameter],
    output: &QueryOutput,
) -> Result<String, RenderError> {
    if !naming::is_snake_case(function_name) {
        return Err(RenderError::InvalidFunctionName(function_name.to_string()));
    }
    let mut seen = BTreeSet::new();
    for param in params {
        let name = param.name.as_str();
        if !naming::is_python_identifier(name) || RESERVED_NAMES.contains(&name) || !seen.insert(name)
        {
            return Err(RenderError::InvalidParameterName(param.name.clone()));
        }
    }

    let mut imports = BTreeSet::from([Import::new("asyncpg", "Connection")]);
    let mut models = ModelSet::default();
    let model = model_name(function_name);

    match output {
        QueryOutput::FetchAll(schema) | QueryOutput::FetchRow(schema) => {
            models.insert(&schema.clone().into_model(model.as_str()))?;
            imports.insert(Import::new("pydantic", "BaseModel"));
            if output.mode() == QueryMode::FetchAll {
                imports.insert(Import::new("collections.abc", "Sequence"));
            }
        }
        QueryOutput::Execute => {}
    }
    for param in params {
        param.ty.collect_imports(&mut imports);
        models.insert_nested(&param.ty)?;
    }
    models.collect_imports(&mut imports);

    let function =
        Template::select(output.mode(), !params.is_empty()).render(function_name, sql, params, &model);

    let mut sections = vec![render_imports(&imports)];
    sections.extend(models.render());
    sections.push(function);
    Ok(sections.join("\n\n"))
}
