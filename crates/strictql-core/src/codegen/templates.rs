//! Function templates per execution mode.

use super::QueryMode;
use crate::types::BindParameter;

/// A function template, chosen by mode and by whether the statement takes
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Template {
    mode: QueryMode,
    has_params: bool,
}

impl Template {
    pub(super) const fn select(mode: QueryMode, has_params: bool) -> Self {
        Self { mode, has_params }
    }

    /// Renders the `async def`. `model` is the record model name and is
    /// unused for [`QueryMode::Execute`].
    pub(super) fn render(
        &self,
        function_name: &str,
        sql: &str,
        params: &[BindParameter],
        model: &str,
    ) -> String {
        let (signature, arguments) = if self.has_params {
            let declared: Vec<String> = params
                .iter()
                .map(|param| format!("{}: {}", param.name, param.ty.annotation()))
                .collect();
            let passed: Vec<&str> = params.iter().map(|param| param.name.as_str()).collect();
            (
                format!("connection: Connection, {}", declared.join(", ")),
                format!("query, {}", passed.join(", ")),
            )
        } else {
            (String::from("connection: Connection"), String::from("query"))
        };
        let query = python_string_literal(sql);

        match self.mode {
            QueryMode::FetchAll => format!(
                "async def {function_name}({signature}) -> Sequence[{model}]:\n\
                 \x20   query = {query}\n\
                 \x20   records = await connection.fetch({arguments})\n\
                 \x20   return [{model}.model_validate(dict(record)) for record in records]\n"
            ),
            QueryMode::FetchRow => format!(
                "async def {function_name}({signature}) -> {model} | None:\n\
                 \x20   query = {query}\n\
                 \x20   record = await connection.fetchrow({arguments})\n\
                 \x20   if record is None:\n\
                 \x20       return None\n\
                 \x20   return {model}.model_validate(dict(record))\n"
            ),
            QueryMode::Execute => format!(
                "async def {function_name}({signature}) -> str:\n\
                 \x20   query = {query}\n\
                 \x20   return await connection.execute({arguments})\n"
            ),
        }
    }
}

/// Embeds `text` in a triple-quoted literal that evaluates to exactly
/// `text`.
fn python_string_literal(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "\\r");
    format!("\"\"\"{escaped}\"\"\"")
}
