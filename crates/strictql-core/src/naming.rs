//! Identifier rules for the generated Python code.

use std::sync::LazyLock;

use regex::Regex;

static SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("Invalid snake case regex"));

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex")
});

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Returns true for lower snake case names such as `fetch_all_users`.
#[must_use]
pub fn is_snake_case(name: &str) -> bool {
    SNAKE_CASE.is_match(name)
}

/// Returns true if `name` can be used as a Python attribute or argument.
#[must_use]
pub fn is_python_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !PYTHON_KEYWORDS.contains(&name)
}

/// Returns true if `name` can be a public field of a pydantic model, which
/// excludes names with a leading underscore.
#[must_use]
pub fn is_model_field(name: &str) -> bool {
    is_python_identifier(name) && !name.starts_with('_')
}

/// `fetch_all_users` -> `FetchAllUsers`.
#[must_use]
pub fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}
