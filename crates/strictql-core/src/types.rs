//! The type model that resolved Postgres types are mapped into.
//!
//! Every consumer matches on [`ResolvedType`] exhaustively, so adding a new
//! target type is a single compiler-checked change.

use std::collections::BTreeSet;
use std::fmt;

/// Builtin Python scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SimpleKind {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
}

impl SimpleKind {
    /// The Python type name.
    #[must_use]
    pub const fn python_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
        }
    }
}

/// Python types that need an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImportedKind {
    Decimal,
    Date,
    DateTime,
    Time,
    TimeDelta,
}

impl ImportedKind {
    /// The imported symbol.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Decimal => "Decimal",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::TimeDelta => "timedelta",
        }
    }

    /// The module the symbol is imported from.
    #[must_use]
    pub const fn module(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Date | Self::DateTime | Self::Time | Self::TimeDelta => "datetime",
        }
    }

    /// The import this type requires.
    #[must_use]
    pub const fn import(self) -> Import {
        Import::new(self.module(), self.name())
    }
}

/// A `from module import name` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Import {
    pub module: &'static str,
    pub name: &'static str,
}

impl Import {
    #[must_use]
    pub const fn new(module: &'static str, name: &'static str) -> Self {
        Self { module, name }
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {} import {}", self.module, self.name)
    }
}

/// A named record type with ordered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelType {
    pub name: String,
    pub fields: Vec<(String, ResolvedType)>,
}

impl ModelType {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<(String, ResolvedType)>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Finds a model reachable from this one's fields (at any depth, through
    /// lists too) that carries this model's own name.
    #[must_use]
    pub fn find_cycle(&self) -> Option<&str> {
        let mut stack: Vec<&ResolvedType> = self.fields.iter().map(|(_, ty)| ty).collect();
        while let Some(ty) = stack.pop() {
            match ty {
                ResolvedType::Simple { .. } | ResolvedType::Imported { .. } => {}
                ResolvedType::List { element, .. } => stack.push(&**element),
                ResolvedType::Model(model) => {
                    if model.name == self.name {
                        return Some(self.name.as_str());
                    }
                    stack.extend(model.fields.iter().map(|(_, ty)| ty));
                }
            }
        }
        None
    }
}

/// A resolved value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    Simple {
        kind: SimpleKind,
        optional: bool,
    },
    List {
        element: Box<ResolvedType>,
        optional: bool,
    },
    Imported {
        kind: ImportedKind,
        optional: bool,
    },
    Model(ModelType),
}

impl ResolvedType {
    #[must_use]
    pub const fn simple(kind: SimpleKind, optional: bool) -> Self {
        Self::Simple { kind, optional }
    }

    #[must_use]
    pub const fn imported(kind: ImportedKind, optional: bool) -> Self {
        Self::Imported { kind, optional }
    }

    #[must_use]
    pub fn list(element: Self, optional: bool) -> Self {
        Self::List {
            element: Box::new(element),
            optional,
        }
    }

    /// Whether the value may be `None`. Models are never optional.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        match self {
            Self::Simple { optional, .. }
            | Self::List { optional, .. }
            | Self::Imported { optional, .. } => *optional,
            Self::Model(_) => false,
        }
    }

    /// Returns the same type with the outer optionality replaced. Models are
    /// returned unchanged.
    #[must_use]
    pub fn with_optional(self, optional: bool) -> Self {
        match self {
            Self::Simple { kind, .. } => Self::Simple { kind, optional },
            Self::List { element, .. } => Self::List { element, optional },
            Self::Imported { kind, .. } => Self::Imported { kind, optional },
            model @ Self::Model(_) => model,
        }
    }

    /// The Python annotation, e.g. `int | None` or `list[str | None]`.
    #[must_use]
    pub fn annotation(&self) -> String {
        let base = match self {
            Self::Simple { kind, .. } => kind.python_name().to_string(),
            Self::List { element, .. } => format!("list[{}]", element.annotation()),
            Self::Imported { kind, .. } => kind.name().to_string(),
            Self::Model(model) => model.name.clone(),
        };
        if self.is_optional() {
            format!("{base} | None")
        } else {
            base
        }
    }

    /// Adds the imports this annotation needs. Nested models are not
    /// descended into; their own fields are rendered separately.
    pub fn collect_imports(&self, imports: &mut BTreeSet<Import>) {
        match self {
            Self::Simple { .. } | Self::Model(_) => {}
            Self::List { element, .. } => element.collect_imports(imports),
            Self::Imported { kind, .. } => {
                imports.insert(kind.import());
            }
        }
    }
}

/// A positional bind parameter with the name it gets in the generated
/// function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindParameter {
    pub name: String,
    pub ty: ResolvedType,
}

/// Ordered result columns of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSchema {
    pub columns: Vec<(String, ResolvedType)>,
}

impl ResultSchema {
    /// Turns the schema into the record model named `name`.
    #[must_use]
    pub fn into_model(self, name: impl Into<String>) -> ModelType {
        ModelType::new(name, self.columns)
    }
}
