//! Model collection and class rendering.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::RenderError;
use crate::types::{Import, ModelType, ResolvedType};

/// Models to emit, dependency-first and unique by name.
#[derive(Debug, Default)]
pub(super) struct ModelSet {
    ordered: Vec<ModelType>,
    by_name: BTreeMap<String, usize>,
}

impl ModelSet {
    /// Adds `model` after every model its fields refer to.
    pub(super) fn insert(&mut self, model: &ModelType) -> Result<(), RenderError> {
        if let Some(name) = model.find_cycle() {
            return Err(RenderError::RecursiveModel(name.to_string()));
        }
        self.insert_acyclic(model)
    }

    /// Adds every model reachable from `ty`.
    pub(super) fn insert_nested(&mut self, ty: &ResolvedType) -> Result<(), RenderError> {
        match ty {
            ResolvedType::Simple { .. } | ResolvedType::Imported { .. } => Ok(()),
            ResolvedType::List { element, .. } => self.insert_nested(element),
            ResolvedType::Model(model) => self.insert(model),
        }
    }

    fn insert_acyclic(&mut self, model: &ModelType) -> Result<(), RenderError> {
        if let Some(&index) = self.by_name.get(&model.name) {
            return if self.ordered[index] == *model {
                Ok(())
            } else {
                Err(RenderError::ConflictingModel(model.name.clone()))
            };
        }

        for (_, ty) in &model.fields {
            self.insert_nested(ty)?;
        }
        self.by_name.insert(model.name.clone(), self.ordered.len());
        self.ordered.push(model.clone());
        Ok(())
    }

    pub(super) fn collect_imports(&self, imports: &mut BTreeSet<Import>) {
        for model in &self.ordered {
            for (_, ty) in &model.fields {
                ty.collect_imports(imports);
            }
        }
    }

    pub(super) fn render(&self) -> Vec<String> {
        self.ordered.iter().map(render_model).collect()
    }
}

fn render_model(model: &ModelType) -> String {
    let mut out = format!("class {}(BaseModel):\n", model.name);
    if model.fields.is_empty() {
        out.push_str("    pass\n");
    }
    for (name, ty) in &model.fields {
        out.push_str(&format!("    {name}: {}\n", ty.annotation()));
    }
    out
}

/// Renders import lines, merging names imported from the same module.
pub(super) fn render_imports(imports: &BTreeSet<Import>) -> String {
    let mut by_module: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for import in imports {
        by_module.entry(import.module).or_default().push(import.name);
    }
    by_module
        .into_iter()
        .map(|(module, names)| format!("from {module} import {}\n", names.join(", ")))
        .collect()
}
