use crate::technique::{Category, Technique};
use crate::techniques;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building or querying a `TechniqueRegistry`.
///
/// Both are configuration errors: they surface before any payload is processed.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A technique with the same name has already been registered.
    #[error("Duplicate technique name: {0}")]
    DuplicateTechnique(String),

    /// No technique with the requested name exists. `available` is sorted for display.
    #[error("Unknown technique: {name}. Available: {}", available.join(", "))]
    TechniqueNotFound { name: String, available: Vec<String> },
}

/// Catalog of every technique available to the engines of one process.
///
/// The registry is filled once at start-up and only read afterwards. The name index and
/// the category index both point into the same registration-ordered list, so a technique
/// reachable by one is always reachable by the other.
#[derive(Default)]
pub struct TechniqueRegistry {
    entries: Vec<Arc<dyn Technique>>,
    by_name: HashMap<String, usize>,
    by_category: HashMap<Category, Vec<usize>>,
}

impl TechniqueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding every built-in technique.
    pub fn with_builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for technique in techniques::builtin() {
            registry.register(technique)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, technique: Arc<dyn Technique>) -> Result<(), RegistryError> {
        let name = technique.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateTechnique(name));
        }
        let index = self.entries.len();
        self.by_category
            .entry(technique.category())
            .or_default()
            .push(index);
        self.by_name.insert(name, index);
        self.entries.push(technique);
        Ok(())
    }

    /// Snapshot of all registered techniques in registration order.
    pub fn all(&self) -> Vec<Arc<dyn Technique>> {
        self.entries.clone()
    }

    pub fn by_name(&self, name: &str) -> Result<Arc<dyn Technique>, RegistryError> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.entries[index]))
            .ok_or_else(|| RegistryError::TechniqueNotFound {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn by_category(&self, category: &Category) -> Vec<Arc<dyn Technique>> {
        self.by_category
            .get(category)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| Arc::clone(&self.entries[index]))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolves an ordered allow-list of names, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Arc<dyn Technique>>, RegistryError> {
        names.iter().map(|name| self.by_name(name.as_ref())).collect()
    }

    /// Sorted technique names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted list of the categories that have at least one technique.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.by_category.keys().cloned().collect();
        categories.sort();
        categories
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TechniqueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TechniqueRegistry")
            .field("techniques", &self.names())
            .finish()
    }
}
