//! In-memory recipe store with built-in recipes.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use kiln_core::{
    application::{ApplicationError, ports::RecipeStore},
    domain::Recipe,
    error::KilnResult,
};

use crate::{recipe_loader::RecipeLoader, recipes};

/// Thread-safe in-memory recipe store, keyed by recipe name.
#[derive(Clone, Default)]
pub struct InMemoryRecipeStore {
    inner: Arc<RwLock<BTreeMap<String, Recipe>>>,
}

impl InMemoryRecipeStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with built-in recipes loaded.
    pub fn with_builtin() -> KilnResult<Self> {
        let store = Self::new();
        store.load_builtin()?;
        Ok(store)
    }

    pub fn load_builtin(&self) -> KilnResult<()> {
        for recipe in recipes::builtin()? {
            self.insert(recipe)?;
        }
        Ok(())
    }

    /// Add every recipe found by `loader`. Loaded recipes replace built-ins
    /// of the same name.
    pub fn load_from(&self, loader: &RecipeLoader) -> KilnResult<usize> {
        let loaded = loader.load_all()?;
        let count = loaded.len();
        for recipe in loaded {
            self.insert(recipe)?;
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecipeStore for InMemoryRecipeStore {
    fn get(&self, name: &str) -> KilnResult<Recipe> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner.get(name).cloned().ok_or_else(|| {
            ApplicationError::RecipeNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn list(&self) -> KilnResult<Vec<Recipe>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        Ok(inner.values().cloned().collect())
    }

    fn insert(&self, recipe: Recipe) -> KilnResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner.insert(recipe.name.clone(), recipe);
        Ok(())
    }
}
