//! Recipes that ship with Kiln.
//!
//! User recipes come from `*.toml` files through
//! [`RecipeLoader`](crate::recipe_loader::RecipeLoader); these are compiled
//! in and always available.

use kiln_core::domain::{DomainError, Recipe};

pub mod rails_api;

/// Every built-in recipe, sorted by name.
pub fn builtin() -> Result<Vec<Recipe>, DomainError> {
    let mut recipes = vec![rails_api::recipe()?];
    recipes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(recipes)
}
