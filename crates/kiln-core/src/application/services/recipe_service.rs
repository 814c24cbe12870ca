//! Recipe Service - recipe lookup and metadata queries.
//!
//! Separated from the pipeline interpreter: this service never runs
//! anything, it only finds and renders recipes.

use tracing::instrument;

use crate::{
    application::ports::RecipeStore,
    domain::{Pipeline, Recipe, RenderContext},
    error::KilnResult,
};

/// Information about a recipe for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RecipeInfo {
    pub name: String,
    pub description: String,
    pub steps: usize,
    pub required: Vec<String>,
    pub defaults: Vec<(String, String)>,
}

impl From<&Recipe> for RecipeInfo {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            steps: recipe.pipeline.len(),
            required: recipe.required.clone(),
            defaults: recipe
                .defaults
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Service for recipe operations.
pub struct RecipeService {
    store: Box<dyn RecipeStore>,
}

impl RecipeService {
    pub fn new(store: Box<dyn RecipeStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, name: &str) -> KilnResult<Recipe> {
        self.store.get(name)
    }

    /// Add or replace a recipe.
    pub fn save(&self, recipe: Recipe) -> KilnResult<()> {
        self.store.insert(recipe)
    }

    pub fn list(&self) -> KilnResult<Vec<Recipe>> {
        self.store.list()
    }

    pub fn summaries(&self) -> KilnResult<Vec<RecipeInfo>> {
        Ok(self.store.list()?.iter().map(RecipeInfo::from).collect())
    }

    /// Look up `name` and render it into an executable pipeline.
    #[instrument(skip(self, ctx), fields(project = %ctx.project_name()))]
    pub fn render(&self, name: &str, ctx: &RenderContext) -> KilnResult<Pipeline> {
        let recipe = self.store.get(name)?;
        Ok(recipe.render(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::application::{ApplicationError, ports::MockRecipeStore};
    use crate::domain::{DomainError, WriteMode};
    use crate::error::KilnError;

    fn recipe() -> Recipe {
        let pipeline = Pipeline::new()
            .write(".ruby-version", "{{RUBY_VERSION}}\n", WriteMode::Overwrite)
            .unwrap();
        Recipe::new("rails-api", "Rails API", pipeline)
            .unwrap()
            .requires("RUBY_VERSION")
            .with_default("GEM_SOURCE", "https://rubygems.org")
    }

    #[test]
    fn render_substitutes_variables() {
        let mut store = MockRecipeStore::new();
        store
            .expect_get()
            .with(eq("rails-api"))
            .returning(|_| Ok(recipe()));

        let svc = RecipeService::new(Box::new(store));
        let ctx = RenderContext::new("shop").with_variable("RUBY_VERSION", "3.3.0");
        let pipeline = svc.render("rails-api", &ctx).unwrap();

        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline.steps()[0].to_string(), "write .ruby-version (overwrite)");
        assert!(pipeline.steps()[0].placeholders().is_empty());
    }

    #[test]
    fn render_without_required_variable_fails() {
        let mut store = MockRecipeStore::new();
        store.expect_get().returning(|_| Ok(recipe()));

        let svc = RecipeService::new(Box::new(store));
        let err = svc
            .render("rails-api", &RenderContext::new("shop"))
            .unwrap_err();

        assert_eq!(
            err,
            KilnError::Domain(DomainError::MissingVariable {
                recipe: "rails-api".into(),
                name: "RUBY_VERSION".into(),
            })
        );
    }

    #[test]
    fn unknown_recipe_propagates() {
        let mut store = MockRecipeStore::new();
        store.expect_get().returning(|name| {
            Err(ApplicationError::RecipeNotFound {
                name: name.to_string(),
            }
            .into())
        });

        let svc = RecipeService::new(Box::new(store));
        assert!(matches!(
            svc.get("nope"),
            Err(KilnError::Application(ApplicationError::RecipeNotFound { .. }))
        ));
    }

    #[test]
    fn summaries_describe_recipes() {
        let mut store = MockRecipeStore::new();
        store.expect_list().returning(|| Ok(vec![recipe()]));

        let svc = RecipeService::new(Box::new(store));
        let info = svc.summaries().unwrap();

        assert_eq!(info.len(), 1);
        assert_eq!(info[0].name, "rails-api");
        assert_eq!(info[0].steps, 1);
        assert_eq!(info[0].required, vec!["RUBY_VERSION".to_string()]);
        assert_eq!(
            info[0].defaults,
            vec![("GEM_SOURCE".to_string(), "https://rubygems.org".to_string())]
        );
    }
}
