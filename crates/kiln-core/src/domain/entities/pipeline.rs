//! Pipelines and recipes.
//!
//! A [`Pipeline`] is the scaffold run as data: an ordered list of steps the
//! interpreter executes top to bottom. A [`Recipe`] is a named, parameterised
//! pipeline whose content still contains `{{VAR}}` placeholders.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{
    Anchor, CommandSpec, DomainError, FetchSpec, InjectionSpec, Position, RelativePath,
    RenderContext, Step, TemplateAction, WriteMode,
};

// ============================================================================
// Pipeline
// ============================================================================

/// Ordered scaffold steps.
///
/// The builder methods validate their arguments, so a constructed pipeline
/// only ever holds well-formed steps:
///
/// ```rust
/// use kiln_core::domain::{Pipeline, WriteMode};
///
/// let pipeline = Pipeline::new()
///     .write(".gitignore", "/tmp/*\n", WriteMode::Overwrite)?
///     .inject_after("config/application.rb", "< Rails::Application", "  config.x = 1\n")?
///     .run(["bundle", "install"])?;
/// assert_eq!(pipeline.len(), 3);
/// # Ok::<(), kiln_core::domain::DomainError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn write(
        self,
        path: impl AsRef<Path>,
        content: impl Into<String>,
        mode: WriteMode,
    ) -> Result<Self, DomainError> {
        let path = RelativePath::try_new(path)?;
        Ok(self.push(Step::WriteFile(TemplateAction::new(path, content, mode))))
    }

    pub fn inject(
        self,
        path: impl AsRef<Path>,
        anchor: impl Into<String>,
        position: Position,
        content: impl Into<String>,
        require_unique: bool,
    ) -> Result<Self, DomainError> {
        let mut spec = InjectionSpec::new(
            RelativePath::try_new(path)?,
            Anchor::try_new(anchor)?,
            position,
            content,
        )?;
        spec.require_unique = require_unique;
        Ok(self.push(Step::Inject(spec)))
    }

    /// Inject after the first line containing `anchor`.
    pub fn inject_after(
        self,
        path: impl AsRef<Path>,
        anchor: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        self.inject(path, anchor, Position::After, content, false)
    }

    pub fn fetch(self, url: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let spec = FetchSpec::new(url, RelativePath::try_new(path)?)?;
        Ok(self.push(Step::Fetch(spec)))
    }

    pub fn run<I, S>(self, argv: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.command(CommandSpec::new(argv)?))
    }

    pub fn command(self, spec: CommandSpec) -> Self {
        self.push(Step::RunCommand(spec))
    }

    /// Render every step against `ctx`.
    pub fn render(&self, ctx: &RenderContext) -> Self {
        Self {
            steps: self.steps.iter().map(|s| s.render(ctx)).collect(),
        }
    }
}

impl IntoIterator for Pipeline {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

// ============================================================================
// Recipe
// ============================================================================

/// A named, parameterised pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    /// Values used when the caller does not supply the variable.
    pub defaults: BTreeMap<String, String>,
    /// Variables that must be resolved before the recipe can run.
    pub required: Vec<String>,
    pub pipeline: Pipeline,
}

impl Recipe {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        pipeline: Pipeline,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidRecipe("recipe name is empty".into()));
        }
        if pipeline.is_empty() {
            return Err(DomainError::InvalidRecipe(format!(
                "recipe '{name}' has no steps"
            )));
        }
        Ok(Self {
            name,
            description: description.into(),
            defaults: BTreeMap::new(),
            required: Vec::new(),
            pipeline,
        })
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn requires(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.required.contains(&key) {
            self.required.push(key);
        }
        self
    }

    pub fn needs(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key)
    }

    /// Layer this recipe's defaults under the caller's variables.
    pub fn context(&self, ctx: RenderContext) -> RenderContext {
        self.defaults
            .iter()
            .fold(ctx, |ctx, (k, v)| ctx.with_default(k.clone(), v.clone()))
    }

    /// Required variables not resolved by `ctx` (defaults included).
    pub fn missing_variables(&self, ctx: &RenderContext) -> Vec<String> {
        let ctx = self.context(ctx.clone());
        self.required
            .iter()
            .filter(|k| !ctx.contains(k))
            .cloned()
            .collect()
    }

    /// Render into an executable pipeline, failing on the first missing
    /// required variable.
    pub fn render(&self, ctx: &RenderContext) -> Result<Pipeline, DomainError> {
        if let Some(name) = self.missing_variables(ctx).into_iter().next() {
            return Err(DomainError::MissingVariable {
                recipe: self.name.clone(),
                name,
            });
        }
        Ok(self.render_partial(ctx))
    }

    /// Render without the required-variable check; unresolved placeholders
    /// stay visible. Used for previews.
    pub fn render_partial(&self, ctx: &RenderContext) -> Pipeline {
        self.pipeline.render(&self.context(ctx.clone()))
    }
}
