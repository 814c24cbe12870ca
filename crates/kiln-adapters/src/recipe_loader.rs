//! Filesystem-based recipe loader.
//!
//! Parses `*.toml` recipe manifests into domain [`Recipe`] objects.
//!
//! # Recipe file format
//!
//! ```toml
//! [recipe]
//! name        = "node-lib"            # unique identifier (required)
//! description = "TypeScript library"  # optional
//! required    = ["AUTHOR"]            # variables the caller must supply
//!
//! [vars]                              # defaults, overridable with --var
//! LICENSE = "MIT"
//!
//! [[steps]]
//! kind    = "write"
//! path    = "README.md"
//! content = "# {{PROJECT_NAME}}\n"
//! mode    = "create-if-absent"        # create | create-if-absent | overwrite
//!
//! [[steps]]
//! kind   = "write"
//! path   = "LICENSE"
//! source = "files/LICENSE"            # read next to the manifest instead of `content`
//!
//! [[steps]]
//! kind     = "inject"
//! path     = "package.json"
//! anchor   = "\"scripts\": {"
//! position = "after"                  # after | before
//! content  = "    \"build\": \"tsc\",\n"
//! unique   = true                     # fail if the anchor matches several lines
//!
//! [[steps]]
//! kind = "fetch"
//! url  = "https://example.com/.editorconfig"
//! path = ".editorconfig"
//!
//! [[steps]]
//! kind         = "run"
//! argv         = ["npm", "install"]
//! dir          = "client"             # relative to the project root
//! env          = { NODE_ENV = "development" }
//! clean_env    = false
//! timeout_secs = 600
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use kiln_core::{
    application::ApplicationError,
    domain::{
        Anchor, CommandSpec, FetchSpec, InjectionSpec, Pipeline, Position, Recipe, RelativePath,
        Step, TemplateAction, WriteMode,
    },
    error::{KilnError, KilnResult},
};

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a recipe file.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RecipeManifest {
    pub recipe: RecipeSection,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
}

/// `[recipe]` section.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RecipeSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: Vec<String>,
}

/// One `[[steps]]` entry, tagged by `kind`.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepEntry {
    Write {
        path: String,
        content: Option<String>,
        source: Option<String>,
        #[serde(default)]
        mode: WriteMode,
    },
    Inject {
        path: String,
        anchor: String,
        #[serde(default)]
        position: Position,
        content: String,
        #[serde(default)]
        unique: bool,
    },
    Fetch {
        url: String,
        path: String,
    },
    Run {
        argv: Vec<String>,
        dir: Option<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
        #[serde(default)]
        clean_env: bool,
        timeout_secs: Option<u64>,
    },
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads recipes from a single file or a directory tree of `*.toml` files.
pub struct RecipeLoader {
    path: PathBuf,
}

impl RecipeLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load every recipe reachable from the configured path.
    ///
    /// A file path must parse; one bad file in a directory is skipped with a
    /// `WARN` log rather than failing the whole batch.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load_all(&self) -> KilnResult<Vec<Recipe>> {
        if self.path.is_file() {
            return Ok(vec![load_file(&self.path)?]);
        }
        if !self.path.is_dir() {
            return Err(load_error(&self.path, "no such file or directory"));
        }

        let mut recipes = Vec::new();
        for entry in WalkDir::new(&self.path).sort_by_file_name() {
            let entry = entry.map_err(|e| load_error(&self.path, e))?;
            let path = entry.path();
            let is_toml = path.extension().is_some_and(|ext| ext == "toml");
            if !entry.file_type().is_file() || !is_toml {
                continue;
            }

            match load_file(path) {
                Ok(recipe) => {
                    debug!(name = %recipe.name, file = %path.display(), "loaded recipe");
                    recipes.push(recipe);
                }
                Err(e) => {
                    // One bad recipe must not block all others.
                    warn!(file = %path.display(), error = %e, "skipping recipe file");
                }
            }
        }

        debug!(count = recipes.len(), "finished loading recipes");
        Ok(recipes)
    }
}

/// Parse one recipe file.
pub fn load_file(path: &Path) -> KilnResult<Recipe> {
    let raw = fs::read_to_string(path).map_err(|e| load_error(path, e))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_recipe(&raw, base).map_err(|e| load_error(path, e))
}

/// Parse recipe TOML. `source` entries are resolved against `base`.
pub fn parse_recipe(raw: &str, base: &Path) -> Result<Recipe, String> {
    let manifest: RecipeManifest = toml::from_str(raw).map_err(|e| e.to_string())?;

    let steps = manifest
        .steps
        .into_iter()
        .enumerate()
        .map(|(i, entry)| build_step(entry, base).map_err(|e| format!("step {}: {e}", i + 1)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut recipe = Recipe::new(
        manifest.recipe.name,
        manifest.recipe.description,
        Pipeline::from_steps(steps),
    )
    .map_err(|e| e.to_string())?;

    for (key, value) in manifest.vars {
        recipe = recipe.with_default(key, value);
    }
    for key in manifest.recipe.required {
        recipe = recipe.requires(key);
    }
    Ok(recipe)
}

fn build_step(entry: StepEntry, base: &Path) -> Result<Step, String> {
    let rel = |p: &str| RelativePath::try_new(p).map_err(|e| e.to_string());

    let step = match entry {
        StepEntry::Write {
            path,
            content,
            source,
            mode,
        } => {
            let content = match (content, source) {
                (Some(content), None) => content,
                (None, Some(source)) => {
                    let file = base.join(rel(&source)?);
                    fs::read_to_string(&file)
                        .map_err(|e| format!("cannot read '{}': {e}", file.display()))?
                }
                (Some(_), Some(_)) => return Err("set either `content` or `source`, not both".into()),
                (None, None) => return Err("write step needs `content` or `source`".into()),
            };
            Step::WriteFile(TemplateAction::new(rel(&path)?, content, mode))
        }
        StepEntry::Inject {
            path,
            anchor,
            position,
            content,
            unique,
        } => {
            let anchor = Anchor::try_new(anchor).map_err(|e| e.to_string())?;
            let mut spec =
                InjectionSpec::new(rel(&path)?, anchor, position, content).map_err(|e| e.to_string())?;
            spec.require_unique = unique;
            Step::Inject(spec)
        }
        StepEntry::Fetch { url, path } => {
            Step::Fetch(FetchSpec::new(url, rel(&path)?).map_err(|e| e.to_string())?)
        }
        StepEntry::Run {
            argv,
            dir,
            env,
            clean_env,
            timeout_secs,
        } => {
            let mut spec = CommandSpec::new(argv).map_err(|e| e.to_string())?;
            if let Some(dir) = dir {
                spec = spec.in_dir(rel(&dir)?);
            }
            for (key, value) in env {
                spec = spec.with_env(key, value);
            }
            if clean_env {
                spec = spec.clean();
            }
            if let Some(secs) = timeout_secs {
                spec = spec.with_timeout(Duration::from_secs(secs));
            }
            Step::RunCommand(spec)
        }
    };
    Ok(step)
}

fn load_error(path: &Path, reason: impl std::fmt::Display) -> KilnError {
    ApplicationError::RecipeLoad {
        source_name: path.display().to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::domain::StepKind;
    use tempfile::TempDir;

    const FULL: &str = r##"
[recipe]
name = "node-lib"
description = "TypeScript library"
required = ["AUTHOR"]

[vars]
LICENSE = "MIT"

[[steps]]
kind = "write"
path = "README.md"
content = "# {{PROJECT_NAME}}\n"
mode = "create-if-absent"

[[steps]]
kind = "inject"
path = "package.json"
anchor = '"scripts": {'
content = '    "build": "tsc",'
unique = true

[[steps]]
kind = "fetch"
url = "https://example.com/.editorconfig"
path = ".editorconfig"

[[steps]]
kind = "run"
argv = ["npm", "install"]
dir = "client"
env = { NODE_ENV = "development" }
clean_env = true
timeout_secs = 600
"##;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_every_step_kind() {
        let recipe = parse_recipe(FULL, Path::new(".")).unwrap();

        assert_eq!(recipe.name, "node-lib");
        assert!(recipe.needs("AUTHOR"));
        assert_eq!(recipe.defaults.get("LICENSE").map(String::as_str), Some("MIT"));

        let kinds: Vec<_> = recipe.pipeline.steps().iter().map(Step::kind).collect();
        assert_eq!(
            kinds,
            vec![StepKind::Write, StepKind::Inject, StepKind::Fetch, StepKind::Run]
        );

        match &recipe.pipeline.steps()[0] {
            Step::WriteFile(action) => assert_eq!(action.mode, WriteMode::CreateIfAbsent),
            other => panic!("unexpected step: {other:?}"),
        }
        match &recipe.pipeline.steps()[1] {
            Step::Inject(spec) => {
                assert!(spec.require_unique);
                assert_eq!(spec.position, Position::After);
            }
            other => panic!("unexpected step: {other:?}"),
        }
        match &recipe.pipeline.steps()[3] {
            Step::RunCommand(spec) => {
                assert!(spec.clean_env);
                assert_eq!(spec.timeout, Some(Duration::from_secs(600)));
                assert_eq!(spec.env.get("NODE_ENV").map(String::as_str), Some("development"));
                assert_eq!(
                    spec.working_dir.as_ref().map(ToString::to_string).as_deref(),
                    Some("client")
                );
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn traversal_in_path_is_rejected() {
        let raw = r#"
[recipe]
name = "bad"

[[steps]]
kind = "write"
path = "../../etc/passwd"
content = "x"
"#;
        let err = parse_recipe(raw, Path::new(".")).unwrap_err();
        assert!(err.starts_with("step 1:"), "{err}");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let raw = r#"
[recipe]
name = "bad"

[[steps]]
kind = "delete"
path = "x"
"#;
        assert!(parse_recipe(raw, Path::new(".")).is_err());
    }

    #[test]
    fn recipe_without_steps_is_rejected() {
        let raw = "[recipe]\nname = \"empty\"\n";
        assert!(parse_recipe(raw, Path::new(".")).is_err());
    }

    #[test]
    fn source_is_read_next_to_manifest() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "files/LICENSE", "MIT License {{YEAR}}\n");
        let manifest = write(
            temp.path(),
            "lib.toml",
            "[recipe]\nname = \"lib\"\n\n[[steps]]\nkind = \"write\"\npath = \"LICENSE\"\nsource = \"files/LICENSE\"\n",
        );

        let recipe = load_file(&manifest).unwrap();
        match &recipe.pipeline.steps()[0] {
            Step::WriteFile(action) => assert_eq!(action.content, "MIT License {{YEAR}}\n"),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn directory_load_skips_bad_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "good.toml", FULL);
        write(temp.path(), "nested/broken.toml", "[recipe\nname=");
        write(temp.path(), "notes.md", "not a recipe");

        let recipes = RecipeLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "node-lib");
    }

    #[test]
    fn single_bad_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "broken.toml", "[recipe\nname=");

        let err = RecipeLoader::new(&path).load_all().unwrap_err();
        assert!(matches!(
            err,
            KilnError::Application(ApplicationError::RecipeLoad { .. })
        ));
    }

    #[test]
    fn missing_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(RecipeLoader::new(temp.path().join("nope")).load_all().is_err());
    }
}
