//! Command handlers, one module per subcommand.

use tracing::{debug, warn};

use kiln_adapters::{InMemoryRecipeStore, RecipeLoader};
use kiln_core::application::RecipeService;

use crate::{config::AppConfig, error::CliResult};

pub mod apply;
pub mod completions;
pub mod config;
pub mod init;
pub mod list;
pub mod show;

/// Built-in recipes plus everything under the configured recipes directory.
///
/// A missing directory is not an error; an unreadable recipe file inside it
/// is skipped by the loader.
pub(crate) fn recipe_service(config: &AppConfig) -> CliResult<RecipeService> {
    let store = InMemoryRecipeStore::with_builtin()?;

    let dir = config.recipe_dir();
    if dir.is_dir() {
        let loaded = store.load_from(&RecipeLoader::new(&dir))?;
        debug!(dir = %dir.display(), loaded, "loaded user recipes");
    } else if config.recipes.dir.is_some() {
        warn!(dir = %dir.display(), "configured recipes directory does not exist");
    }

    Ok(RecipeService::new(Box::new(store)))
}
