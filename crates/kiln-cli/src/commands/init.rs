//! `kiln init`: create a default configuration file.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::{
    cli::{GlobalArgs, InitArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

const HEADER: &str = "\
# Kiln configuration.
# Every value can be overridden with KILN_<SECTION>__<KEY>, for example
# KILN_COMMANDS__TIMEOUT_SECS=600.
# Set [recipes] dir = \"...\" to load *.toml recipes from another directory.

";

const EXAMPLE_RECIPE: &str = r##"# Apply with: kiln apply ./my-project --recipe readme
[recipe]
name        = "readme"
description = "README and git repository for any project"

[vars]
AUTHOR = "me"

[[steps]]
kind    = "write"
path    = "README.md"
content = "# {{PROJECT_NAME}}\n\nMaintained by {{AUTHOR}}.\n"
mode    = "create-if-absent"

[[steps]]
kind     = "inject"
path     = "README.md"
anchor   = "Maintained by"
position = "before"
content  = "Created in {{YEAR}}.\n"

[[steps]]
kind = "run"
argv = ["git", "init", "--quiet"]
"##;

/// Write the default configuration to `--config` or the per-user location.
pub fn execute(
    args: InitArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let config_path = global.config.clone().unwrap_or_else(AppConfig::config_path);

    if config_path.exists() && !args.force {
        return Err(CliError::ConfigExists { path: config_path });
    }

    let body = toml::to_string_pretty(&AppConfig::default()).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise default config: {e}"),
        source: Some(Box::new(e)),
    })?;

    write_with_parents(&config_path, &format!("{HEADER}{body}"))?;
    info!(path = %config_path.display(), "configuration written");
    output.success(&format!("Configuration created at {}", config_path.display()))?;

    if args.with_example {
        let example = config.recipe_dir().join("readme.toml");
        if example.exists() {
            output.warning(&format!("Keeping existing {}", example.display()))?;
        } else {
            write_with_parents(&example, EXAMPLE_RECIPE)?;
            output.success(&format!("Example recipe created at {}", example.display()))?;
        }
    }

    Ok(())
}

fn write_with_parents(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_cli_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    fs::write(path, contents).with_cli_context(|| format!("Failed to write '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_recipe_parses() {
        let recipe =
            kiln_adapters::recipe_loader::parse_recipe(EXAMPLE_RECIPE, Path::new(".")).unwrap();
        assert_eq!(recipe.name, "readme");
        assert_eq!(recipe.pipeline.len(), 3);
    }

    #[test]
    fn default_config_round_trips() {
        let body = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&format!("{HEADER}{body}")).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
