//! Implementation of the `kiln list` command.

use crate::{
    cli::{ListArgs, ListFormat, OutputFormat},
    commands::recipe_service,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let recipes = recipe_service(&config)?.summaries()?;

    let format = if output.format() == OutputFormat::Json {
        ListFormat::Json
    } else {
        args.format
    };

    match format {
        ListFormat::Table => {
            output.header("Available Recipes:")?;
            let width = recipes.iter().map(|r| r.name.len()).max().unwrap_or(0);
            for recipe in &recipes {
                output.print(&format!(
                    "  {:<width$}  {:>3} steps  {}",
                    recipe.name,
                    recipe.steps,
                    output.dim(&recipe.description),
                ))?;
            }
        }

        ListFormat::List => {
            for recipe in &recipes {
                output.print(&recipe.name)?;
            }
        }

        ListFormat::Json => output.json(&recipes)?,
    }

    Ok(())
}
