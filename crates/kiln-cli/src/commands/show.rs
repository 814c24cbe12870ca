//! Implementation of the `kiln show` command.

use kiln_core::application::RecipeInfo;

use crate::{
    cli::{OutputFormat, ShowArgs},
    commands::recipe_service,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(serde::Serialize)]
struct RecipeDetail {
    #[serde(flatten)]
    info: RecipeInfo,
    plan: Vec<String>,
}

/// Print a recipe's variables and its steps, unrendered.
pub fn execute(args: ShowArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let recipe = recipe_service(&config)?.get(&args.name)?;
    let plan: Vec<String> = recipe
        .pipeline
        .steps()
        .iter()
        .map(ToString::to_string)
        .collect();

    if output.format() == OutputFormat::Json {
        output.json(&RecipeDetail {
            info: RecipeInfo::from(&recipe),
            plan,
        })?;
        return Ok(());
    }

    output.header(&recipe.name)?;
    if !recipe.description.is_empty() {
        output.print(&format!("  {}", recipe.description))?;
    }
    output.print("")?;

    if !recipe.required.is_empty() {
        output.print(&format!("Required: {}", recipe.required.join(", ")))?;
    }
    for (key, value) in &recipe.defaults {
        output.print(&format!("Default:  {key} = {value}"))?;
    }

    output.print("")?;
    output.print("Steps:")?;
    for (i, step) in plan.iter().enumerate() {
        output.print(&format!("  {:>3}. {step}", i + 1))?;
    }

    Ok(())
}
