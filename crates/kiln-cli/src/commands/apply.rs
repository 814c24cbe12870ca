//! Implementation of the `kiln apply` command.
//!
//! Responsibility: pick the recipe, build the render context, wire the real
//! adapters into a `PipelineRunner`, and display the report. No scaffolding
//! logic lives here.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, instrument};

use kiln_adapters::{
    HttpFetcher, LocalFilesystem, ProcessRunner, process::probe, recipe_loader,
};
use kiln_core::{
    application::{ApplicationError, PipelineRunner, StepEvent, ports::CommandRunner},
    domain::{Recipe, RenderContext, RunReport, StepOutcome},
};

use crate::{
    cli::{ApplyArgs, GlobalArgs, OutputFormat},
    commands::recipe_service,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Variable filled from `ruby -v` when a recipe requires it.
const RUBY_VERSION: &str = "RUBY_VERSION";

/// Execute the `kiln apply` command.
///
/// 1. Resolve the recipe (by name, or from `--file`)
/// 2. Build the render context from the project name, `--var`s and probes
/// 3. Render; a dry run tolerates unresolved variables
/// 4. Confirm unless `--yes`, `--dry-run` or non-interactive
/// 5. Run the pipeline and print the report
#[instrument(skip_all, fields(root = %args.root.display()))]
pub fn execute(
    args: ApplyArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let recipe = resolve_recipe(&args, &config)?;
    let project = project_name(&args)?;
    debug!(recipe = %recipe.name, project = %project, "recipe resolved");

    let runner = ProcessRunner::with_keep_env(config.commands.keep_env.iter().cloned());

    let mut ctx = RenderContext::new(&project);
    for (key, value) in &args.vars {
        ctx = ctx.with_variable(key, value);
    }
    if !args.dry_run {
        ctx = probe_missing(&recipe, ctx, &runner, &args.root);
    }

    let missing = recipe.missing_variables(&ctx);
    let pipeline = if args.dry_run {
        recipe.render_partial(&ctx)
    } else if !missing.is_empty() {
        return Err(CliError::MissingVariables {
            recipe: recipe.name.clone(),
            names: missing,
        });
    } else {
        recipe.render(&ctx).map_err(kiln_core::error::KilnError::from)?
    };

    if output.format() != OutputFormat::Json {
        show_plan(&output, &recipe, &project, &args.root, args.dry_run)?;
        if args.dry_run && !missing.is_empty() {
            output.warning(&format!("Unresolved variables: {}", missing.join(", ")))?;
        }
    }

    if !args.dry_run && !args.yes && output.is_interactive() && !confirm(&recipe.name)? {
        return Err(CliError::Cancelled);
    }

    let fetcher = HttpFetcher::new(config.network_timeout(), &config.network.user_agent)?;
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.command_timeout());

    let pipeline_runner = PipelineRunner::new(
        Box::new(LocalFilesystem::new()),
        Box::new(fetcher),
        Box::new(runner),
    )
    .dry_run(args.dry_run)
    .command_timeout(timeout);

    info!(recipe = %recipe.name, steps = pipeline.len(), dry_run = args.dry_run, "apply started");
    let started_at = Local::now();
    let progress = output.progress(pipeline.len());

    let result = pipeline_runner.execute_with(&args.root, &pipeline, &mut |event| {
        let Some(bar) = &progress else {
            return;
        };
        match event {
            StepEvent::Started { step, .. } => bar.set_message(step.to_string()),
            StepEvent::Finished(_) => bar.inc(1),
        }
    });

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }
    let report = result?;
    info!(recipe = %recipe.name, steps = report.steps.len(), "apply finished");

    let summary = ApplySummary {
        recipe: &recipe.name,
        project: &project,
        root: &args.root,
        started_at,
        finished_at: Local::now(),
        report: &report,
    };
    print_report(&output, &global, &summary)
}

// ── Recipe and context resolution ─────────────────────────────────────────────

fn resolve_recipe(args: &ApplyArgs, config: &AppConfig) -> CliResult<Recipe> {
    if let Some(file) = &args.file {
        if !file.is_file() {
            let missing = ApplicationError::FileNotFound { path: file.clone() };
            return Err(CliError::Core(missing.into()));
        }
        return Ok(recipe_loader::load_file(file)?);
    }

    let name = args.recipe.as_deref().ok_or_else(|| CliError::InvalidInput {
        message: "either --recipe or --file is required".into(),
    })?;
    Ok(recipe_service(config)?.get(name)?)
}

/// `--name`, or the last component of the absolute root.
fn project_name(args: &ApplyArgs) -> CliResult<String> {
    if let Some(name) = &args.name {
        return Ok(name.clone());
    }

    let absolute = if args.root.exists() {
        args.root.canonicalize()?
    } else {
        std::env::current_dir()?.join(&args.root)
    };

    absolute
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| CliError::InvalidInput {
            message: format!(
                "cannot derive a project name from '{}'; pass --name",
                args.root.display()
            ),
        })
}

/// Fill required variables that can be discovered from the machine.
fn probe_missing(
    recipe: &Recipe,
    ctx: RenderContext,
    runner: &dyn CommandRunner,
    root: &Path,
) -> RenderContext {
    let resolved = recipe.context(ctx.clone());
    if !recipe.needs(RUBY_VERSION) || resolved.contains(RUBY_VERSION) {
        return ctx;
    }

    let cwd = if root.is_dir() { root } else { Path::new(".") };
    match probe::ruby_version(runner, cwd) {
        Some(version) => {
            info!(%version, "detected ruby");
            ctx.with_variable(RUBY_VERSION, version)
        }
        None => ctx,
    }
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn show_plan(
    out: &OutputManager,
    recipe: &Recipe,
    project: &str,
    root: &Path,
    dry_run: bool,
) -> CliResult<()> {
    let title = if dry_run {
        format!("Dry run: {}", recipe.name)
    } else {
        format!("Applying {}", recipe.name)
    };
    out.header(&title)?;
    out.print(&format!("  Project:  {project}"))?;
    out.print(&format!("  Location: {}", root.display()))?;
    out.print(&format!("  Steps:    {}", recipe.pipeline.len()))?;
    out.print("")?;
    Ok(())
}

#[cfg(feature = "interactive")]
fn confirm(recipe: &str) -> CliResult<bool> {
    dialoguer::Confirm::new()
        .with_prompt(format!("Apply {recipe}?"))
        .default(true)
        .interact()
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation".into(),
            source: std::io::Error::other(e),
        })
}

#[cfg(not(feature = "interactive"))]
fn confirm(recipe: &str) -> CliResult<bool> {
    use std::io::{self, Write};

    eprint!("Apply {recipe}? [Y/n] ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

#[derive(Debug, Serialize)]
struct ApplySummary<'a> {
    recipe: &'a str,
    project: &'a str,
    root: &'a Path,
    started_at: DateTime<Local>,
    finished_at: DateTime<Local>,
    report: &'a RunReport,
}

fn print_report(out: &OutputManager, global: &GlobalArgs, summary: &ApplySummary<'_>) -> CliResult<()> {
    if out.format() == OutputFormat::Json {
        out.json(summary)?;
        return Ok(());
    }

    let report = summary.report;
    for record in &report.steps {
        out.print(&format!(
            "  {:>3}. {}  {}",
            record.index,
            record.description,
            out.dim(&format!("[{}]", record.outcome))
        ))?;
    }
    out.print("")?;

    if report.dry_run {
        out.info(&format!(
            "{} steps planned; nothing was changed",
            report.steps.len()
        ))?;
        return Ok(());
    }

    let written = report.count(|o| {
        matches!(
            o,
            StepOutcome::Created | StepOutcome::Overwritten | StepOutcome::Skipped
        )
    });
    let injected = report.count(|o| matches!(o, StepOutcome::Injected { .. }));
    let fetched = report.count(|o| matches!(o, StepOutcome::Fetched { .. }));
    let ran = report.count(|o| matches!(o, StepOutcome::Ran { .. }));

    out.success(&format!(
        "Applied {} to {} ({written} files, {injected} injections, {fetched} downloads, {ran} commands)",
        summary.recipe,
        summary.root.display(),
    ))?;

    if global.verbose > 0 {
        let elapsed = summary.finished_at - summary.started_at;
        out.print(&out.dim(&format!("  took {} ms", elapsed.num_milliseconds())))?;
    }
    Ok(())
}
