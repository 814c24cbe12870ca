//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name    = "kiln",
    bin_name = "kiln",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Recipe-driven project scaffolding",
    long_about = "Kiln applies recipes to a project directory: it writes files, \
                  injects snippets next to anchor lines, downloads remote files \
                  and runs setup commands, stopping at the first failure.",
    after_help = "EXAMPLES:\n\
        \x20 kiln apply ./shop --recipe rails-api --var RUBY_VERSION=3.3.0\n\
        \x20 kiln apply . --file recipes/service.toml --dry-run\n\
        \x20 kiln list --format json\n\
        \x20 kiln completions bash > /usr/share/bash-completion/completions/kiln",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a recipe to a project directory.
    #[command(
        visible_alias = "a",
        about = "Apply a recipe to a project directory",
        after_help = "EXAMPLES:\n\
            \x20 kiln apply ./shop -r rails-api\n\
            \x20 kiln apply ./shop -r rails-api --var GEM_SOURCE=https://gems.example.com\n\
            \x20 kiln apply . -f my-recipe.toml --dry-run"
    )]
    Apply(ApplyArgs),

    /// List available recipes.
    #[command(
        visible_alias = "ls",
        about = "List available recipes",
        after_help = "EXAMPLES:\n\
            \x20 kiln list\n\
            \x20 kiln list --format json"
    )]
    List(ListArgs),

    /// Print the steps of one recipe.
    #[command(
        about = "Show the steps of a recipe",
        after_help = "EXAMPLES:\n\
            \x20 kiln show rails-api\n\
            \x20 kiln show rails-api --output-format json"
    )]
    Show(ShowArgs),

    /// Write a default configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 kiln init\n\
            \x20 kiln init --force --with-example"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 kiln completions bash > ~/.local/share/bash-completion/completions/kiln\n\
            \x20 kiln completions zsh  > ~/.zfunc/_kiln\n\
            \x20 kiln completions fish > ~/.config/fish/completions/kiln.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the effective configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 kiln config get network.timeout_secs\n\
            \x20 kiln config list\n\
            \x20 kiln config path"
    )]
    Config(ConfigCommands),
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `kiln apply`.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["recipe", "file"]),
))]
pub struct ApplyArgs {
    /// Project root. Created if it does not exist.
    #[arg(value_name = "ROOT", default_value = ".", help = "Project directory")]
    pub root: PathBuf,

    #[arg(
        short = 'r',
        long = "recipe",
        value_name = "NAME",
        help = "Name of a built-in or configured recipe"
    )]
    pub recipe: Option<String>,

    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        help = "Load the recipe from a TOML file"
    )]
    pub file: Option<PathBuf>,

    /// Repeatable. Later values win.
    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        value_parser = parse_var,
        help = "Set a template variable (repeatable)"
    )]
    pub vars: Vec<(String, String)>,

    /// Defaults to the last component of ROOT.
    #[arg(long = "name", value_name = "NAME", help = "Project name")]
    pub name: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECS",
        help = "Timeout for each command step, overriding the configuration"
    )]
    pub timeout: Option<u64>,

    #[arg(long = "dry-run", help = "Show the steps without performing them")]
    pub dry_run: bool,

    #[arg(short = 'y', long = "yes", help = "Skip the confirmation prompt")]
    pub yes: bool,
}

/// Parse `KEY=VALUE`. The key must be non-empty; the value may be.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ── list / show ───────────────────────────────────────────────────────────────

/// Arguments for `kiln list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Names, step counts and descriptions.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

/// Arguments for `kiln show`.
#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(value_name = "NAME", help = "Recipe name")]
    pub name: String,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `kiln init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,

    /// Also create the recipes directory with a commented example recipe.
    #[arg(long = "with-example", help = "Create an example recipe")]
    pub with_example: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `kiln completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `commands.timeout_secs`.
        key: String,
    },
    /// Print the effective configuration as TOML.
    List,
    /// Print the path of the configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
