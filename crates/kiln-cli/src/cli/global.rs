//! Flags shared by every `kiln` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Global arguments, flattened into [`super::Cli`].
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Logging verbosity: `-v` info, `-vv` debug, `-vvv` trace.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)",
        long_help = "Increase logging verbosity:
    (none)  - Warnings and errors
    -v      - Step progress
    -vv     - Adapter diagnostics (paths, URLs, argv)
    -vvv    - Everything

Also prints the full cause chain when a step fails."
    )]
    pub verbose: u8,

    /// Only errors reach the terminal.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Honours `NO_COLOR` (<https://no-color.org>).
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        help = "Disable colored output"
    )]
    pub no_color: bool,

    /// Use this file instead of the per-user `config.toml`.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "Configuration file path"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "Output format (json prints machine-readable reports on stdout)"
    )]
    pub output_format: OutputFormat,
}

impl GlobalArgs {
    /// Whether the failure report should include the cause chain.
    pub fn wants_detail(&self) -> bool {
        self.verbose > 0
    }
}

/// How reports and listings are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain when piped.
    #[default]
    Auto,
    /// Colors, symbols and a progress spinner.
    Human,
    /// Plain text without styling.
    Plain,
    /// JSON on stdout.
    Json,
}

impl OutputFormat {
    /// Parse the `output.format` config value; unknown strings mean `Auto`.
    pub fn from_config(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "human" => Self::Human,
            "plain" => Self::Plain,
            "json" => Self::Json,
            _ => Self::Auto,
        }
    }
}
