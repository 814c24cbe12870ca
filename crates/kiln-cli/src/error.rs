//! CLI error handling.
//!
//! Provides structured errors with:
//! - User-friendly messages
//! - Actionable suggestions
//! - Exit code mapping

use std::error::Error;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use kiln_core::error::{ErrorCategory as CoreCategory, KilnError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input that clap could not catch.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A required variable was neither passed nor discoverable.
    #[error("Recipe '{recipe}' needs {}", .names.join(", "))]
    MissingVariables { recipe: String, names: Vec<String> },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error propagated from `kiln-core` or an adapter.
    #[error(transparent)]
    Core(#[from] KilnError),

    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration already exists at {path}")]
    ConfigExists { path: PathBuf },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

impl CliError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { message } => vec![
                format!("Check your input: {message}"),
                "Use --help for usage information".into(),
            ],

            Self::MissingVariables { recipe, names } => {
                let mut s: Vec<String> = names
                    .iter()
                    .map(|n| format!("Pass it explicitly: kiln apply --recipe {recipe} --var {n}=..."))
                    .collect();
                s.push(format!("See what the recipe expects: kiln show {recipe}"));
                s
            }

            Self::ConfigError { message, .. } => vec![
                format!("Configuration issue: {message}"),
                "Print the active file with 'kiln config path'".into(),
                "Recreate it with 'kiln init --force'".into(),
            ],

            Self::Core(core_err) => core_err.suggestions(),

            Self::IoError { message, .. } => vec![
                format!("I/O operation failed: {message}"),
                "Check file permissions".into(),
            ],

            Self::Cancelled => vec!["No steps were run".into()],

            Self::ConfigExists { .. } => vec!["Use --force to overwrite it".into()],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. }
            | Self::MissingVariables { .. }
            | Self::Cancelled
            | Self::ConfigExists { .. } => ErrorCategory::UserError,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Core(core) => match core.category() {
                CoreCategory::Validation => ErrorCategory::UserError,
                CoreCategory::NotFound => ErrorCategory::NotFound,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::External | CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::IoError { .. } => ErrorCategory::Internal,
        }
    }

    /// Exit code to pass to the OS.
    ///
    /// | Category      | Code |
    /// |---------------|------|
    /// | User error    |  2   |
    /// | Not found     |  3   |
    /// | Configuration |  4   |
    /// | Internal      |  1   |
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::UserError => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Configuration => 4,
            ErrorCategory::Internal => 1,
        }
    }

    /// The failed step, when the error came out of a pipeline run.
    fn failed_step(&self) -> Option<(usize, &str, &KilnError)> {
        match self {
            Self::Core(KilnError::StepFailed {
                index,
                description,
                source,
            }) => Some((*index, description.as_str(), source.as_ref())),
            _ => None,
        }
    }

    /// Lines describing the failure, headline first.
    fn headline(&self) -> Vec<String> {
        match self.failed_step() {
            Some((index, description, cause)) => vec![
                format!("Step {index} failed: {description}"),
                format!("{cause}"),
            ],
            None => vec![self.to_string()],
        }
    }

    /// Command stderr carried by the error, if any.
    fn captured_stderr(&self) -> Option<&str> {
        let Self::Core(core) = self else {
            return None;
        };
        match core.root() {
            KilnError::Application(kiln_core::application::ApplicationError::CommandFailed {
                stderr_snippet,
                ..
            }) if !stderr_snippet.is_empty() => Some(stderr_snippet.as_str()),
            _ => None,
        }
    }

    fn cause_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut source = self.source();
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }

    /// Format the error for display with colors and suggestions.
    pub fn format_colored(&self, verbose: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\n{} {}\n\n",
            "\u{2717}".red().bold(),
            "Error:".red().bold()
        ));

        let mut lines = self.headline().into_iter();
        if let Some(first) = lines.next() {
            output.push_str(&format!("  {}\n", first.red()));
        }
        for line in lines {
            output.push_str(&format!("  {}\n", line));
        }

        if let Some(stderr) = self.captured_stderr() {
            output.push_str(&format!("\n{}\n", "Command output:".dimmed()));
            for line in stderr.lines() {
                output.push_str(&format!("  {}\n", line.dimmed()));
            }
        }

        if verbose {
            for cause in self.cause_chain() {
                output.push_str(&format!("\n  {} {}\n", "\u{2192}".dimmed(), cause.dimmed()));
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str(&format!("\n{}\n", "Suggestions:".yellow().bold()));
            for suggestion in suggestions {
                output.push_str(&format!("  {}\n", suggestion));
            }
        }

        if !verbose {
            output.push('\n');
            output.push_str(&format!(
                "{} {}\n",
                "\u{2139}".blue(),
                "Use -v / --verbose for more details.".dimmed(),
            ));
        }

        output
    }

    /// Plain-text version of [`Self::format_colored`] without ANSI codes.
    pub fn format_plain(&self, verbose: bool) -> String {
        let mut out = String::from("\n");
        let mut lines = self.headline().into_iter();
        if let Some(first) = lines.next() {
            out.push_str(&format!("Error: {first}\n"));
        }
        for line in lines {
            out.push_str(&format!("  {line}\n"));
        }

        if let Some(stderr) = self.captured_stderr() {
            out.push_str("\nCommand output:\n");
            for line in stderr.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }

        if verbose {
            for cause in self.cause_chain() {
                out.push_str(&format!("  Caused by: {cause}\n"));
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for s in &suggestions {
                out.push_str(&format!("  {s}\n"));
            }
        }

        if !verbose {
            out.push_str("\nUse -v / --verbose for more details.\n");
        }

        out
    }

    /// Machine-readable form used with `--output-format json`.
    pub fn to_json(&self) -> serde_json::Value {
        let step = self.failed_step().map(|(index, description, _)| {
            serde_json::json!({ "index": index, "description": description })
        });
        serde_json::json!({
            "error": self.to_string(),
            "exit_code": self.exit_code(),
            "step": step,
            "stderr": self.captured_stderr(),
            "suggestions": self.suggestions(),
        })
    }

    /// Log the error using tracing.
    pub fn log(&self) {
        match self.category() {
            ErrorCategory::UserError => tracing::warn!("User error: {}", self),
            ErrorCategory::NotFound => tracing::warn!("Not found: {}", self),
            ErrorCategory::Configuration => tracing::error!("Configuration error: {}", self),
            ErrorCategory::Internal => tracing::error!("Internal error: {}", self),
        }

        if let Some(source) = self.source() {
            tracing::debug!("Caused by: {}", source);
        }
    }
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UserError,
    NotFound,
    Configuration,
    Internal,
}

// ── IntoCli trait ─────────────────────────────────────────────────────────────

/// Attach a context message when converting I/O errors into [`CliError`].
pub trait IntoCli<T> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for Result<T, std::io::Error> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CliError::IoError {
            message: f().into(),
            source: e,
        })
    }
}
