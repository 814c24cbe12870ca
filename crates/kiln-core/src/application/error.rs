//! Application layer errors.
//!
//! These errors come from side effects (filesystem, network, processes) and
//! from orchestration. Validation failures are `DomainError` from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors raised while performing a step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("I/O error at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// `Create` mode found an existing file.
    #[error("File already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// Injection target is missing.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// No line of the file contains the anchor.
    #[error("Anchor '{anchor}' not found in {path}")]
    AnchorNotFound { path: PathBuf, anchor: String },

    /// More than one line contains the anchor and a unique match was required.
    #[error("Anchor '{anchor}' is ambiguous in {path}: lines {lines:?}")]
    AmbiguousAnchor {
        path: PathBuf,
        anchor: String,
        lines: Vec<usize>,
    },

    /// Connection failure, timeout, or non-2xx status.
    #[error("Network error fetching {url}: {reason}")]
    Network {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// The process could not be started at all.
    #[error("Failed to start `{command}`: {reason}")]
    CommandSpawn { command: String, reason: String },

    /// The process ran and failed.
    #[error("{}", command_failed_message(.command, .exit_code, .timed_out))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr_snippet: String,
        timed_out: bool,
    },

    /// No recipe with the requested name.
    #[error("Recipe not found: {name}")]
    RecipeNotFound { name: String },

    /// A recipe source could not be read or parsed.
    #[error("Failed to load recipe from {source_name}: {reason}")]
    RecipeLoad { source_name: String, reason: String },

    /// Store access failed (lock poisoned).
    #[error("Recipe store error")]
    StoreLockError,
}

fn command_failed_message(command: &str, exit_code: &Option<i32>, timed_out: &bool) -> String {
    match (*timed_out, *exit_code) {
        (true, _) => format!("`{command}` timed out"),
        (false, Some(code)) => format!("`{command}` exited with status {code}"),
        (false, None) => format!("`{command}` was terminated by a signal"),
    }
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Io { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Check available disk space".into(),
            ],
            Self::AlreadyExists { path } => vec![
                format!("{} already exists and the step uses mode 'create'", path.display()),
                "Remove the file, or use mode 'overwrite' / 'create-if-absent'".into(),
            ],
            Self::FileNotFound { path } => vec![
                format!("Expected {} to exist before injecting into it", path.display()),
                "Run kiln against the root of an already generated project".into(),
            ],
            Self::AnchorNotFound { anchor, .. } => vec![
                format!("No line contains '{}'", anchor),
                "The file may come from a different generator version".into(),
            ],
            Self::AmbiguousAnchor { lines, .. } => vec![
                format!("The anchor matched lines {:?}", lines),
                "Use a more specific anchor".into(),
            ],
            Self::Network { status, .. } => {
                let mut s = vec!["Check your network connection and the URL".into()];
                if let Some(code) = status {
                    s.push(format!("The server answered HTTP {code}"));
                }
                s.push("Re-run the whole recipe once the problem is fixed".into());
                s
            }
            Self::CommandSpawn { command, .. } => vec![
                format!("Could not start `{}`", command),
                "Ensure the command is installed and in your PATH".into(),
            ],
            Self::CommandFailed {
                stderr_snippet,
                timed_out,
                ..
            } => {
                let mut s = Vec::new();
                if *timed_out {
                    s.push("Increase commands.timeout_secs in the config file".into());
                }
                if !stderr_snippet.is_empty() {
                    s.push("Command stderr:".into());
                    s.extend(stderr_snippet.lines().map(|l| format!("  | {l}")));
                }
                s.push("Fix the environment and re-run the recipe".into());
                s
            }
            Self::RecipeNotFound { .. } => vec![
                "List available recipes: kiln list".into(),
                "Or pass a recipe file with --file".into(),
            ],
            Self::RecipeLoad { .. } => vec!["Check the recipe file syntax".into()],
            Self::StoreLockError => vec!["The recipe store is locked".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AlreadyExists { .. }
            | Self::AnchorNotFound { .. }
            | Self::AmbiguousAnchor { .. }
            | Self::RecipeLoad { .. } => ErrorCategory::Validation,
            Self::FileNotFound { .. } | Self::RecipeNotFound { .. } => ErrorCategory::NotFound,
            Self::Io { .. }
            | Self::Network { .. }
            | Self::CommandSpawn { .. }
            | Self::CommandFailed { .. } => ErrorCategory::External,
            Self::StoreLockError => ErrorCategory::Internal,
        }
    }
}
