//! Unified error handling for Kiln Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for Kiln Core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KilnError {
    /// Validation failures (bad path, bad anchor, missing variable...).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Side-effect failures (I/O, network, processes).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// A pipeline step failed; the run halted here.
    #[error("Step {index} ({description}) failed: {source}")]
    StepFailed {
        index: usize,
        description: String,
        #[source]
        source: Box<KilnError>,
    },

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl KilnError {
    /// Wrap `self` with the step that produced it.
    pub fn at_step(self, index: usize, description: impl Into<String>) -> Self {
        Self::StepFailed {
            index,
            description: description.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping step wrappers.
    pub fn root(&self) -> &KilnError {
        match self {
            Self::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::StepFailed { source, .. } => {
                let mut s = source.suggestions();
                s.push("Earlier steps were applied; the project is partially scaffolded".into());
                s
            }
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec!["This appears to be a bug in Kiln".into()],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
            },
            Self::Application(e) => e.category(),
            Self::StepFailed { source, .. } => source.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    /// Filesystem, network, or subprocess failure.
    External,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type KilnResult<T> = Result<T, KilnError>;
