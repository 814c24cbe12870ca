// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they travel inside step failure reports)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Path Errors
    // ========================================================================
    #[error("Path must not be empty")]
    EmptyPath,

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path escapes the project root: {path}")]
    PathTraversal { path: String },

    // ========================================================================
    // Injection Errors
    // ========================================================================
    #[error("Anchor must not be empty")]
    EmptyAnchor,

    #[error("Invalid anchor {anchor:?}: {reason}")]
    InvalidAnchor { anchor: String, reason: String },

    #[error("Anchor '{anchor}' not found")]
    AnchorNotFound { anchor: String },

    #[error("Anchor '{anchor}' is ambiguous: matched lines {lines:?}")]
    AmbiguousAnchor { anchor: String, lines: Vec<usize> },

    // ========================================================================
    // Step Construction Errors
    // ========================================================================
    #[error("Command must have at least one argument")]
    EmptyCommand,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid step: {0}")]
    InvalidStep(String),

    #[error("Unknown {field} value '{value}'")]
    UnknownVariant { field: &'static str, value: String },

    // ========================================================================
    // Recipe Errors
    // ========================================================================
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("Recipe '{recipe}' requires variable '{name}'")]
    MissingVariable { recipe: String, name: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::PathTraversal { path } | Self::AbsolutePathNotAllowed { path } => vec![
                format!("'{}' would be written outside the project root", path),
                "Use a path relative to the project root without leading '..'".into(),
            ],
            Self::AnchorNotFound { anchor } => vec![
                format!("No line contains '{}'", anchor),
                "Check that the file was generated by the expected tool version".into(),
                "Anchors are matched as literal substrings, not patterns".into(),
            ],
            Self::AmbiguousAnchor { anchor, lines } => vec![
                format!("'{}' appears on {} lines", anchor, lines.len()),
                "Use a longer, more specific anchor".into(),
                "Or allow the first match by disabling `unique`".into(),
            ],
            Self::InvalidAnchor { .. } => vec![
                "Anchors match within a single line; use one line of the target file".into(),
            ],
            Self::MissingVariable { name, .. } => vec![
                format!("Provide it with --var {}=<value>", name),
            ],
            Self::UnknownVariant { field, value } => vec![
                format!("'{}' is not a valid {}", value, field),
                "See `kiln show <recipe>` for working examples".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyPath
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathTraversal { .. }
            | Self::EmptyAnchor
            | Self::InvalidAnchor { .. }
            | Self::EmptyCommand
            | Self::InvalidUrl { .. }
            | Self::InvalidStep(_)
            | Self::UnknownVariant { .. }
            | Self::InvalidRecipe(_)
            | Self::MissingVariable { .. }
            | Self::AnchorNotFound { .. }
            | Self::AmbiguousAnchor { .. } => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_validation() {
        let err = DomainError::PathTraversal {
            path: "../x".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.to_string().contains("../x"));
    }

    #[test]
    fn ambiguous_anchor_lists_lines() {
        let err = DomainError::AmbiguousAnchor {
            anchor: "config".into(),
            lines: vec![2, 7],
        };
        assert!(err.to_string().contains("[2, 7]"));
        assert!(err.suggestions()[0].contains("2 lines"));
    }
}
