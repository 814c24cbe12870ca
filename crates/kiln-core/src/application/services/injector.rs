//! Anchor Injector - splices content into an existing file.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::{
    application::{ApplicationError, ports::Filesystem, services::containment::contained_target},
    domain::{DomainError, InjectionSpec, StepOutcome, splice},
    error::{KilnError, KilnResult},
};

/// Reads a file, splices content next to an anchor line, writes it back.
///
/// The file is re-read on every call, never cached, so each injection sees
/// the effects of every earlier step.
pub struct Injector<'a> {
    filesystem: &'a dyn Filesystem,
    root: &'a Path,
}

impl<'a> Injector<'a> {
    pub fn new(filesystem: &'a dyn Filesystem, root: &'a Path) -> Self {
        Self { filesystem, root }
    }

    /// Perform an [`InjectionSpec`].
    ///
    /// On any error the file is left exactly as it was. Injection is not
    /// idempotent: running the same spec twice inserts the content twice.
    #[instrument(skip_all, fields(path = %spec.path, anchor = %spec.anchor, position = %spec.position))]
    pub fn inject(&self, spec: &InjectionSpec) -> KilnResult<StepOutcome> {
        let target = contained_target(self.filesystem, self.root, &spec.path)?;
        if !self.filesystem.is_file(&target) {
            return Err(ApplicationError::FileNotFound { path: target }.into());
        }

        let original = self.filesystem.read_file(&target)?;
        let spliced = splice(
            &original,
            &spec.anchor,
            spec.position,
            &spec.content,
            spec.require_unique,
        )
        .map_err(|e| locate(e, &target))?;

        if spliced.match_count > 1 {
            debug!(
                matches = spliced.match_count,
                used = spliced.anchor_line,
                "anchor matched several lines; using the first"
            );
        }

        self.filesystem.write_file(&target, spliced.text.as_bytes())?;

        info!(path = %spec.path, line = spliced.anchor_line, "injected");
        Ok(StepOutcome::Injected {
            line: spliced.anchor_line,
        })
    }
}

/// Attach the file path to anchor errors from the pure splice.
fn locate(err: DomainError, path: &Path) -> KilnError {
    match err {
        DomainError::AnchorNotFound { anchor } => ApplicationError::AnchorNotFound {
            path: path.to_path_buf(),
            anchor,
        }
        .into(),
        DomainError::AmbiguousAnchor { anchor, lines } => ApplicationError::AmbiguousAnchor {
            path: path.to_path_buf(),
            anchor,
            lines,
        }
        .into(),
        other => other.into(),
    }
}
