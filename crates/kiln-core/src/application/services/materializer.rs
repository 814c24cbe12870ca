//! Template Materializer - writes rendered content to disk.

use std::path::Path;

use tracing::{info, instrument};

use crate::{
    application::{ApplicationError, ports::Filesystem, services::containment::contained_target},
    domain::{RelativePath, StepOutcome, TemplateAction, WriteMode},
    error::KilnResult,
};

/// Writes files under a project root according to a [`WriteMode`].
pub struct Materializer<'a> {
    filesystem: &'a dyn Filesystem,
    root: &'a Path,
}

impl<'a> Materializer<'a> {
    pub fn new(filesystem: &'a dyn Filesystem, root: &'a Path) -> Self {
        Self { filesystem, root }
    }

    /// Validate `path` and write `content` to it.
    ///
    /// A root-escaping path fails before anything is touched.
    pub fn materialize(
        &self,
        path: impl AsRef<Path>,
        content: impl AsRef<[u8]>,
        mode: WriteMode,
    ) -> KilnResult<StepOutcome> {
        let path = RelativePath::try_new(path)?;
        self.write(&path, content.as_ref(), mode)
    }

    /// Perform a [`TemplateAction`].
    pub fn apply(&self, action: &TemplateAction) -> KilnResult<StepOutcome> {
        self.write(&action.path, action.content.as_bytes(), action.mode)
    }

    /// Write `content` verbatim to `path` according to `mode`.
    ///
    /// The target is checked against the root after following links, so a
    /// link inside the project cannot redirect the write. Emits one
    /// `{path, mode, outcome}` log record per call.
    #[instrument(skip_all, fields(path = %path, mode = %mode, bytes = content.len()))]
    pub fn write(
        &self,
        path: &RelativePath,
        content: &[u8],
        mode: WriteMode,
    ) -> KilnResult<StepOutcome> {
        let target = contained_target(self.filesystem, self.root, path)?;
        let existed = self.filesystem.exists(&target);

        let outcome = match (mode, existed) {
            (WriteMode::Create, true) => {
                return Err(ApplicationError::AlreadyExists { path: target }.into());
            }
            (WriteMode::CreateIfAbsent, true) => StepOutcome::Skipped,
            (_, existed) => {
                if let Some(parent) = target.parent() {
                    self.filesystem.create_dir_all(parent)?;
                }
                self.filesystem.write_file(&target, content)?;
                if existed {
                    StepOutcome::Overwritten
                } else {
                    StepOutcome::Created
                }
            }
        };

        info!(
            path = %path,
            mode = %mode,
            outcome = %outcome,
            "materialized"
        );
        Ok(outcome)
    }
}
