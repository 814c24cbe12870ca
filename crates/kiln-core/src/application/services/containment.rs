//! Keep resolved targets inside the project root.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::{
    application::ports::Filesystem,
    domain::{DomainError, RelativePath},
    error::KilnResult,
};

/// Resolve `path` under `root`, following symbolic links.
///
/// [`RelativePath`] already rules out `..` escapes; this catches a link
/// inside the root that points elsewhere. Returns the unresolved target,
/// which is what the filesystem port is given.
pub(crate) fn contained_target(
    filesystem: &dyn Filesystem,
    root: &Path,
    path: &RelativePath,
) -> KilnResult<PathBuf> {
    let target = path.resolve(root);
    let real_root = filesystem.real_path(root)?;
    let real_target = filesystem.real_path(&target)?;

    if !real_target.starts_with(&real_root) {
        warn!(
            path = %path,
            resolved = %real_target.display(),
            "target leaves the project root through a link"
        );
        return Err(DomainError::PathTraversal {
            path: path.to_string(),
        }
        .into());
    }

    Ok(target)
}
