//! Local filesystem adapter using std::fs.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use kiln_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{KilnError, KilnResult},
};

/// Links followed before giving up, matching the usual `ELOOP` limit.
const MAX_LINK_DEPTH: u8 = 40;

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> KilnResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> KilnResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_file(&self, path: &Path) -> KilnResult<String> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApplicationError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into(),
            _ => map_io_error(path, e, "read file"),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn real_path(&self, path: &Path) -> KilnResult<PathBuf> {
        resolve_links(path, MAX_LINK_DEPTH).map_err(|e| map_io_error(path, e, "resolve path"))
    }
}

/// Canonicalise the longest existing prefix of `path` and re-append the rest.
///
/// A dangling link is followed by hand, since `canonicalize` refuses it but
/// a write through it would still create the link's target.
fn resolve_links(path: &Path, depth: u8) -> io::Result<PathBuf> {
    let mut missing: Vec<OsString> = Vec::new();
    let mut existing = path;

    loop {
        match std::fs::symlink_metadata(existing) {
            Ok(meta) => {
                let base = match std::fs::canonicalize(existing) {
                    Ok(base) => base,
                    Err(e) if e.kind() == io::ErrorKind::NotFound && meta.file_type().is_symlink() => {
                        if depth == 0 {
                            return Err(io::Error::other("too many levels of symbolic links"));
                        }
                        let target = std::fs::read_link(existing)?;
                        let target = match existing.parent() {
                            Some(parent) if target.is_relative() => parent.join(target),
                            _ => target,
                        };
                        resolve_links(&target, depth - 1)?
                    }
                    Err(e) => return Err(e),
                };
                return Ok(missing.iter().rev().fold(base, |acc, part| acc.join(part)));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Ok(path.to_path_buf()),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> KilnError {
    ApplicationError::Io {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
