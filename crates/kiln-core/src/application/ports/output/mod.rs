//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `kiln-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::domain::{CommandOutput, CommandSpec, Recipe};
use crate::error::KilnResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `kiln_adapters::filesystem::LocalFilesystem` (production)
/// - `kiln_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Paths handed to this port are already resolved against the project root.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> KilnResult<()>;

    /// Write bytes to a file verbatim, replacing it if present.
    fn write_file(&self, path: &Path, content: &[u8]) -> KilnResult<()>;

    /// Read a whole file as UTF-8.
    fn read_file(&self, path: &Path) -> KilnResult<String>;

    /// Resolve symbolic links in `path`.
    ///
    /// The longest existing prefix is resolved and the missing tail is
    /// appended unchanged, so the result names where a write would land.
    /// Filesystems without links return the path as given.
    fn real_path(&self, path: &Path) -> KilnResult<PathBuf> {
        Ok(path.to_path_buf())
    }

    /// Check if path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is an existing regular file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Port for downloading remote template files.
///
/// Implemented by `kiln_adapters::fetcher::HttpFetcher`.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the raw body. Non-2xx statuses are errors.
    fn fetch(&self, url: &str) -> KilnResult<Vec<u8>>;
}

/// Port for running external processes.
///
/// Implemented by `kiln_adapters::process::ProcessRunner`.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` in `cwd` and report how it ended.
    ///
    /// A non-zero exit is **not** an error at this level; only a failure to
    /// start or wait for the process is.
    fn run(&self, spec: &CommandSpec, cwd: &Path) -> KilnResult<CommandOutput>;
}

/// Port for recipe storage and retrieval.
///
/// Implemented by `kiln_adapters::recipe_store::InMemoryRecipeStore`.
#[cfg_attr(test, mockall::automock)]
pub trait RecipeStore: Send + Sync {
    /// Get a recipe by name.
    fn get(&self, name: &str) -> KilnResult<Recipe>;

    /// List all recipes, sorted by name.
    fn list(&self) -> KilnResult<Vec<Recipe>>;

    /// Insert or replace a recipe.
    fn insert(&self, recipe: Recipe) -> KilnResult<()>;
}
