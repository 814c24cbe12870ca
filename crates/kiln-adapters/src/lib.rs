//! Infrastructure adapters for Kiln.
//!
//! This crate implements the ports defined in `kiln-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod fetcher;
pub mod filesystem;
pub mod process;
pub mod recipe_loader;
pub mod recipe_store;
pub mod recipes;

// Re-export commonly used adapters
pub use fetcher::HttpFetcher;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use process::ProcessRunner;
pub use recipe_loader::RecipeLoader;
pub use recipe_store::InMemoryRecipeStore;
