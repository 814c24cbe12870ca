//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `kiln-adapters` implement these.
//!
//! ## Driven (Output) Ports
//!
//! - `Filesystem`: file reads and writes
//! - `Fetcher`: remote template download
//! - `CommandRunner`: subprocess execution
//! - `RecipeStore`: recipe storage/retrieval

pub mod output;

pub use output::{CommandRunner, Fetcher, Filesystem, RecipeStore};

#[cfg(test)]
pub use output::{MockCommandRunner, MockFetcher, MockFilesystem, MockRecipeStore};
