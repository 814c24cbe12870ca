//! Application layer for Kiln.
//!
//! This layer contains:
//! - **Services**: the scaffolding primitives, the pipeline interpreter and
//!   recipe lookup
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! Services coordinate the domain layer but hold no business rules of their
//! own. Path validation, anchor matching and rendering live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    CommandService, Injector, Materializer, PipelineRunner, RecipeInfo, RecipeService,
    RemoteFetcher, StepEvent,
};

// Re-export port traits (for adapter implementation)
pub use ports::{CommandRunner, Fetcher, Filesystem, RecipeStore};

pub use error::ApplicationError;
