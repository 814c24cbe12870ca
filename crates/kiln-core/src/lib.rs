//! Kiln Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Kiln
//! scaffolding engine, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            kiln-cli (CLI)               │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (PipelineRunner, RecipeService)       │
//! │   Materializer · Injector · Fetcher ·   │
//! │            CommandService               │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Filesystem, Fetcher, CommandRunner,    │
//! │             RecipeStore)                │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      kiln-adapters (Infrastructure)     │
//! │ (LocalFilesystem, HttpFetcher, etc)     │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (RelativePath, Anchor, Step, Pipeline,  │
//! │      Recipe, splice, RenderContext)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use kiln_core::{
//!     application::PipelineRunner,
//!     domain::{Pipeline, WriteMode},
//! };
//!
//! # fn adapters() -> (
//! #     Box<dyn kiln_core::application::Filesystem>,
//! #     Box<dyn kiln_core::application::Fetcher>,
//! #     Box<dyn kiln_core::application::CommandRunner>,
//! # ) { unimplemented!() }
//! let (filesystem, fetcher, runner) = adapters();
//!
//! let pipeline = Pipeline::new()
//!     .write("Gemfile", "source 'https://rubygems.org'\n", WriteMode::Overwrite)?
//!     .run(["bundle", "install"])?;
//!
//! let report = PipelineRunner::new(filesystem, fetcher, runner)
//!     .execute(Path::new("./my-api"), &pipeline)?;
//! assert_eq!(report.steps.len(), 2);
//! # Ok::<(), kiln_core::error::KilnError>(())
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        PipelineRunner, RecipeInfo, RecipeService, StepEvent,
        ports::{CommandRunner, Fetcher, Filesystem, RecipeStore},
    };
    pub use crate::domain::{
        Anchor, CommandSpec, FetchSpec, InjectionSpec, Pipeline, Position, Recipe,
        RelativePath, RenderContext, RunReport, Step, StepOutcome, WriteMode,
    };
    pub use crate::error::{KilnError, KilnResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
