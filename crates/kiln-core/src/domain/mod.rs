// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Kiln.
//!
//! This module contains pure logic with no I/O. Filesystem, network and
//! process concerns are reached only through the ports defined in the
//! application layer.
//!
//! - **No async**: everything is synchronous and sequential
//! - **No I/O**: injection is a pure text-to-text [`splice`]
//! - **Validated values**: paths, anchors and commands are checked when built,
//!   so the application layer never sees a root-escaping path
pub mod entities;
pub mod error;
pub mod splice;
pub mod value_objects;

pub use entities::{
    common::{Anchor, RelativePath},
    pipeline::{Pipeline, Recipe},
    render::RenderContext,
    report::{RunReport, StepOutcome, StepRecord},
    step::{
        CommandOutput, CommandSpec, FetchSpec, InjectionSpec, Step, StepKind, TemplateAction,
    },
};

pub use error::{DomainError, ErrorCategory};

pub use splice::{Spliced, find_anchor_lines, splice};

pub use value_objects::{LineEnding, Position, WriteMode};
