//! Domain entities and value objects.

pub mod common;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod step;
