//! Process adapters.

pub mod probe;
mod runner;

pub use runner::{DEFAULT_KEEP_ENV, ProcessRunner};
