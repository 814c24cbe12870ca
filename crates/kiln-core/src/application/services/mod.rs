//! Application services - orchestrate use cases.
//!
//! One service per scaffolding primitive, plus the pipeline interpreter that
//! drives them and the recipe service that feeds it.

pub mod command_service;
mod containment;
pub mod injector;
pub mod materializer;
pub mod pipeline_service;
pub mod recipe_service;
pub mod remote_fetcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use command_service::CommandService;
pub use injector::Injector;
pub use materializer::Materializer;
pub use pipeline_service::{PipelineRunner, StepEvent};
pub use recipe_service::{RecipeInfo, RecipeService};
pub use remote_fetcher::RemoteFetcher;
