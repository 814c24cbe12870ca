//! Recipe storage adapters.

mod memory;

pub use memory::InMemoryRecipeStore;
