pub mod config;
pub mod error;
pub mod export;
pub mod expr;
pub mod generate;
pub mod graph;
pub mod rng;
pub mod schema;
#[cfg(test)]
pub(crate) mod test_fixtures;
pub mod validate;

// Re-export key types for convenience
pub use error::{Result, SynthKitError};
pub use schema::types::{Mode, SchemaSpec};
