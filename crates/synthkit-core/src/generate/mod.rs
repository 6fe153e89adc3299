pub mod corpus;
pub mod edge_cases;
pub mod engine;
pub mod primitives;
pub mod rules;
pub mod row;
pub mod unique;
pub mod value;

pub use engine::{generate_dataset, RunMetadata};
pub use value::Value;
