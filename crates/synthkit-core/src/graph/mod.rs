pub mod dag;
pub mod topo;
pub mod visualize;

pub use dag::DependencyGraph;
pub use topo::plan_tables;
