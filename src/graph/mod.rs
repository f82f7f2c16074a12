//! Core graph data structures

mod engine;
mod node;

pub use engine::{GraphError, GraphResult, ItemGraph};
pub use node::{NodeId, Song};
