//! Songgraph: groups song variants into connected clusters
//!
//! Each incoming song is reduced to a canonical key derived from its
//! title. The first song under a key starts a group; later songs with the
//! same key are chained onto the end of that group in an append-only
//! directed graph. A depth-first traversal reports every group.
//!
//! # Core Concepts
//!
//! - **Nodes**: songs, identified by handle rather than by value
//! - **Edges**: "ingested as a variant of" links from a chain terminal to
//!   the next variant
//! - **Groups**: connected clusters found by the grouping traversal
//!
//! # Example
//!
//! ```
//! use songgraph::{Ingestor, ItemGraph, Song, TextReport};
//! use std::sync::Arc;
//!
//! let ingestor = Ingestor::new(Arc::new(ItemGraph::new()));
//! ingestor.ingest(Song::new("Hurt").with_artist("Nine Inch Nails")).unwrap();
//! ingestor.ingest(Song::new("Hurt (Live)").with_artist("Johnny Cash")).unwrap();
//!
//! let mut report = TextReport::new(String::new());
//! let groups = ingestor.graph().grouping_traversal(&mut report).unwrap();
//! assert_eq!(groups, 1);
//! ```

pub mod config;
mod graph;
pub mod grouping;
pub mod report;
pub mod server;

pub use config::{Config, ConfigError};
pub use graph::{GraphError, GraphResult, ItemGraph, NodeId, Song};
pub use grouping::{derive_key, Ingested, Ingestor, KeyDeriver};
pub use report::{GroupCollector, GroupSink, SongGroup, TextReport};
pub use server::{build_router, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
