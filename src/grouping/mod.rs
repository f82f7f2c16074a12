//! Song grouping: canonical keys and ingestion into the item graph

mod ingest;
mod key;

pub use ingest::{Ingested, Ingestor};
pub use key::{derive_key, KeyDeriver, DEFAULT_MARKERS};
