//! Ingestion: decide where each incoming song joins the graph
//!
//! A song whose key has not been seen starts a new group. Otherwise the
//! song is chained onto the terminal of the group that already owns its
//! key.

use super::key::KeyDeriver;
use crate::graph::{GraphResult, ItemGraph, NodeId, Song};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Where an ingested song ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// Handle of the new node
    pub id: NodeId,
    /// Grouping key derived from the title
    pub key: String,
    /// The chain terminal the song was attached to, if the key was known
    pub attached_to: Option<NodeId>,
}

impl Ingested {
    /// True when the song was the first under its key
    pub fn started_group(&self) -> bool {
        self.attached_to.is_none()
    }
}

/// Owns the key index and feeds songs into an [`ItemGraph`]
///
/// The index maps each key to the first song seen under it, never to the
/// current end of the chain; `chain_terminal` walks forward from there.
/// The index entry stays locked from terminal lookup through edge
/// insertion, so concurrent songs with the same key still form one chain.
pub struct Ingestor {
    graph: Arc<ItemGraph>,
    deriver: KeyDeriver,
    index: DashMap<String, NodeId>,
}

impl Ingestor {
    /// Create an ingestor with the default key deriver
    pub fn new(graph: Arc<ItemGraph>) -> Self {
        Self::with_deriver(graph, KeyDeriver::default())
    }

    /// Create an ingestor with a custom key deriver
    pub fn with_deriver(graph: Arc<ItemGraph>, deriver: KeyDeriver) -> Self {
        Self {
            graph,
            deriver,
            index: DashMap::new(),
        }
    }

    /// The graph songs are ingested into
    pub fn graph(&self) -> &Arc<ItemGraph> {
        &self.graph
    }

    /// The deriver used for grouping keys
    pub fn deriver(&self) -> &KeyDeriver {
        &self.deriver
    }

    /// Add one song to the graph
    ///
    /// Ingesting the same song twice creates two nodes. The only failure
    /// is a cycle on the indexed song's chain, which ingestion itself
    /// never creates.
    pub fn ingest(&self, song: Song) -> GraphResult<Ingested> {
        let key = self.deriver.derive_key(&song.title);
        debug!(title = %song.title, key = %key, "derived grouping key");

        match self.index.entry(key.clone()) {
            Entry::Vacant(slot) => {
                let id = self.graph.insert_node(song);
                slot.insert(id);
                info!(node = %id, key = %key, "started new group");
                Ok(Ingested {
                    id,
                    key,
                    attached_to: None,
                })
            }
            Entry::Occupied(slot) => {
                let terminal = self.graph.chain_terminal(*slot.get())?;
                let id = self.graph.insert_chained(terminal, song);
                info!(node = %id, parent = %terminal, key = %key, "extended group");
                Ok(Ingested {
                    id,
                    key,
                    attached_to: Some(terminal),
                })
            }
        }
    }

    /// Ingest songs in order, stopping at the first failure
    pub fn ingest_all<I>(&self, songs: I) -> GraphResult<Vec<Ingested>>
    where
        I: IntoIterator<Item = Song>,
    {
        songs.into_iter().map(|song| self.ingest(song)).collect()
    }

    /// The node registered for a key, if any
    pub fn indexed(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).map(|r| *r.value())
    }

    /// Number of distinct keys seen so far
    pub fn key_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingestor() -> Ingestor {
        Ingestor::new(Arc::new(ItemGraph::new()))
    }

    #[test]
    fn test_first_song_starts_group() {
        let ingestor = ingestor();
        let outcome = ingestor.ingest(Song::new("Foo")).unwrap();

        assert!(outcome.started_group());
        assert_eq!(outcome.key, "foo");
        assert_eq!(ingestor.indexed("foo"), Some(outcome.id));
        assert_eq!(ingestor.graph().node_count(), 1);
    }

    #[test]
    fn test_variants_chain_onto_terminal() {
        let ingestor = ingestor();
        let a = ingestor.ingest(Song::new("Foo")).unwrap();
        let b = ingestor.ingest(Song::new("foo (remastered)")).unwrap();
        let c = ingestor.ingest(Song::new("FOO")).unwrap();

        assert_eq!(b.attached_to, Some(a.id));
        assert_eq!(c.attached_to, Some(b.id));
        assert_eq!(ingestor.graph().children(&a.id), vec![b.id]);
        assert_eq!(ingestor.graph().children(&b.id), vec![c.id]);
    }

    #[test]
    fn test_index_keeps_first_song() {
        let ingestor = ingestor();
        let a = ingestor.ingest(Song::new("Foo")).unwrap();
        ingestor.ingest(Song::new("Foo Remix")).unwrap();
        ingestor.ingest(Song::new("Foo (Live)")).unwrap();

        assert_eq!(ingestor.indexed("foo"), Some(a.id));
        assert_eq!(ingestor.key_count(), 1);
    }

    #[test]
    fn test_duplicate_song_becomes_second_node() {
        let ingestor = ingestor();
        let song = Song::new("Foo").with_artist("Bar");
        let first = ingestor.ingest(song.clone()).unwrap();
        let second = ingestor.ingest(song).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.attached_to, Some(first.id));
        assert_eq!(ingestor.graph().node_count(), 2);
    }

    #[test]
    fn test_different_keys_stay_apart() {
        let ingestor = ingestor();
        let a = ingestor.ingest(Song::new("Foo")).unwrap();
        let d = ingestor.ingest(Song::new("Bar")).unwrap();

        assert!(a.started_group());
        assert!(d.started_group());
        assert_eq!(ingestor.graph().edge_count(), 0);
        assert_eq!(ingestor.key_count(), 2);
    }

    #[test]
    fn test_custom_deriver_merges_configured_markers() {
        let graph = Arc::new(ItemGraph::new());
        let ingestor = Ingestor::with_deriver(graph, KeyDeriver::with_markers(["remix", "live"]));
        let a = ingestor.ingest(Song::new("Hurt")).unwrap();
        let b = ingestor.ingest(Song::new("Hurt Live")).unwrap();

        assert_eq!(b.attached_to, Some(a.id));
    }

    #[test]
    fn test_ingest_all_preserves_order() {
        let ingestor = ingestor();
        let outcomes = ingestor
            .ingest_all(vec![Song::new("A"), Song::new("B"), Song::new("a")])
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[2].attached_to, Some(outcomes[0].id));
        assert_eq!(ingestor.graph().node_ids().len(), 3);
    }

    #[test]
    fn test_cycle_on_chain_is_reported() {
        let ingestor = ingestor();
        let a = ingestor.ingest(Song::new("Foo")).unwrap();
        let b = ingestor.ingest(Song::new("Foo")).unwrap();
        // Close the chain into a loop behind the ingestor's back
        ingestor.graph().insert_edge(b.id, a.id);

        let err = ingestor.ingest(Song::new("Foo")).unwrap_err();
        assert!(matches!(err, crate::graph::GraphError::InvalidPrecondition { .. }));
        assert_eq!(ingestor.graph().node_count(), 2);
    }
}
