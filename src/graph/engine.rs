//! ItemGraph: the directed adjacency structure behind song grouping

use super::node::{NodeId, Song};
use crate::report::GroupSink;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in graph operations
#[derive(Debug, Error)]
pub enum GraphError {
    /// Following first edges from `start` took more steps than there are
    /// nodes, so the edge set contains a cycle.
    #[error("Invalid precondition: edge cycle reachable from {start} (gave up after {steps} steps)")]
    InvalidPrecondition { start: NodeId, steps: usize },

    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("Report sink failed: {0}")]
    Sink(#[from] std::fmt::Error),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Default)]
struct GraphState {
    /// Node handles in insertion order
    nodes: Vec<NodeId>,
    /// The song behind each handle; never edited after insertion
    records: HashMap<NodeId, Song>,
    /// Outgoing adjacency; a missing key means no children
    edges: HashMap<NodeId, Vec<NodeId>>,
}

impl GraphState {
    fn record(&self, id: &NodeId) -> GraphResult<&Song> {
        self.records.get(id).ok_or(GraphError::UnknownNode(*id))
    }

    fn children(&self, id: &NodeId) -> &[NodeId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Append-only directed graph over songs
///
/// Mutations take the write lock; traversals hold the read lock for their
/// whole duration so they never observe a half-built graph. Visited sets
/// live on the traversal's own stack.
///
/// Ingestion only ever builds simple chains, but any node may carry
/// several children when `insert_edge` is called directly.
#[derive(Debug, Default)]
pub struct ItemGraph {
    state: RwLock<GraphState>,
}

impl ItemGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // Append-only state cannot be left torn by a panicking writer, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a song as a new node and return its handle
    pub fn insert_node(&self, song: Song) -> NodeId {
        let id = NodeId::new();
        let mut state = self.write();
        state.nodes.push(id);
        state.records.insert(id, song);
        id
    }

    /// Append `child` to the outgoing edges of `parent`
    ///
    /// Neither endpoint is checked for membership; callers insert nodes
    /// before wiring them.
    pub fn insert_edge(&self, parent: NodeId, child: NodeId) {
        self.write().edges.entry(parent).or_default().push(child);
    }

    /// Append a song and link it under `parent` in one critical section
    ///
    /// Traversals never see the new node without its incoming edge.
    pub fn insert_chained(&self, parent: NodeId, song: Song) -> NodeId {
        let id = NodeId::new();
        let mut state = self.write();
        state.nodes.push(id);
        state.records.insert(id, song);
        state.edges.entry(parent).or_default().push(id);
        id
    }

    /// Follow first edges from `start` until reaching a node with none
    ///
    /// This is where the next variant of the same song gets attached.
    /// A cycle on the first-edge path is reported as
    /// [`GraphError::InvalidPrecondition`] instead of looping forever.
    pub fn chain_terminal(&self, start: NodeId) -> GraphResult<NodeId> {
        let state = self.read();
        let limit = state.nodes.len();
        let mut current = start;
        let mut steps = 0;

        while let Some(next) = state.children(&current).first() {
            if steps >= limit {
                return Err(GraphError::InvalidPrecondition { start, steps });
            }
            current = *next;
            steps += 1;
        }

        Ok(current)
    }

    /// Emit every group to `sink` by depth-first traversal
    ///
    /// Roots are taken from the node list in insertion order; each
    /// unvisited root opens a new group and its subtree is emitted in
    /// pre-order, following children in edge insertion order. Returns the
    /// number of groups emitted.
    pub fn grouping_traversal<S: GroupSink + ?Sized>(&self, sink: &mut S) -> GraphResult<usize> {
        let state = self.read();
        let mut visited: HashSet<NodeId> = HashSet::with_capacity(state.nodes.len());
        let mut groups = 0;

        for root in &state.nodes {
            if visited.contains(root) {
                continue;
            }

            groups += 1;
            sink.begin_group(groups, state.record(root)?)?;

            // Skipping already-visited ids on pop gives the same order as
            // the recursive pre-order walk.
            let mut stack = vec![*root];
            while let Some(id) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }
                sink.member(state.record(&id)?)?;

                for child in state.children(&id).iter().rev() {
                    if !visited.contains(child) {
                        stack.push(*child);
                    }
                }
            }

            sink.end_group()?;
        }

        Ok(groups)
    }

    /// Visit every node level by level, starting a new search from each
    /// unvisited node in insertion order
    pub fn breadth_first_traversal(&self) -> GraphResult<Vec<Song>> {
        let state = self.read();
        let mut visited: HashSet<NodeId> = HashSet::with_capacity(state.nodes.len());
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut order = Vec::with_capacity(state.nodes.len());

        for root in &state.nodes {
            if !visited.insert(*root) {
                continue;
            }
            queue.push_back(*root);

            while let Some(id) = queue.pop_front() {
                let song = state.record(&id)?;
                debug!(node = %id, song = %song, "bfs visit");
                order.push(song.clone());

                for child in state.children(&id) {
                    if visited.insert(*child) {
                        queue.push_back(*child);
                    }
                }
            }
        }

        Ok(order)
    }

    /// Get a copy of the song behind a node
    pub fn get(&self, id: &NodeId) -> Option<Song> {
        self.read().records.get(id).cloned()
    }

    /// Children of a node in edge insertion order
    pub fn children(&self, id: &NodeId) -> Vec<NodeId> {
        self.read().children(id).to_vec()
    }

    /// All node handles in insertion order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.read().nodes.clone()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.read().edges.values().map(Vec::len).sum()
    }

    /// Check if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{GroupCollector, TextReport};

    fn song(title: &str) -> Song {
        Song::new(title).with_artist("Test Artist")
    }

    fn titles(collector: &GroupCollector) -> Vec<Vec<String>> {
        collector
            .groups()
            .iter()
            .map(|g| g.songs.iter().map(|s| s.title.clone()).collect())
            .collect()
    }

    #[test]
    fn test_create_graph() {
        let graph = ItemGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_insert_node_preserves_order() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));

        assert_eq!(graph.node_ids(), vec![a, b]);
        assert_eq!(graph.get(&a).unwrap().title, "A");
    }

    #[test]
    fn test_equal_songs_are_distinct_nodes() {
        let graph = ItemGraph::new();
        let first = graph.insert_node(song("Same"));
        let second = graph.insert_node(song("Same"));

        assert_ne!(first, second);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_insert_edge_keeps_child_order() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        let c = graph.insert_node(song("C"));

        graph.insert_edge(a, c);
        graph.insert_edge(a, b);

        assert_eq!(graph.children(&a), vec![c, b]);
        assert!(graph.children(&b).is_empty());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_insert_chained_adds_node_and_edge() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_chained(a, song("B"));

        assert_eq!(graph.node_ids(), vec![a, b]);
        assert_eq!(graph.children(&a), vec![b]);
        assert_eq!(graph.get(&b).unwrap().title, "B");
    }

    #[test]
    fn test_chain_terminal_of_leaf_is_itself() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        assert_eq!(graph.chain_terminal(a).unwrap(), a);
    }

    #[test]
    fn test_chain_terminal_follows_first_edge() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        let c = graph.insert_node(song("C"));
        let d = graph.insert_node(song("D"));

        // a -> b -> d, a -> c
        graph.insert_edge(a, b);
        graph.insert_edge(a, c);
        graph.insert_edge(b, d);

        assert_eq!(graph.chain_terminal(a).unwrap(), d);
        assert_eq!(graph.chain_terminal(c).unwrap(), c);
    }

    #[test]
    fn test_chain_terminal_detects_cycle() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        graph.insert_edge(a, b);
        graph.insert_edge(b, a);

        let err = graph.chain_terminal(a).unwrap_err();
        assert!(matches!(err, GraphError::InvalidPrecondition { start, .. } if start == a));
    }

    #[test]
    fn test_chain_terminal_handles_long_chains() {
        let graph = ItemGraph::new();
        let first = graph.insert_node(song("0"));
        let mut last = first;
        for i in 1..100_000 {
            let next = graph.insert_node(song(&i.to_string()));
            graph.insert_edge(last, next);
            last = next;
        }

        assert_eq!(graph.chain_terminal(first).unwrap(), last);
    }

    #[test]
    fn test_grouping_traversal_empty_graph() {
        let graph = ItemGraph::new();
        let mut out = String::new();

        let groups = graph.grouping_traversal(&mut TextReport::new(&mut out)).unwrap();

        assert_eq!(groups, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_grouping_traversal_is_preorder_in_edge_order() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        let c = graph.insert_node(song("C"));
        let d = graph.insert_node(song("D"));
        graph.insert_node(song("E"));

        // a -> b -> d, a -> c, b -> c; e stands alone
        graph.insert_edge(a, b);
        graph.insert_edge(a, c);
        graph.insert_edge(b, d);
        graph.insert_edge(b, c);

        let mut collector = GroupCollector::new();
        let groups = graph.grouping_traversal(&mut collector).unwrap();

        assert_eq!(groups, 2);
        assert_eq!(titles(&collector), vec![vec!["A", "B", "D", "C"], vec!["E"]]);
    }

    #[test]
    fn test_grouping_traversal_reaches_earlier_node_through_later_root() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        // Edge points backwards in insertion order
        graph.insert_edge(b, a);

        let mut collector = GroupCollector::new();
        graph.grouping_traversal(&mut collector).unwrap();

        // a is a root first; b is only reachable from itself
        assert_eq!(titles(&collector), vec![vec!["A"], vec!["B"]]);
    }

    #[test]
    fn test_grouping_traversal_survives_cycles() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        graph.insert_edge(a, b);
        graph.insert_edge(b, a);

        let mut collector = GroupCollector::new();
        assert_eq!(graph.grouping_traversal(&mut collector).unwrap(), 1);
        assert_eq!(titles(&collector), vec![vec!["A", "B"]]);
    }

    #[test]
    fn test_grouping_traversal_reports_dangling_edge() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let ghost = NodeId::new();
        graph.insert_edge(a, ghost);

        let err = graph.grouping_traversal(&mut GroupCollector::new()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(id) if id == ghost));
    }

    #[test]
    fn test_traversals_do_not_share_visited_state() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        graph.insert_edge(a, b);

        let mut first = GroupCollector::new();
        let mut second = GroupCollector::new();
        graph.grouping_traversal(&mut first).unwrap();
        graph.grouping_traversal(&mut second).unwrap();

        assert_eq!(titles(&first), titles(&second));
    }

    #[test]
    fn test_breadth_first_traversal_is_level_order() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        let c = graph.insert_node(song("C"));
        let d = graph.insert_node(song("D"));
        graph.insert_node(song("E"));

        // a -> b -> d, a -> c; e stands alone
        graph.insert_edge(a, b);
        graph.insert_edge(a, c);
        graph.insert_edge(b, d);

        let order: Vec<String> = graph
            .breadth_first_traversal()
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();

        assert_eq!(order, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_breadth_first_traversal_visits_each_node_once() {
        let graph = ItemGraph::new();
        let a = graph.insert_node(song("A"));
        let b = graph.insert_node(song("B"));
        let c = graph.insert_node(song("C"));
        graph.insert_edge(a, c);
        graph.insert_edge(b, c);
        graph.insert_edge(c, a);

        let order = graph.breadth_first_traversal().unwrap();
        assert_eq!(order.len(), 3);
    }
}
