//! Reachability collection over a captured object graph
//!
//! Walks the graph from its root with an explicit work list, so arbitrarily
//! deep graphs never touch the call-stack limit, and records every distinct
//! object identity it reaches.

use heap_graph::{EdgeType, HeapGraph, NodeIndex, NodeType, ObjectId};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// One reachable node: its identity and where it lives in its snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachable {
    /// Object identity
    pub id: ObjectId,
    /// Index into the snapshot the set was collected from
    pub index: NodeIndex,
}

/// Identities reachable from a snapshot root, ordered by id
///
/// Contains no duplicates and never contains heap numbers.
#[derive(Debug, Clone, Default)]
pub struct ReachabilitySet {
    entries: Vec<Reachable>,
}

impl ReachabilitySet {
    /// Number of reachable nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was reached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order
    pub fn iter(&self) -> std::slice::Iter<'_, Reachable> {
        self.entries.iter()
    }

    /// Entries as a slice
    pub fn as_slice(&self) -> &[Reachable] {
        &self.entries
    }

    /// Whether `id` was reached
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.binary_search_by_key(&id, |e| e.id).is_ok()
    }
}

impl<'a> IntoIterator for &'a ReachabilitySet {
    type Item = &'a Reachable;
    type IntoIter = std::slice::Iter<'a, Reachable>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Whether the traversal follows an edge of this kind
///
/// Internal links (string slices, relocation data), shortcuts through
/// bound-function glue and weak references are skipped. Hidden links are
/// followed: some runtimes route real reachability through them.
pub fn follows_edge(edge_type: EdgeType) -> bool {
    !matches!(
        edge_type,
        EdgeType::Internal | EdgeType::Shortcut | EdgeType::Weak
    )
}

/// Collect every identity reachable from the graph root
///
/// Heap numbers are neither recorded nor expanded. An index that does not
/// resolve is treated as a node without children, so a damaged capture yields
/// a smaller set instead of an error.
pub fn collect<G: HeapGraph + ?Sized>(graph: &G) -> ReachabilitySet {
    let mut visited: BTreeMap<ObjectId, NodeIndex> = BTreeMap::new();
    let mut stack = vec![graph.root()];
    let mut unresolved = 0usize;

    while let Some(index) = stack.pop() {
        let Some(node) = graph.node(index) else {
            unresolved += 1;
            continue;
        };

        if node.node_type == NodeType::HeapNumber {
            continue;
        }

        match visited.entry(node.id) {
            Entry::Occupied(_) => continue,
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
        }

        // Reverse so children are expanded in edge order.
        stack.extend(
            node.edges
                .iter()
                .rev()
                .filter(|edge| follows_edge(edge.edge_type))
                .map(|edge| edge.to),
        );
    }

    if unresolved > 0 {
        debug!("Reachability walk skipped {} unresolved nodes", unresolved);
    }
    debug!(
        "Collected {} reachable nodes out of {}",
        visited.len(),
        graph.node_count()
    );

    ReachabilitySet {
        entries: visited
            .into_iter()
            .map(|(id, index)| Reachable { id, index })
            .collect(),
    }
}
