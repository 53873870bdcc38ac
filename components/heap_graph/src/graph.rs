//! Traits implemented by a heap profiler backend

use crate::types::{GraphNode, NodeIndex};

/// Read-only access to one captured object graph
pub trait HeapGraph {
    /// The root node every traversal starts from
    fn root(&self) -> NodeIndex;

    /// Look up a node
    ///
    /// Returns `None` when the index does not resolve, which callers treat as
    /// an inconsistency in the capture rather than a hard failure.
    fn node(&self, index: NodeIndex) -> Option<GraphNode<'_>>;

    /// Number of nodes in the capture
    fn node_count(&self) -> usize;
}

/// Source of heap snapshots
///
/// Taking a snapshot is proportional to the size of the live heap and blocks
/// the calling thread until the capture is complete.
pub trait SnapshotProvider {
    /// Graph type produced by this provider
    type Graph: HeapGraph;

    /// Capture the current object graph
    fn take_snapshot(&self) -> Self::Graph;

    /// Release a snapshot previously returned by [`take_snapshot`](Self::take_snapshot)
    fn release(&self, snapshot: Self::Graph) {
        drop(snapshot);
    }
}

impl<T: SnapshotProvider + ?Sized> SnapshotProvider for std::sync::Arc<T> {
    type Graph = T::Graph;

    fn take_snapshot(&self) -> Self::Graph {
        (**self).take_snapshot()
    }

    fn release(&self, snapshot: Self::Graph) {
        (**self).release(snapshot)
    }
}
