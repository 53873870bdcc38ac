//! Immutable in-memory heap snapshot
//!
//! A `HeapSnapshot` is an adjacency-list capture of the object graph. It is
//! produced by [`SimulatedHeap`](crate::SimulatedHeap) or assembled by hand
//! with [`SnapshotBuilder`].

use crate::graph::HeapGraph;
use crate::types::{EdgeType, GraphNode, HeapEdge, NodeIndex, NodeType, ObjectId};

#[derive(Debug, Clone)]
struct NodeRecord {
    id: ObjectId,
    node_type: NodeType,
    self_size: u64,
    name: String,
    edges: Vec<HeapEdge>,
}

/// Point-in-time capture of an object graph
#[derive(Debug, Clone)]
pub struct HeapSnapshot {
    nodes: Vec<NodeRecord>,
    root: NodeIndex,
}

impl HeapSnapshot {
    /// Create a builder for a new snapshot
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Total shallow size of every node in the capture
    pub fn total_size(&self) -> u64 {
        self.nodes.iter().map(|n| n.self_size).sum()
    }
}

impl HeapGraph for HeapSnapshot {
    fn root(&self) -> NodeIndex {
        self.root
    }

    fn node(&self, index: NodeIndex) -> Option<GraphNode<'_>> {
        self.nodes.get(index.0).map(|record| GraphNode {
            id: record.id,
            node_type: record.node_type,
            self_size: record.self_size,
            name: &record.name,
            edges: &record.edges,
        })
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Builder for [`HeapSnapshot`]
///
/// The first node added becomes the root unless [`root`](Self::root) is called.
/// Edges may point at indices that are never added; such edges model a
/// truncated capture.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    nodes: Vec<NodeRecord>,
    root: Option<NodeIndex>,
}

impl SnapshotBuilder {
    /// Add a node and return its index
    pub fn node(
        &mut self,
        id: u64,
        node_type: NodeType,
        self_size: u64,
        name: impl Into<String>,
    ) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(NodeRecord {
            id: ObjectId(id),
            node_type,
            self_size,
            name: name.into(),
            edges: Vec::new(),
        });
        index
    }

    /// Add a synthetic root node and mark it as the root
    pub fn synthetic_root(&mut self, id: u64) -> NodeIndex {
        let index = self.node(id, NodeType::Synthetic, 0, "(GC roots)");
        self.root = Some(index);
        index
    }

    /// Add an edge between two nodes
    ///
    /// Edges from an unknown source node are ignored.
    pub fn edge(&mut self, from: NodeIndex, edge_type: EdgeType, to: NodeIndex) -> &mut Self {
        if let Some(record) = self.nodes.get_mut(from.0) {
            record.edges.push(HeapEdge::new(edge_type, to));
        }
        self
    }

    /// Override the root node
    pub fn root(&mut self, root: NodeIndex) -> &mut Self {
        self.root = Some(root);
        self
    }

    /// Finish the snapshot
    pub fn build(self) -> HeapSnapshot {
        HeapSnapshot {
            root: self.root.unwrap_or(NodeIndex(0)),
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_first_node_is_root() {
        let mut builder = HeapSnapshot::builder();
        let first = builder.node(10, NodeType::Synthetic, 0, "root");
        builder.node(11, NodeType::Object, 16, "Foo");
        let snapshot = builder.build();

        assert_eq!(snapshot.root(), first);
        assert_eq!(snapshot.node_count(), 2);
    }

    #[test]
    fn test_node_lookup() {
        let mut builder = HeapSnapshot::builder();
        let root = builder.synthetic_root(1);
        let foo = builder.node(2, NodeType::Object, 48, "Foo");
        builder.edge(root, EdgeType::Property, foo);
        let snapshot = builder.build();

        let node = snapshot.node(foo).unwrap();
        assert_eq!(node.id, ObjectId(2));
        assert_eq!(node.name, "Foo");
        assert_eq!(node.self_size, 48);

        let root_node = snapshot.node(root).unwrap();
        assert_eq!(root_node.edges.len(), 1);
        assert_eq!(root_node.edges[0].to, foo);
        assert_eq!(snapshot.total_size(), 48);
    }

    #[test]
    fn test_missing_node_is_none() {
        let snapshot = HeapSnapshot::builder().build();
        assert!(snapshot.node(NodeIndex(0)).is_none());
    }
}
