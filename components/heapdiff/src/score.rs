//! Per-group population counters

use heap_graph::GraphNode;

/// Signed instance count and shallow size for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    count: i64,
    size: i64,
}

impl Score {
    /// Create a zeroed score
    pub fn new() -> Self {
        Self::default()
    }

    /// Net instance count
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Net shallow size in bytes
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Account for a node that appeared
    pub fn plus(&mut self, node: &GraphNode<'_>) {
        self.count += 1;
        self.size = self.size.saturating_add(signed_size(node));
    }

    /// Account for a node that disappeared
    pub fn minus(&mut self, node: &GraphNode<'_>) {
        self.count -= 1;
        self.size = self.size.saturating_sub(signed_size(node));
    }
}

fn signed_size(node: &GraphNode<'_>) -> i64 {
    i64::try_from(node.self_size).unwrap_or(i64::MAX)
}
