//! Simulated managed heap
//!
//! Provides an in-memory object heap with stable object ids that can be
//! snapshotted like a real runtime heap. Used by tests and by hosts that want
//! to exercise the diff engine without a managed runtime attached.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

use crate::graph::SnapshotProvider;
use crate::snapshot::{HeapSnapshot, SnapshotBuilder};
use crate::types::{EdgeType, NodeType, ObjectId};

/// Id of the synthetic root object
const ROOT_ID: ObjectId = ObjectId(1);

#[derive(Debug, Clone)]
struct SimObject {
    node_type: NodeType,
    self_size: u64,
    name: String,
    refs: Vec<(EdgeType, ObjectId)>,
}

/// Mutable in-memory heap
///
/// Starts with a single synthetic root and nothing else. Objects allocated
/// with [`allocate_rooted`](Self::allocate_rooted) are immediately reachable;
/// objects allocated with [`allocate`](Self::allocate) stay garbage until
/// something links to them.
#[derive(Debug)]
pub struct SimulatedHeap {
    objects: RwLock<BTreeMap<ObjectId, SimObject>>,
    next_id: AtomicU64,
    live_snapshots: AtomicUsize,
}

impl SimulatedHeap {
    /// Create a heap holding only the root
    pub fn new() -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(
            ROOT_ID,
            SimObject {
                node_type: NodeType::Synthetic,
                self_size: 0,
                name: "(GC roots)".to_string(),
                refs: Vec::new(),
            },
        );

        Self {
            objects: RwLock::new(objects),
            next_id: AtomicU64::new(ROOT_ID.0 + 1),
            live_snapshots: AtomicUsize::new(0),
        }
    }

    /// Id of the synthetic root
    pub fn root_id(&self) -> ObjectId {
        ROOT_ID
    }

    /// Allocate an unreferenced object
    pub fn allocate(&self, node_type: NodeType, name: impl Into<String>, self_size: u64) -> ObjectId {
        let id = ObjectId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.objects.write().insert(
            id,
            SimObject {
                node_type,
                self_size,
                name: name.into(),
                refs: Vec::new(),
            },
        );
        id
    }

    /// Allocate an object of category `Object` referenced directly from the root
    pub fn allocate_rooted(&self, class_name: impl Into<String>, self_size: u64) -> ObjectId {
        let id = self.allocate(NodeType::Object, class_name, self_size);
        self.link(ROOT_ID, EdgeType::Property, id);
        id
    }

    /// Add a reference from one object to another
    ///
    /// Returns false if either object does not exist.
    pub fn link(&self, from: ObjectId, edge_type: EdgeType, to: ObjectId) -> bool {
        let mut objects = self.objects.write();
        if !objects.contains_key(&to) {
            return false;
        }
        match objects.get_mut(&from) {
            Some(object) => {
                object.refs.push((edge_type, to));
                true
            }
            None => false,
        }
    }

    /// Remove every reference from `from` to `to`
    pub fn unlink(&self, from: ObjectId, to: ObjectId) -> bool {
        let mut objects = self.objects.write();
        match objects.get_mut(&from) {
            Some(object) => {
                let before = object.refs.len();
                object.refs.retain(|(_, target)| *target != to);
                object.refs.len() != before
            }
            None => false,
        }
    }

    /// Free an object, dropping every reference to it
    ///
    /// The root cannot be freed.
    pub fn free(&self, id: ObjectId) -> bool {
        if id == ROOT_ID {
            return false;
        }
        let mut objects = self.objects.write();
        if objects.remove(&id).is_none() {
            return false;
        }
        for object in objects.values_mut() {
            object.refs.retain(|(_, target)| *target != id);
        }
        true
    }

    /// Number of objects currently in the heap, root included
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    /// Number of snapshots taken and not yet released
    pub fn live_snapshots(&self) -> usize {
        self.live_snapshots.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotProvider for SimulatedHeap {
    type Graph = HeapSnapshot;

    fn take_snapshot(&self) -> HeapSnapshot {
        let objects = self.objects.read();
        let mut builder = SnapshotBuilder::default();
        let mut indices = HashMap::with_capacity(objects.len());

        for (id, object) in objects.iter() {
            let index = builder.node(id.0, object.node_type, object.self_size, object.name.clone());
            indices.insert(*id, index);
        }
        for (id, object) in objects.iter() {
            let Some(&from) = indices.get(id) else {
                continue;
            };
            for (edge_type, target) in &object.refs {
                if let Some(to) = indices.get(target) {
                    builder.edge(from, *edge_type, *to);
                }
            }
        }
        if let Some(root) = indices.get(&ROOT_ID) {
            builder.root(*root);
        }

        let snapshot = builder.build();
        let count = self.live_snapshots.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Simulated heap snapshot taken: {} objects, {} bytes, {} live snapshots",
            objects.len(),
            snapshot.total_size(),
            count
        );
        snapshot
    }

    fn release(&self, snapshot: HeapSnapshot) {
        drop(snapshot);
        // Saturating: releasing a snapshot built elsewhere must not underflow.
        let _ = self
            .live_snapshots
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::HeapGraph;

    #[test]
    fn test_new_heap_has_only_root() {
        let heap = SimulatedHeap::new();
        assert_eq!(heap.object_count(), 1);

        let snapshot = heap.take_snapshot();
        let root = snapshot.node(snapshot.root()).unwrap();
        assert_eq!(root.id, heap.root_id());
        assert_eq!(root.node_type, NodeType::Synthetic);
        assert!(root.edges.is_empty());
    }

    #[test]
    fn test_allocate_rooted_links_from_root() {
        let heap = SimulatedHeap::new();
        let id = heap.allocate_rooted("Widget", 16);

        let snapshot = heap.take_snapshot();
        let root = snapshot.node(snapshot.root()).unwrap();
        assert_eq!(root.edges.len(), 1);
        let target = snapshot.node(root.edges[0].to).unwrap();
        assert_eq!(target.id, id);
        assert_eq!(target.name, "Widget");
    }

    #[test]
    fn test_ids_are_stable_across_snapshots() {
        let heap = SimulatedHeap::new();
        let id = heap.allocate_rooted("Widget", 16);
        heap.allocate_rooted("Gadget", 8);

        let first = heap.take_snapshot();
        heap.allocate_rooted("Widget", 16);
        let second = heap.take_snapshot();

        let find = |s: &HeapSnapshot| {
            (0..s.node_count())
                .filter_map(|i| s.node(crate::NodeIndex(i)))
                .any(|n| n.id == id)
        };
        assert!(find(&first));
        assert!(find(&second));
    }

    #[test]
    fn test_free_removes_references() {
        let heap = SimulatedHeap::new();
        let id = heap.allocate_rooted("Widget", 16);

        assert!(heap.free(id));
        assert!(!heap.free(id));
        assert!(!heap.free(heap.root_id()));

        let snapshot = heap.take_snapshot();
        assert!(snapshot.node(snapshot.root()).unwrap().edges.is_empty());
    }

    #[test]
    fn test_link_and_unlink() {
        let heap = SimulatedHeap::new();
        let a = heap.allocate_rooted("A", 8);
        let b = heap.allocate(NodeType::Object, "B", 8);

        assert!(heap.link(a, EdgeType::Element, b));
        assert!(!heap.link(a, EdgeType::Element, ObjectId(999)));
        assert!(heap.unlink(a, b));
        assert!(!heap.unlink(a, b));
    }

    #[test]
    fn test_release_tracks_live_snapshots() {
        let heap = SimulatedHeap::new();
        let first = heap.take_snapshot();
        let second = heap.take_snapshot();
        assert_eq!(heap.live_snapshots(), 2);

        heap.release(first);
        heap.release(second);
        assert_eq!(heap.live_snapshots(), 0);

        heap.release(HeapSnapshot::builder().build());
        assert_eq!(heap.live_snapshots(), 0);
    }
}
