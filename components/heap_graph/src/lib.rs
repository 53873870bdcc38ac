//! Captured object graph abstraction
//!
//! This crate describes what the heap diff engine needs from a heap profiler:
//! a read-only view over a captured object graph and a way to take and release
//! such captures.
//!
//! # Features
//!
//! - **HeapGraph**: node lookup, node categories, typed outgoing edges
//! - **SnapshotProvider**: snapshot capture and explicit release
//! - **HeapSnapshot**: immutable adjacency-list capture with a builder
//! - **SimulatedHeap**: in-memory heap with stable object ids

mod graph;
mod simulated_heap;
mod snapshot;
mod types;

pub use graph::{HeapGraph, SnapshotProvider};
pub use simulated_heap::SimulatedHeap;
pub use snapshot::{HeapSnapshot, SnapshotBuilder};
pub use types::*;
