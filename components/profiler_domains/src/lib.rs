//! Heap diff export layer
//!
//! This module exposes the heap differencing engine over the agent protocol
//! and drives periodic instance-count monitoring.
//!
//! # Features
//!
//! - **HeapDiffDomain**: `HeapDiff` protocol domain (start/stop diffs, stats, monitoring)
//! - **InstanceMonitor**: timer-driven diff restarts broadcasting `Instances` events

mod heap_diff_domain;
mod instance_monitor;
mod types;

pub use heap_diff_domain::HeapDiffDomain;
pub use instance_monitor::{InstanceMonitor, DEFAULT_EVENT_CAPACITY, DEFAULT_MONITOR_INTERVAL};
pub use types::*;
