//! Heap snapshot differencing engine
//!
//! Given two captures of a managed object graph, computes per class name the
//! net change in live instance count and aggregated shallow size.
//!
//! # Features
//!
//! - **collect**: bounded-stack reachability walk with edge and node filtering
//! - **GroupKey**: hashed, length-bounded grouping key for type names
//! - **Score**: signed count/size counters
//! - **HeapDiff**: single-baseline start/stop session orchestrator
//!
//! # Example
//!
//! ```
//! use heap_graph::SimulatedHeap;
//! use heapdiff::HeapDiff;
//! use std::sync::Arc;
//!
//! let heap = Arc::new(SimulatedHeap::new());
//! let diff = HeapDiff::new(Arc::clone(&heap));
//!
//! diff.start_diff();
//! heap.allocate_rooted("Widget", 16);
//! let report = diff.stop_diff(true).unwrap();
//!
//! assert_eq!(report.get("Widget").unwrap().total, 1);
//! ```

pub mod collector;
mod config;
mod diff;
mod error;
pub mod key;
mod report;
mod score;

pub use collector::{collect, follows_edge, ReachabilitySet, Reachable};
pub use config::{HeapDiffConfig, HeapDiffConfigBuilder};
pub use diff::{summarize, DiffSession, DiffStats, DiffSummary, HeapDiff};
pub use error::{DiffError, KeyError, Result};
pub use key::{jenkins_hash, GroupKey, DEFAULT_MAX_KEY_LEN, INLINE_KEY_CAPACITY};
pub use report::{DiffRecord, DiffReport};
pub use score::Score;
