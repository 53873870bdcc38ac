//! Heap snapshot differencing agent
//!
//! This crate provides the HeapAgent that ties the heap diff engine, the
//! instance monitor and the `HeapDiff` protocol domain to a snapshot provider.
//!
//! # Example
//!
//! ```
//! use heap_agent::{AgentConfig, HeapAgent};
//! use heap_graph::SimulatedHeap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let heap = Arc::new(SimulatedHeap::new());
//!     let agent = HeapAgent::new(Arc::clone(&heap), AgentConfig::default())?;
//!
//!     agent
//!         .handle_message(r#"{"id":1,"method":"HeapDiff.startHeapDiff"}"#)
//!         .await;
//!     heap.allocate_rooted("Widget", 16);
//!     let response = agent
//!         .handle_message(r#"{"id":2,"method":"HeapDiff.stopHeapDiff","params":{"wantReport":true}}"#)
//!         .await;
//!     assert!(response.contains("Widget"));
//!     Ok(())
//! }
//! ```

mod agent;
mod config;
mod error;

pub use agent::{AgentEvents, HeapAgent};
pub use config::{AgentConfig, AgentConfigBuilder};
pub use error::{HeapAgentError, Result};
