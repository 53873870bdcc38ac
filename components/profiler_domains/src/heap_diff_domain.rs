//! HeapDiffDomain implementation
//!
//! Exposes heap diffing and instance monitoring through the agent protocol.
//! Diff operations block for a time proportional to the live heap. On a
//! multi-threaded runtime they run under `block_in_place` so other tasks keep
//! being scheduled.

use agent_types::AgentError;
use async_trait::async_trait;
use heapdiff::DiffSession;
use protocol_handler::DomainHandler;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

use crate::instance_monitor::InstanceMonitor;
use crate::types::{MonitorError, StopHeapDiffParams};

/// HeapDiffDomain handles heap diff sessions and instance monitoring
pub struct HeapDiffDomain {
    /// Diff orchestrator
    diff: Arc<dyn DiffSession>,
    /// Optional periodic monitor driving the same orchestrator
    monitor: Option<Arc<InstanceMonitor>>,
}

impl HeapDiffDomain {
    /// Create a domain without instance monitoring
    pub fn new(diff: Arc<dyn DiffSession>) -> Self {
        Self {
            diff,
            monitor: None,
        }
    }

    /// Create a domain that can also drive an instance monitor
    pub fn with_monitor(diff: Arc<dyn DiffSession>, monitor: Arc<InstanceMonitor>) -> Self {
        Self {
            diff,
            monitor: Some(monitor),
        }
    }

    /// Check if a diff is in flight
    pub fn is_diffing(&self) -> bool {
        self.diff.is_active()
    }

    /// Handle the startHeapDiff method
    fn handle_start_heap_diff(&self) -> Result<Value, AgentError> {
        debug!("HeapDiff.startHeapDiff called");
        run_blocking(|| self.diff.start_diff());
        Ok(json!({}))
    }

    /// Handle the stopHeapDiff method
    fn handle_stop_heap_diff(&self, params: Option<Value>) -> Result<Value, AgentError> {
        debug!("HeapDiff.stopHeapDiff called");

        let params: StopHeapDiffParams = match params {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| AgentError::invalid_params(e.to_string()))?,
            None => StopHeapDiffParams::default(),
        };

        let report = run_blocking(|| self.diff.stop_diff(params.want_report));
        Ok(json!({ "report": report }))
    }

    /// Handle the getStats method
    fn handle_get_stats(&self) -> Result<Value, AgentError> {
        serde_json::to_value(self.diff.stats())
            .map_err(|e| AgentError::internal_error(e.to_string()))
    }

    /// Handle the startInstanceMonitoring method
    fn handle_start_instance_monitoring(&self, method: &str) -> Result<Value, AgentError> {
        debug!("HeapDiff.startInstanceMonitoring called");
        let monitor = self.monitor(method)?;

        match run_blocking(|| monitor.start()) {
            Ok(()) => Ok(json!({ "started": true })),
            Err(MonitorError::AlreadyRunning) => Ok(json!({ "started": false })),
            Err(e) => Err(AgentError::internal_error(e.to_string())),
        }
    }

    /// Handle the stopInstanceMonitoring method
    fn handle_stop_instance_monitoring(&self, method: &str) -> Result<Value, AgentError> {
        debug!("HeapDiff.stopInstanceMonitoring called");
        let monitor = self.monitor(method)?;
        run_blocking(|| monitor.stop());
        Ok(json!({}))
    }

    fn monitor(&self, method: &str) -> Result<&InstanceMonitor, AgentError> {
        self.monitor
            .as_deref()
            .ok_or_else(|| AgentError::method_not_found(format!("HeapDiff.{}", method)))
    }
}

/// Run a heap-sized operation without starving the other runtime workers
///
/// `block_in_place` is unavailable on a current-thread runtime, where the
/// operation simply runs inline.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

#[async_trait]
impl DomainHandler for HeapDiffDomain {
    fn name(&self) -> &str {
        "HeapDiff"
    }

    async fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, AgentError> {
        debug!("HeapDiff domain handling method: {}", method);

        match method {
            "startHeapDiff" => self.handle_start_heap_diff(),
            "stopHeapDiff" => self.handle_stop_heap_diff(params),
            "getStats" => self.handle_get_stats(),
            "startInstanceMonitoring" => self.handle_start_instance_monitoring(method),
            "stopInstanceMonitoring" => self.handle_stop_instance_monitoring(method),
            _ => {
                warn!("Unknown HeapDiff method: {}", method);
                Err(AgentError::method_not_found(format!("HeapDiff.{}", method)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heap_graph::SimulatedHeap;
    use heapdiff::HeapDiff;

    fn domain() -> (Arc<SimulatedHeap>, HeapDiffDomain) {
        let heap = Arc::new(SimulatedHeap::new());
        let diff = Arc::new(HeapDiff::new(Arc::clone(&heap)));
        (heap, HeapDiffDomain::new(diff))
    }

    #[test]
    fn test_heap_diff_domain_new() {
        let (_, domain) = domain();
        assert_eq!(domain.name(), "HeapDiff");
        assert!(!domain.is_diffing());
    }

    #[test]
    fn test_get_stats_blocking() {
        let (_, domain) = domain();

        let stats = tokio_test::block_on(domain.handle_method("getStats", None)).unwrap();
        assert_eq!(stats["reports"], 0);
        assert_eq!(stats["droppedNames"], 0);
    }

    #[tokio::test]
    async fn test_start_stop_with_report() {
        let (heap, domain) = domain();

        let result = domain.handle_method("startHeapDiff", None).await.unwrap();
        assert_eq!(result, json!({}));
        assert!(domain.is_diffing());

        heap.allocate_rooted("Foo", 48);
        let result = domain
            .handle_method("stopHeapDiff", Some(json!({ "wantReport": true })))
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({ "report": [{ "type": "Foo", "total": 1, "size": 48 }] })
        );
        assert!(!domain.is_diffing());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_diff_on_multi_thread_runtime() {
        let (heap, domain) = domain();
        let ticker = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            "ticked"
        });

        domain.handle_method("startHeapDiff", None).await.unwrap();
        heap.allocate_rooted("Bar", 24);
        let result = domain
            .handle_method("stopHeapDiff", Some(json!({ "wantReport": true })))
            .await
            .unwrap();

        assert_eq!(result["report"][0]["type"], "Bar");
        assert_eq!(ticker.await.unwrap(), "ticked");
        assert_eq!(heap.live_snapshots(), 0);
    }

    #[test]
    fn test_run_blocking_outside_runtime() {
        assert_eq!(run_blocking(|| 7), 7);
    }

    #[tokio::test]
    async fn test_stop_without_params_discards() {
        let (heap, domain) = domain();

        domain.handle_method("startHeapDiff", None).await.unwrap();
        heap.allocate_rooted("Foo", 48);
        let result = domain.handle_method("stopHeapDiff", None).await.unwrap();

        assert!(result["report"].is_null());
        assert!(!domain.is_diffing());
    }

    #[tokio::test]
    async fn test_stop_with_bad_params() {
        let (_, domain) = domain();

        let result = domain
            .handle_method("stopHeapDiff", Some(json!({ "wantReport": "yes" })))
            .await;
        assert_eq!(result.unwrap_err().code, -32602);
    }

    #[tokio::test]
    async fn test_monitoring_without_monitor() {
        let (_, domain) = domain();

        let result = domain.handle_method("startInstanceMonitoring", None).await;
        assert_eq!(result.unwrap_err().code, -32601);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (_, domain) = domain();

        let result = domain.handle_method("takeHeapSnapshot", None).await;
        assert_eq!(result.unwrap_err().code, -32601);
    }
}
