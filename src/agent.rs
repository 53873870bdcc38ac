//! Heap agent implementation

use agent_types::AgentEvent;
use heap_graph::SnapshotProvider;
use heapdiff::{DiffReport, DiffSession, DiffStats, HeapDiff};
use profiler_domains::{HeapDiffDomain, InstanceMonitor, InstancesEvent};
use protocol_handler::ProtocolHandler;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::{AgentConfig, HeapAgentError, Result};

/// Heap agent that wires the diff engine, the instance monitor and the
/// protocol router around one snapshot provider
///
/// # Example
///
/// ```
/// use heap_agent::{AgentConfig, HeapAgent};
/// use heap_graph::SimulatedHeap;
/// use std::sync::Arc;
///
/// let heap = Arc::new(SimulatedHeap::new());
/// let agent = HeapAgent::new(Arc::clone(&heap), AgentConfig::default()).unwrap();
///
/// agent.start_diff();
/// heap.allocate_rooted("Widget", 16);
/// let report = agent.stop_diff(true).unwrap();
/// assert_eq!(report.get("Widget").unwrap().size, 16);
/// ```
pub struct HeapAgent<P>
where
    P: SnapshotProvider + Send + Sync + 'static,
    P::Graph: Send + 'static,
{
    /// Configuration for this agent
    config: AgentConfig,

    /// Diff orchestrator shared by the domain and the monitor
    diff: Arc<HeapDiff<P>>,

    /// Periodic instance monitor
    monitor: Arc<InstanceMonitor>,

    /// Protocol handler that routes messages to the HeapDiff domain
    protocol_handler: ProtocolHandler,
}

impl<P> HeapAgent<P>
where
    P: SnapshotProvider + Send + Sync + 'static,
    P::Graph: Send + 'static,
{
    /// Create a new HeapAgent for a snapshot provider
    ///
    /// Validates the configuration and registers the HeapDiff domain.
    pub fn new(provider: P, config: AgentConfig) -> Result<Self> {
        debug!("Creating HeapAgent with config: {:?}", config);
        config.validate()?;

        let diff = Arc::new(HeapDiff::with_config(provider, config.heapdiff().clone())?);
        let session: Arc<dyn DiffSession> = diff.clone();
        let monitor = Arc::new(InstanceMonitor::with_capacity(
            Arc::clone(&session),
            config.monitor_interval(),
            config.event_capacity(),
        ));

        let protocol_handler = ProtocolHandler::new();
        protocol_handler.register_domain(Arc::new(HeapDiffDomain::with_monitor(
            session,
            Arc::clone(&monitor),
        )));

        Ok(Self {
            config,
            diff,
            monitor,
            protocol_handler,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Get the snapshot provider
    pub fn provider(&self) -> &P {
        self.diff.provider()
    }

    /// Handle a raw JSON protocol message and return the JSON response
    pub async fn handle_message(&self, message: &str) -> String {
        self.protocol_handler.handle_message(message).await
    }

    /// Get the names of all registered domains
    pub fn registered_domains(&self) -> Vec<String> {
        self.protocol_handler.registered_domains()
    }

    /// Begin a diff session
    pub fn start_diff(&self) {
        self.diff.start_diff();
    }

    /// End the diff session, optionally computing a report
    pub fn stop_diff(&self, want_report: bool) -> Option<DiffReport> {
        self.diff.stop_diff(want_report)
    }

    /// Whether a diff is in flight
    pub fn is_diffing(&self) -> bool {
        self.diff.is_active()
    }

    /// Cumulative diff counters
    pub fn stats(&self) -> DiffStats {
        self.diff.stats()
    }

    /// Start periodic instance monitoring
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_monitoring(&self) -> Result<()> {
        self.monitor.start()?;
        Ok(())
    }

    /// Stop periodic instance monitoring
    pub fn stop_monitoring(&self) {
        self.monitor.stop();
    }

    /// Whether instance monitoring is active
    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    /// Subscribe to `Instances` events
    pub fn subscribe_instances(&self) -> broadcast::Receiver<InstancesEvent> {
        self.monitor.subscribe()
    }

    /// Subscribe to `Instances` events as protocol events
    pub fn subscribe_events(&self) -> AgentEvents {
        AgentEvents {
            receiver: self.monitor.subscribe(),
        }
    }
}

/// Stream of `HeapDiff.instances` protocol events
#[derive(Debug)]
pub struct AgentEvents {
    receiver: broadcast::Receiver<InstancesEvent>,
}

impl AgentEvents {
    /// Wait for the next event
    ///
    /// Events dropped because this subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Result<AgentEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event.to_agent_event()?),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, {} instance events dropped", skipped);
                }
                Err(RecvError::Closed) => return Err(HeapAgentError::EventsClosed),
            }
        }
    }
}

impl<P> std::fmt::Debug for HeapAgent<P>
where
    P: SnapshotProvider + Send + Sync + 'static,
    P::Graph: Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapAgent")
            .field("config", &self.config)
            .field("monitor", &self.monitor)
            .finish()
    }
}
