//! Type definitions for the heap diff export layer

use agent_types::{AgentError, AgentEvent};
use heapdiff::DiffReport;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event type tag carried by every instance event
pub const INSTANCES_EVENT_TYPE: &str = "Instances";

/// Protocol method under which instance events are delivered
pub const INSTANCES_EVENT_METHOD: &str = "HeapDiff.instances";

/// Periodic instance-count report emitted by the monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancesEvent {
    /// Always `"Instances"`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Changes since the previous step; `null` when no report was produced
    pub state: Option<DiffReport>,
}

impl InstancesEvent {
    /// Create an event for a step result
    pub fn new(state: Option<DiffReport>) -> Self {
        Self {
            event_type: INSTANCES_EVENT_TYPE.to_string(),
            state,
        }
    }

    /// Wrap the event for delivery over the agent protocol
    pub fn to_agent_event(&self) -> Result<AgentEvent, AgentError> {
        let params =
            serde_json::to_value(self).map_err(|e| AgentError::internal_error(e.to_string()))?;
        Ok(AgentEvent::new(INSTANCES_EVENT_METHOD, params))
    }
}

/// Parameters of `HeapDiff.stopHeapDiff`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopHeapDiffParams {
    /// Compute and return a report instead of discarding the baseline
    #[serde(default)]
    pub want_report: bool,
}

/// Errors raised by the instance monitor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// Monitoring is already running
    #[error("Instance monitoring is already running")]
    AlreadyRunning,

    /// No tokio runtime is available to drive the timer
    #[error("Instance monitoring requires a tokio runtime")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapdiff::DiffRecord;
    use serde_json::json;

    #[test]
    fn test_instances_event_shape() {
        let report = DiffReport::from_records(vec![DiffRecord::new("Timer", 2, 64)]);
        let event = InstancesEvent::new(Some(report));

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "Instances",
                "state": [{ "type": "Timer", "total": 2, "size": 64 }]
            })
        );
    }

    #[test]
    fn test_agent_event_wrapping() {
        let report = DiffReport::from_records(vec![DiffRecord::new("Timer", -1, -32)]);
        let event = InstancesEvent::new(Some(report)).to_agent_event().unwrap();

        assert_eq!(event.method, "HeapDiff.instances");
        assert_eq!(
            event.params,
            json!({
                "type": "Instances",
                "state": [{ "type": "Timer", "total": -1, "size": -32 }]
            })
        );
    }

    #[test]
    fn test_empty_state_is_null() {
        let value = serde_json::to_value(InstancesEvent::new(None)).unwrap();
        assert!(value["state"].is_null());
    }

    #[test]
    fn test_stop_params_default_to_discard() {
        let params: StopHeapDiffParams = serde_json::from_value(json!({})).unwrap();
        assert!(!params.want_report);
    }
}
