//! Error types for the heap agent

use thiserror::Error;

/// Errors that can occur in heap agent operations
#[derive(Error, Debug)]
pub enum HeapAgentError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Instance monitor error
    #[error("Instance monitor error: {0}")]
    Monitor(#[from] profiler_domains::MonitorError),

    /// Heap diff engine error
    #[error("Heap diff error: {0}")]
    Diff(#[from] heapdiff::DiffError),

    /// Failure while producing a protocol message
    #[error("Protocol error: {0}")]
    Protocol(#[from] agent_types::AgentError),

    /// The instance monitor went away
    #[error("Event stream closed")]
    EventsClosed,

    /// Other errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for heap agent operations
pub type Result<T> = std::result::Result<T, HeapAgentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use profiler_domains::MonitorError;

    #[test]
    fn test_error_display() {
        let err = HeapAgentError::InvalidConfiguration("test".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: test");

        let err: HeapAgentError = MonitorError::AlreadyRunning.into();
        assert_eq!(
            err.to_string(),
            "Instance monitor error: Instance monitoring is already running"
        );
    }

    #[test]
    fn test_anyhow_is_transparent() {
        let err: HeapAgentError = anyhow::anyhow!("snapshot backend gone").into();
        assert_eq!(err.to_string(), "snapshot backend gone");
    }
}
