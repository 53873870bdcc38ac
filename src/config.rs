//! Configuration for the heap agent

use heapdiff::HeapDiffConfig;
use profiler_domains::{DEFAULT_EVENT_CAPACITY, DEFAULT_MONITOR_INTERVAL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{HeapAgentError, Result};

/// Configuration for the heap agent
///
/// Holds the diff engine settings together with the instance monitor's
/// timer interval and event channel capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Diff engine settings
    heapdiff: HeapDiffConfig,

    /// Time between two instance monitor steps
    monitor_interval: Duration,

    /// Buffered `Instances` events per subscriber
    event_capacity: usize,
}

impl AgentConfig {
    /// Create a new builder for AgentConfig
    ///
    /// # Example
    ///
    /// ```
    /// use heap_agent::AgentConfig;
    /// use std::time::Duration;
    ///
    /// let config = AgentConfig::builder()
    ///     .monitor_interval(Duration::from_secs(5))
    ///     .build();
    /// assert_eq!(config.monitor_interval(), Duration::from_secs(5));
    /// ```
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Get the diff engine settings
    pub fn heapdiff(&self) -> &HeapDiffConfig {
        &self.heapdiff
    }

    /// Get the monitor interval
    pub fn monitor_interval(&self) -> Duration {
        self.monitor_interval
    }

    /// Get the event channel capacity
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        self.heapdiff
            .validate()
            .map_err(|e| HeapAgentError::InvalidConfiguration(e.to_string()))?;

        if self.monitor_interval.is_zero() {
            return Err(HeapAgentError::InvalidConfiguration(
                "monitor_interval must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(HeapAgentError::InvalidConfiguration(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    /// Create a default configuration
    ///
    /// Default values:
    /// - heapdiff: `HeapDiffConfig::default()`
    /// - monitor_interval: 15 seconds
    /// - event_capacity: 64
    fn default() -> Self {
        Self {
            heapdiff: HeapDiffConfig::default(),
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Builder for AgentConfig
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    heapdiff: Option<HeapDiffConfig>,
    monitor_interval: Option<Duration>,
    event_capacity: Option<usize>,
}

impl AgentConfigBuilder {
    /// Set the diff engine settings
    pub fn heapdiff(mut self, config: HeapDiffConfig) -> Self {
        self.heapdiff = Some(config);
        self
    }

    /// Set the instance monitor interval
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between two steps
    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = Some(interval);
        self
    }

    /// Set the event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Build the AgentConfig
    ///
    /// Uses default values for any options not explicitly set.
    pub fn build(self) -> AgentConfig {
        let default = AgentConfig::default();

        AgentConfig {
            heapdiff: self.heapdiff.unwrap_or(default.heapdiff),
            monitor_interval: self.monitor_interval.unwrap_or(default.monitor_interval),
            event_capacity: self.event_capacity.unwrap_or(default.event_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();

        assert_eq!(config.heapdiff().max_key_len(), 4096);
        assert_eq!(config.monitor_interval(), Duration::from_secs(15));
        assert_eq!(config.event_capacity(), 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_all_options() {
        let config = AgentConfig::builder()
            .heapdiff(HeapDiffConfig::builder().max_key_len(256).build())
            .monitor_interval(Duration::from_millis(500))
            .event_capacity(8)
            .build();

        assert_eq!(config.heapdiff().max_key_len(), 256);
        assert_eq!(config.monitor_interval(), Duration::from_millis(500));
        assert_eq!(config.event_capacity(), 8);
    }

    #[test]
    fn test_builder_no_options() {
        assert_eq!(AgentConfig::builder().build(), AgentConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AgentConfig::builder()
            .monitor_interval(Duration::ZERO)
            .build();
        assert!(matches!(
            config.validate(),
            Err(HeapAgentError::InvalidConfiguration(_))
        ));

        let config = AgentConfig::builder()
            .heapdiff(HeapDiffConfig::builder().max_key_len(4).build())
            .build();
        assert!(config.validate().is_err());

        let config = AgentConfig::builder().event_capacity(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_clone() {
        let config = AgentConfig::builder().event_capacity(3).build();
        let cloned = config.clone();
        assert_eq!(cloned.event_capacity(), 3);
    }
}
