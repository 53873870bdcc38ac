//! Configuration for the heap diff engine

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, Result};
use crate::key::{DEFAULT_MAX_KEY_LEN, INLINE_KEY_CAPACITY};

/// Configuration for [`HeapDiff`](crate::HeapDiff)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapDiffConfig {
    /// Longest type name, in bytes, that still forms a group
    max_key_len: usize,
}

impl HeapDiffConfig {
    /// Create a new builder for HeapDiffConfig
    ///
    /// # Example
    ///
    /// ```
    /// use heapdiff::HeapDiffConfig;
    ///
    /// let config = HeapDiffConfig::builder().max_key_len(1024).build();
    /// assert_eq!(config.max_key_len(), 1024);
    /// ```
    pub fn builder() -> HeapDiffConfigBuilder {
        HeapDiffConfigBuilder::default()
    }

    /// Get the key size ceiling
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// Check that the configuration is usable
    ///
    /// The ceiling may not be smaller than the inline key buffer.
    pub fn validate(&self) -> Result<()> {
        if self.max_key_len < INLINE_KEY_CAPACITY {
            return Err(DiffError::InvalidConfiguration(format!(
                "max_key_len must be at least {} bytes, got {}",
                INLINE_KEY_CAPACITY, self.max_key_len
            )));
        }
        Ok(())
    }
}

impl Default for HeapDiffConfig {
    /// Default values:
    /// - max_key_len: 4096 bytes
    fn default() -> Self {
        Self {
            max_key_len: DEFAULT_MAX_KEY_LEN,
        }
    }
}

/// Builder for HeapDiffConfig
#[derive(Debug, Clone, Default)]
pub struct HeapDiffConfigBuilder {
    max_key_len: Option<usize>,
}

impl HeapDiffConfigBuilder {
    /// Set the key size ceiling in bytes
    pub fn max_key_len(mut self, len: usize) -> Self {
        self.max_key_len = Some(len);
        self
    }

    /// Build the HeapDiffConfig
    ///
    /// Uses default values for any options not explicitly set.
    pub fn build(self) -> HeapDiffConfig {
        let default = HeapDiffConfig::default();
        HeapDiffConfig {
            max_key_len: self.max_key_len.unwrap_or(default.max_key_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HeapDiffConfig::default();
        assert_eq!(config.max_key_len(), 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_no_options() {
        assert_eq!(HeapDiffConfig::builder().build(), HeapDiffConfig::default());
    }

    #[test]
    fn test_ceiling_below_inline_capacity_is_rejected() {
        let config = HeapDiffConfig::builder().max_key_len(8).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let json = serde_json::to_string(&HeapDiffConfig::default()).unwrap();
        assert_eq!(json, r#"{"maxKeyLen":4096}"#);
    }
}
