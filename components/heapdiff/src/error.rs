//! Error types for the heap diff engine

use std::collections::TryReserveError;
use thiserror::Error;

/// Errors raised while building a grouping key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The type name needs a buffer past the key size ceiling
    #[error("Type name of {len} bytes exceeds the {max} byte key limit")]
    NameTooLong {
        /// Length of the rejected name in bytes
        len: usize,
        /// Configured ceiling
        max: usize,
    },

    /// Empty type names never form a group
    #[error("Type name is empty")]
    EmptyName,
}

/// Errors that can occur while computing a heap diff
#[derive(Error, Debug)]
pub enum DiffError {
    /// Storage for the report could not be reserved
    #[error("Failed to allocate report: {0}")]
    ReportAllocation(#[from] TryReserveError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for heap diff operations
pub type Result<T> = std::result::Result<T, DiffError>;
