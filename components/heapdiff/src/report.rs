//! Heap diff report types
//!
//! A report serializes as a plain JSON array:
//!
//! ```text
//! [ { "type": "Timeout", "total": 1, "size": 136 },
//!   { "type": "Timer", "total": 2, "size": 64 } ]
//! ```
//!
//! `total` is the net number of instances created between the two snapshots
//! and `size` the net aggregated shallow size. Negative values mean more
//! instances were reclaimed than created.
//!
//! The two fields usually share a sign, but nothing guarantees it: a type whose
//! reclaimed instances were larger than its new ones reports a positive
//! `total` with a negative `size`. Treat them as independent numbers.

use serde::{Deserialize, Serialize};

/// Net population change for one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    /// Class name of the objects
    #[serde(rename = "type")]
    pub type_name: String,
    /// Net instance count
    pub total: i64,
    /// Net shallow size in bytes
    pub size: i64,
}

impl DiffRecord {
    /// Create a new record
    pub fn new(type_name: impl Into<String>, total: i64, size: i64) -> Self {
        Self {
            type_name: type_name.into(),
            total,
            size,
        }
    }
}

/// Ordered list of per-type changes
///
/// Records come in grouping-key order (hash, length, bytes). Consumers that
/// want magnitude ordering use [`sorted_by_size`](Self::sorted_by_size).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffReport {
    records: Vec<DiffRecord>,
}

impl DiffReport {
    /// Create a report from records already in canonical order
    pub fn from_records(records: Vec<DiffRecord>) -> Self {
        Self { records }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the report has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in canonical order
    pub fn records(&self) -> &[DiffRecord] {
        &self.records
    }

    /// Iterate over the records
    pub fn iter(&self) -> std::slice::Iter<'_, DiffRecord> {
        self.records.iter()
    }

    /// Find the record for a type name
    pub fn get(&self, type_name: &str) -> Option<&DiffRecord> {
        self.records.iter().find(|r| r.type_name == type_name)
    }

    /// Records ordered by absolute size change, largest first
    ///
    /// Ties are broken by type name so the result is deterministic.
    pub fn sorted_by_size(&self) -> Vec<DiffRecord> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| {
            b.size
                .unsigned_abs()
                .cmp(&a.size.unsigned_abs())
                .then_with(|| a.type_name.cmp(&b.type_name))
        });
        records
    }

    /// Consume the report, returning its records
    pub fn into_records(self) -> Vec<DiffRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a DiffReport {
    type Item = &'a DiffRecord;
    type IntoIter = std::slice::Iter<'a, DiffRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
