//! Heap diff orchestration
//!
//! [`HeapDiff`] owns at most one baseline snapshot. `start_diff` captures it,
//! `stop_diff` captures a second snapshot, collects the reachable identities
//! of both, and merge-joins the two id-ordered sets in a single pass: ids only
//! in the final set are scored as created, ids only in the baseline as
//! reclaimed. Only object nodes are scored, grouped by class name.
//!
//! Only one diff can be in flight per orchestrator. A second `start_diff`
//! while a baseline is outstanding keeps the original baseline.

use heap_graph::{GraphNode, HeapGraph, SnapshotProvider};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::collector::{collect, Reachable, ReachabilitySet};
use crate::config::HeapDiffConfig;
use crate::error::{DiffError, Result};
use crate::key::GroupKey;
use crate::report::{DiffRecord, DiffReport};
use crate::score::Score;

/// Outcome of comparing two snapshots
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Per-type changes
    pub report: DiffReport,
    /// Reachable nodes present only in the final snapshot
    pub added: usize,
    /// Reachable nodes present only in the baseline
    pub removed: usize,
    /// Object nodes left out because their name could not form a key
    pub dropped_names: usize,
}

/// Cumulative counters for one orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    /// Diffs that produced a report
    pub reports: u64,
    /// Diffs stopped without a report
    pub discarded: u64,
    /// Diffs whose report could not be built
    pub failed: u64,
    /// Object nodes dropped for unusable names, over all diffs
    pub dropped_names: u64,
}

/// Walk two id-ordered sets once, reporting entries unique to either side
fn merge_join(
    start: &ReachabilitySet,
    end: &ReachabilitySet,
    mut only_in_start: impl FnMut(&Reachable),
    mut only_in_end: impl FnMut(&Reachable),
) {
    let mut left = start.iter().peekable();
    let mut right = end.iter().peekable();

    loop {
        match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => match a.id.cmp(&b.id) {
                Ordering::Less => {
                    only_in_start(a);
                    left.next();
                }
                Ordering::Greater => {
                    only_in_end(b);
                    right.next();
                }
                Ordering::Equal => {
                    left.next();
                    right.next();
                }
            },
            (Some(a), None) => {
                only_in_start(a);
                left.next();
            }
            (None, Some(b)) => {
                only_in_end(b);
                right.next();
            }
            (None, None) => break,
        }
    }
}

struct Summarizer {
    scores: BTreeMap<GroupKey, Score>,
    max_key_len: usize,
    dropped_names: usize,
}

impl Summarizer {
    fn apply<G: HeapGraph + ?Sized>(
        &mut self,
        graph: &G,
        entry: &Reachable,
        update: fn(&mut Score, &GraphNode<'_>),
    ) {
        let Some(node) = graph.node(entry.index) else {
            return;
        };
        if !node.node_type.is_object() {
            return;
        }
        let key = match GroupKey::new(node.name, self.max_key_len) {
            Ok(key) => key,
            Err(e) => {
                debug!("Dropping {} from heap diff: {}", node.id, e);
                self.dropped_names += 1;
                return;
            }
        };
        update(self.scores.entry(key).or_default(), &node);
    }

    fn into_report(self) -> Result<DiffReport> {
        let mut records = Vec::new();
        records.try_reserve_exact(self.scores.len())?;
        for (key, score) in self.scores {
            records.push(DiffRecord {
                type_name: key.type_name().into_owned(),
                total: score.count(),
                size: score.size(),
            });
        }
        Ok(DiffReport::from_records(records))
    }
}

/// Compare two snapshots of the same heap
///
/// `start` is the baseline and `end` the later capture. Swapping them negates
/// every record.
pub fn summarize<G: HeapGraph + ?Sized>(
    start: &G,
    end: &G,
    config: &HeapDiffConfig,
) -> Result<DiffSummary> {
    let start_set = collect(start);
    let end_set = collect(end);

    let mut summarizer = Summarizer {
        scores: BTreeMap::new(),
        max_key_len: config.max_key_len(),
        dropped_names: 0,
    };
    let mut added = Vec::new();
    let mut removed = Vec::new();
    merge_join(
        &start_set,
        &end_set,
        |entry| removed.push(*entry),
        |entry| added.push(*entry),
    );

    for entry in &added {
        summarizer.apply(end, entry, Score::plus);
    }
    for entry in &removed {
        summarizer.apply(start, entry, Score::minus);
    }

    let dropped_names = summarizer.dropped_names;
    let report = summarizer.into_report()?;
    debug!(
        "Heap diff: {} added, {} removed, {} groups, {} dropped names",
        added.len(),
        removed.len(),
        report.len(),
        dropped_names
    );

    Ok(DiffSummary {
        report,
        added: added.len(),
        removed: removed.len(),
        dropped_names,
    })
}

/// Heap diff session orchestrator
///
/// Start and stop run synchronously on the caller's thread and block for a
/// time proportional to the live heap. The baseline slot sits behind a mutex
/// so an orchestrator can be shared between threads, but there is still only
/// one slot.
pub struct HeapDiff<P: SnapshotProvider> {
    /// Snapshot source
    provider: P,
    /// Engine configuration
    config: HeapDiffConfig,
    /// Outstanding baseline snapshot, if a diff is in flight
    baseline: Mutex<Option<P::Graph>>,
    /// Cumulative counters
    stats: RwLock<DiffStats>,
}

impl<P: SnapshotProvider> HeapDiff<P> {
    /// Create an orchestrator with the default configuration
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: HeapDiffConfig::default(),
            baseline: Mutex::new(None),
            stats: RwLock::new(DiffStats::default()),
        }
    }

    /// Create an orchestrator with a custom configuration
    pub fn with_config(provider: P, config: HeapDiffConfig) -> Result<Self> {
        config.validate()?;
        let mut diff = Self::new(provider);
        diff.config = config;
        Ok(diff)
    }

    /// Get the configuration
    pub fn config(&self) -> &HeapDiffConfig {
        &self.config
    }

    /// Get the snapshot provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Whether a baseline is outstanding
    pub fn is_active(&self) -> bool {
        self.baseline.lock().is_some()
    }

    /// Snapshot of the cumulative counters
    pub fn stats(&self) -> DiffStats {
        self.stats.read().clone()
    }

    /// Begin a diff session
    ///
    /// Captures the baseline snapshot. Does nothing if a baseline is already
    /// outstanding; the original baseline stays authoritative.
    pub fn start_diff(&self) {
        let mut baseline = self.baseline.lock();
        if baseline.is_some() {
            debug!("Heap diff already in progress, keeping existing baseline");
            return;
        }

        debug!("Capturing heap diff baseline");
        *baseline = Some(self.provider.take_snapshot());
    }

    /// End the diff session
    ///
    /// With `want_report` the final snapshot is captured and compared against
    /// the baseline. Without it the baseline is released and nothing is
    /// computed. Returns `None` when no session was active, when no report
    /// was requested, or when the report could not be built.
    pub fn stop_diff(&self, want_report: bool) -> Option<DiffReport> {
        let mut baseline = self.baseline.lock();
        let Some(start) = baseline.take() else {
            debug!("stop_diff called without an active heap diff");
            return None;
        };

        if !want_report {
            self.provider.release(start);
            self.stats.write().discarded += 1;
            debug!("Heap diff discarded");
            return None;
        }

        let end = self.provider.take_snapshot();
        let result = summarize(&start, &end, &self.config);
        self.provider.release(start);
        self.provider.release(end);
        drop(baseline);

        match result {
            Ok(summary) => {
                let mut stats = self.stats.write();
                stats.reports += 1;
                stats.dropped_names += summary.dropped_names as u64;
                info!(
                    "Heap diff complete: {} types changed ({} added, {} removed)",
                    summary.report.len(),
                    summary.added,
                    summary.removed
                );
                Some(summary.report)
            }
            Err(DiffError::ReportAllocation(e)) => {
                self.stats.write().failed += 1;
                warn!("Heap diff report abandoned: {}", e);
                None
            }
            Err(e) => {
                self.stats.write().failed += 1;
                warn!("Heap diff failed: {}", e);
                None
            }
        }
    }
}

/// Object-safe view of a diff orchestrator
///
/// Lets export layers hold an orchestrator without naming its snapshot
/// provider.
pub trait DiffSession: Send + Sync {
    /// Begin a diff session; no-op while one is active
    fn start_diff(&self);

    /// End the diff session, optionally computing a report
    fn stop_diff(&self, want_report: bool) -> Option<DiffReport>;

    /// Whether a baseline is outstanding
    fn is_active(&self) -> bool;

    /// Cumulative counters
    fn stats(&self) -> DiffStats;
}

impl<P> DiffSession for HeapDiff<P>
where
    P: SnapshotProvider + Send + Sync,
    P::Graph: Send,
{
    fn start_diff(&self) {
        HeapDiff::start_diff(self)
    }

    fn stop_diff(&self, want_report: bool) -> Option<DiffReport> {
        HeapDiff::stop_diff(self, want_report)
    }

    fn is_active(&self) -> bool {
        HeapDiff::is_active(self)
    }

    fn stats(&self) -> DiffStats {
        HeapDiff::stats(self)
    }
}

impl<P: SnapshotProvider> Drop for HeapDiff<P> {
    fn drop(&mut self) {
        if let Some(start) = self.baseline.get_mut().take() {
            self.provider.release(start);
        }
    }
}

impl<P: SnapshotProvider> std::fmt::Debug for HeapDiff<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapDiff")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .field("stats", &self.stats())
            .finish()
    }
}
