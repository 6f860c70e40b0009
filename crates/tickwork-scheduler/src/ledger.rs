//! Bounded, capture-ordered history of health snapshots plus the execution
//! counter the monitoring job maintains alongside it.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::HealthSnapshot;

/// Ordered by `captured_at`, never longer than `max_retention`.
///
/// Not synchronised on its own; [`crate::state::SharedState`] keeps it behind
/// a lock.
#[derive(Debug, Clone)]
pub struct MetricsLedger {
    entries: VecDeque<HealthSnapshot>,
    max_retention: usize,
    executed: u64,
}

impl MetricsLedger {
    pub fn new(max_retention: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_retention.min(1024)),
            max_retention,
            executed: 0,
        }
    }

    /// Insert at the tail, then drop from the head until the cap holds.
    ///
    /// A snapshot captured earlier than the current tail is placed at its
    /// ordered position so `captured_at` stays non-decreasing.
    pub fn append(&mut self, snapshot: HealthSnapshot) {
        let at = self
            .entries
            .partition_point(|e| e.captured_at <= snapshot.captured_at);
        if at == self.entries.len() {
            self.entries.push_back(snapshot);
        } else {
            self.entries.insert(at, snapshot);
        }
        while self.entries.len() > self.max_retention {
            self.entries.pop_front();
        }
    }

    /// Remove every entry captured at or before `cutoff`. Returns how many
    /// were removed.
    pub fn evict_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let expired = self.entries.partition_point(|e| e.captured_at <= cutoff);
        self.entries.drain(..expired);
        expired
    }

    /// The `n` most recent entries in capture order.
    pub fn last_n(&self, n: usize) -> Vec<HealthSnapshot> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn entries(&self) -> Vec<HealthSnapshot> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_retention(&self) -> usize {
        self.max_retention
    }

    /// Bump the execution counter; returns the new total.
    pub fn record_execution(&mut self) -> u64 {
        self.executed += 1;
        self.executed
    }

    pub fn total_executed(&self) -> u64 {
        self.executed
    }
}
