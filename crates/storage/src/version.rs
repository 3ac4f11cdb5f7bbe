//! Committed variable state with version history
//!
//! Every commit appends a `(commit time, value)` entry; history is never
//! pruned. Snapshot reads resolve to the newest entry at or before the
//! reader's start time.

use repkv_core::Timestamp;
use std::collections::BTreeMap;

/// A variable as stored at one site: the current committed value, the time
/// it was committed, and the full time-ordered version history.
#[derive(Debug, Clone)]
pub struct Variable {
    value: i64,
    last_commit: Timestamp,
    history: BTreeMap<Timestamp, i64>,
}

impl Variable {
    /// A freshly seeded variable: `initial` committed at time zero.
    pub fn seeded(initial: i64) -> Self {
        let mut history = BTreeMap::new();
        history.insert(0, initial);
        Variable {
            value: initial,
            last_commit: 0,
            history,
        }
    }

    /// Current committed value.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Time of the most recent commit.
    pub fn last_commit(&self) -> Timestamp {
        self.last_commit
    }

    /// The newest version at or before `at`, as `(commit time, value)`.
    ///
    /// Returns `None` when `at` precedes every version.
    pub fn visible_at(&self, at: Timestamp) -> Option<(Timestamp, i64)> {
        self.history
            .range(..=at)
            .next_back()
            .map(|(t, v)| (*t, *v))
    }

    /// Append a committed version. `at` must be strictly greater than every
    /// existing entry; the current value and last-commit time move with the
    /// append.
    pub fn commit(&mut self, at: Timestamp, value: i64) {
        debug_assert!(
            at > self.last_commit,
            "commit time {at} not after {}",
            self.last_commit
        );
        self.history.insert(at, value);
        self.value = value;
        self.last_commit = at;
    }

    /// Number of versions in the history.
    pub fn version_count(&self) -> usize {
        self.history.len()
    }
}
