//! Per-transaction record
//!
//! The coordinator keeps one `Transaction` per ID it has seen `begin` for.
//! Committed records are retained (the serialization graph needs committed
//! peers visible to later cycle checks); aborted records are dropped.

use repkv_core::{Timestamp, TranId, VarId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle status of a transaction.
///
/// Transitions:
/// - `Active` → `Blocked` (read stalled on a failed site)
/// - `Blocked` → `Active` (site recovery re-served the read)
/// - `Active` | `Blocked` → `Aborted`
/// - `Active` → `Committed`
///
/// `Committed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Executing; reads and writes are accepted.
    Active,
    /// Waiting for a site to recover before a read can be served.
    Blocked,
    /// Validation passed and writes were applied.
    Committed,
    /// Aborted, or marked for abort at its own `end`.
    Aborted,
}

/// A staged write: the value and the time the write command was issued.
///
/// The issue time is compared against site fail times at `end`: a site
/// that failed after the write was issued has lost the buffered copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StagedWrite {
    /// Value to be committed.
    pub value: i64,
    /// Logical time the write command was processed.
    pub issued_at: Timestamp,
}

/// One entry in the coordinator's transaction table.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Transaction identifier.
    pub id: TranId,
    /// Snapshot time, captured at `begin`.
    pub started_at: Timestamp,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// Variables this transaction has read (or is blocked trying to read).
    pub reads: BTreeSet<VarId>,
    /// Staged writes, latest value per variable.
    pub writes: BTreeMap<VarId, StagedWrite>,
}

impl Transaction {
    /// A fresh Active transaction starting at `now`.
    pub fn new(id: TranId, now: Timestamp) -> Self {
        Transaction {
            id,
            started_at: now,
            status: TransactionStatus::Active,
            reads: BTreeSet::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Whether the transaction still accepts reads and writes.
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Record a (possibly tentative) read of `var`.
    pub fn record_read(&mut self, var: VarId) {
        self.reads.insert(var);
    }

    /// Stage a write of `var`; a repeated write overwrites the value and
    /// refreshes the issue time.
    pub fn stage_write(&mut self, var: VarId, value: i64, now: Timestamp) {
        self.writes.insert(
            var,
            StagedWrite {
                value,
                issued_at: now,
            },
        );
    }

    /// Whether this transaction has staged a write of `var`.
    pub fn has_written(&self, var: VarId) -> bool {
        self.writes.contains_key(&var)
    }

    /// Whether this transaction has read `var`.
    pub fn has_read(&self, var: VarId) -> bool {
        self.reads.contains(&var)
    }
}
