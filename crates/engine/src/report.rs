//! Diagnostic state report
//!
//! The serializable snapshot behind `queryState()`: the transaction table
//! and per-site status at the moment the command ran. Rendered by the CLI
//! as pretty JSON.

use repkv_concurrency::TransactionStatus;
use repkv_core::{SiteId, Timestamp, TranId, VarId};
use serde::Serialize;

/// Full coordinator state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateReport {
    /// Logical time the report was taken at.
    pub now: Timestamp,
    /// Every transaction in the table, in ascending ID order.
    pub transactions: Vec<TransactionReport>,
    /// Every site, in ascending ID order.
    pub sites: Vec<SiteReport>,
}

/// One transaction table entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionReport {
    /// Transaction identifier.
    pub id: TranId,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Snapshot time.
    pub started_at: Timestamp,
    /// Variables read, ascending.
    pub reads: Vec<VarId>,
    /// Staged writes, ascending by variable.
    pub writes: Vec<WriteReport>,
}

/// One staged write of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WriteReport {
    /// Variable written.
    pub var: VarId,
    /// Staged value.
    pub value: i64,
    /// Tick the write command was processed at.
    pub issued_at: Timestamp,
}

/// Liveness and buffer occupancy of one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteReport {
    /// Site identifier.
    pub id: SiteId,
    /// Whether the site is up.
    pub available: bool,
    /// Last failure time, if the site ever failed.
    pub last_failed: Option<Timestamp>,
    /// Last recovery time (zero if never recovered).
    pub last_recovered: Timestamp,
    /// Buffered uncommitted writes per transaction.
    pub buffered: Vec<BufferReport>,
}

/// Buffered-write count for one transaction at one site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BufferReport {
    /// The buffering transaction.
    pub tran: TranId,
    /// Number of variables it has staged at this site.
    pub staged: usize,
}
