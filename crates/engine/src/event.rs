//! Observable output of the coordinator
//!
//! Each command produces zero or more events, in output order. The CLI
//! owns the textual rendering; tests match on the variants directly.

use crate::report::StateReport;
use repkv_core::{Error, SiteId, TranId, VarId};

/// One observable outcome of applying a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A read was served: `xJ: V`.
    ReadValue {
        /// Variable read.
        var: VarId,
        /// Snapshot value served.
        value: i64,
    },
    /// A read is blocked on a failed site: `TI waits for site S`.
    WaitsForSite {
        /// The blocked transaction.
        tran: TranId,
        /// The site it waits on.
        site: SiteId,
    },
    /// Validation passed: `TI commits`.
    Committed(TranId),
    /// The transaction aborted: `TI aborts`.
    Aborted(TranId),
    /// A site recovery re-served a blocked read: `TI unblocked` followed
    /// by the `xJ: V` line.
    Unblocked {
        /// The re-activated transaction.
        tran: TranId,
        /// The variable whose read was finally served.
        var: VarId,
        /// The value served.
        value: i64,
    },
    /// No site could buffer a staged write: `Write Failed`.
    WriteFailed,
    /// One line of `dump()` output: a site and its committed values in
    /// ascending variable order.
    SiteDump {
        /// The site being dumped.
        site: SiteId,
        /// `(variable, committed value)` pairs.
        values: Vec<(VarId, i64)>,
    },
    /// The `queryState()` diagnostic report.
    StateReport(StateReport),
    /// A control-plane mistake; rendered as its one-line diagnostic.
    Rejected(Error),
}
