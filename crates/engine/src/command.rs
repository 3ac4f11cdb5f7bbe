//! Coordinator instruction set
//!
//! One variant per line of the command stream. Site numbers stay raw here;
//! the coordinator validates them against the topology so that a bad
//! number in the script becomes a diagnostic, not a parser failure.

use repkv_core::{TranId, VarId};

/// A single command from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `begin(Ti)`: start transaction `i` at the current tick.
    Begin(TranId),
    /// `R(Ti, xj)`: read variable `j` in transaction `i`.
    Read(TranId, VarId),
    /// `W(Ti, xj, v)`: stage a write of `v` to variable `j`.
    Write(TranId, VarId, i64),
    /// `end(Ti)`: validate and commit or abort transaction `i`.
    End(TranId),
    /// `fail(k)`: take site `k` down.
    Fail(u32),
    /// `recover(k)`: bring site `k` back up.
    Recover(u32),
    /// `dump()`: print every site's committed values.
    Dump,
    /// `queryState()`: emit the diagnostic state report.
    QueryState,
}
