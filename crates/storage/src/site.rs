//! One replica node
//!
//! A `Site` owns the variables it replicates, an availability flag with the
//! last fail/recover timestamps, and a buffer of uncommitted writes keyed
//! by transaction. Failure erases the buffer but never the committed
//! version histories; what a snapshot can see across a failure is decided
//! by [`Site::read`].

use crate::version::Variable;
use repkv_core::{BufferRejection, Error, Result, SiteId, Timestamp, TranId, VarId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Outcome of a failure-aware snapshot read at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotRead {
    /// A visible version exists and this site may serve it.
    Value(i64),
    /// The site is currently down but held a version visible to the
    /// snapshot before it crashed. The reader may block until recovery.
    StaleButKnown(i64),
    /// No version is visible: the snapshot precedes all versions, or this
    /// replica must first receive a post-failure commit.
    NoVisibleVersion,
    /// The variable is not stored at this site.
    NotStored,
}

/// One site: identifier, liveness, replicated variables, write buffer.
#[derive(Debug)]
pub struct Site {
    id: SiteId,
    available: bool,
    /// Time of the most recent failure; `None` if the site never failed.
    /// Survives recovery; the read path compares snapshots against it.
    last_failed: Option<Timestamp>,
    /// Time of the most recent recovery; zero if the site never recovered.
    last_recovered: Timestamp,
    variables: BTreeMap<VarId, Variable>,
    buffer: FxHashMap<TranId, BTreeMap<VarId, i64>>,
}

impl Site {
    /// Create site `id` seeded with its share of the database: every
    /// replicated variable, plus the odd variables homed here.
    pub fn new(id: SiteId) -> Self {
        let variables = VarId::all()
            .filter(|var| var.stored_at(id))
            .map(|var| (var, Variable::seeded(var.initial_value())))
            .collect();
        Site {
            id,
            available: true,
            last_failed: None,
            last_recovered: 0,
            variables,
            buffer: FxHashMap::default(),
        }
    }

    /// This site's identifier.
    pub fn id(&self) -> SiteId {
        self.id
    }

    /// Whether the site is currently up.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Time of the most recent failure, if any.
    pub fn last_failed(&self) -> Option<Timestamp> {
        self.last_failed
    }

    /// Time of the most recent recovery (zero if never recovered).
    pub fn last_recovered(&self) -> Timestamp {
        self.last_recovered
    }

    /// Whether this site stores `var`.
    pub fn stores(&self, var: VarId) -> bool {
        self.variables.contains_key(&var)
    }

    /// Snapshot-read `var` as of `snapshot`.
    ///
    /// Resolution order:
    /// 1. variable not stored here → `NotStored`
    /// 2. snapshot precedes every version → `NoVisibleVersion`
    /// 3. both the visible version and the snapshot predate the last
    ///    failure → the value is still correct for this snapshot; serve it
    ///    if the site is up, report `StaleButKnown` if it is down
    /// 4. replicated variable whose visible version predates the last
    ///    failure → `NoVisibleVersion` until a post-failure commit lands
    /// 5. otherwise serve the visible value
    pub fn read(&self, var: VarId, snapshot: Timestamp) -> SnapshotRead {
        let Some(variable) = self.variables.get(&var) else {
            return SnapshotRead::NotStored;
        };
        let Some((committed_at, value)) = variable.visible_at(snapshot) else {
            return SnapshotRead::NoVisibleVersion;
        };

        if let Some(failed_at) = self.last_failed {
            if committed_at < failed_at && snapshot < failed_at {
                return if self.available {
                    SnapshotRead::Value(value)
                } else {
                    SnapshotRead::StaleButKnown(value)
                };
            }
            if var.is_replicated() && committed_at < failed_at {
                return SnapshotRead::NoVisibleVersion;
            }
        }
        SnapshotRead::Value(value)
    }

    /// Buffer an uncommitted write for `tran`. Rejected while the site is
    /// down or when the variable is not stored here.
    pub fn buffer_write(&mut self, tran: TranId, var: VarId, value: i64) -> Result<()> {
        if !self.available {
            return Err(Error::CannotBuffer {
                site: self.id,
                var,
                reason: BufferRejection::SiteDown,
            });
        }
        if !self.stores(var) {
            return Err(Error::CannotBuffer {
                site: self.id,
                var,
                reason: BufferRejection::NotStored,
            });
        }
        self.buffer.entry(tran).or_default().insert(var, value);
        tracing::debug!(site = %self.id, %tran, %var, value, "buffered write");
        Ok(())
    }

    /// Apply a committed write: append `(at, value)` to the history and
    /// drop the buffered entry.
    ///
    /// A site that never buffered this write (it was down when the write
    /// was issued) is skipped; the replica stays unreadable for post-fail
    /// snapshots until a later transaction writes through it.
    pub fn commit_apply(&mut self, tran: TranId, var: VarId, value: i64, at: Timestamp) {
        let buffered = match self.buffer.get_mut(&tran) {
            Some(writes) => writes.remove(&var).is_some(),
            None => false,
        };
        if !buffered {
            return;
        }
        if self.buffer.get(&tran).is_some_and(|w| w.is_empty()) {
            self.buffer.remove(&tran);
        }

        if let Some(variable) = self.variables.get_mut(&var) {
            variable.commit(at, value);
            tracing::debug!(site = %self.id, %tran, %var, value, at, "applied commit");
        }
    }

    /// Discard every buffered write of `tran`.
    pub fn discard(&mut self, tran: TranId) {
        if self.buffer.remove(&tran).is_some() {
            tracing::debug!(site = %self.id, %tran, "discarded buffered writes");
        }
    }

    /// Mark the site down at `now`. In-flight buffered state at this site
    /// is unrecoverable, so the whole buffer is erased; committed version
    /// histories are untouched.
    pub fn fail(&mut self, now: Timestamp) {
        self.available = false;
        self.last_failed = Some(now);
        self.buffer.clear();
        tracing::info!(site = %self.id, at = now, "site fail");
    }

    /// Mark the site up at `now`. Version history is preserved and remains
    /// visible to snapshots that predate the failure.
    pub fn recover(&mut self, now: Timestamp) {
        self.available = true;
        self.last_recovered = now;
        tracing::info!(site = %self.id, at = now, "site recover");
    }

    /// Committed `(variable, value)` pairs in ascending variable order.
    pub fn committed_values(&self) -> impl Iterator<Item = (VarId, i64)> + '_ {
        self.variables.iter().map(|(var, v)| (*var, v.value()))
    }

    /// Buffered write counts per transaction, in ascending transaction
    /// order. Diagnostic surface for state reports.
    pub fn buffered_writes(&self) -> BTreeMap<TranId, usize> {
        self.buffer
            .iter()
            .map(|(tran, writes)| (*tran, writes.len()))
            .collect()
    }
}
