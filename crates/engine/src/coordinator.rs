//! Transaction coordinator
//!
//! The only component with state that spans commands. It owns the ten
//! sites, the transaction table, and the serialization graph; sites and
//! the graph never call back into it.
//!
//! ## Command handling
//!
//! - `begin` inserts a fresh Active transaction at the current tick.
//! - `R` probes the variable's routing sites in order and serves the first
//!   visible snapshot value, adding reader → writer anti-dependency edges.
//!   Probes that hit a down site holding a pre-crash value turn the
//!   transaction Blocked; if no site can serve at all, the transaction
//!   aborts on the spot.
//! - `W` adds writer → writer and reader → writer edges, stages the value
//!   in the transaction's write set, and buffers it at every available
//!   routing site.
//! - `end` runs the validation protocol in order: early abort for Blocked
//!   or already-marked transactions, the durability fence against site
//!   failures, the validating-cycle check, first-committer-wins marking of
//!   write-write peers, then commit application.
//! - `fail`/`recover` flip site liveness; recovery additionally re-probes
//!   the reads of every Blocked transaction through the recovered site.

use crate::clock::LogicalClock;
use crate::command::Command;
use crate::event::Event;
use crate::report::{BufferReport, SiteReport, StateReport, TransactionReport, WriteReport};
use repkv_concurrency::{
    EdgeKind, PeerState, SerializationGraph, Transaction, TransactionStatus,
};
use repkv_core::{Error, SiteId, Timestamp, TranId, VarId};
use repkv_storage::{Site, SnapshotRead};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// The transaction coordinator.
pub struct Coordinator {
    clock: LogicalClock,
    sites: Vec<Site>,
    transactions: BTreeMap<TranId, Transaction>,
    graph: SerializationGraph,
}

impl Coordinator {
    /// A coordinator over a freshly seeded cluster, starting at tick zero.
    pub fn new() -> Self {
        Self::with_clock(LogicalClock::new())
    }

    /// A coordinator with an injected clock.
    pub fn with_clock(clock: LogicalClock) -> Self {
        Coordinator {
            clock,
            sites: SiteId::all().map(Site::new).collect(),
            transactions: BTreeMap::new(),
            graph: SerializationGraph::new(),
        }
    }

    /// The current logical tick.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Apply one command and return its observable events. The clock
    /// advances by one tick afterwards, so all timestamps taken while
    /// handling the command are equal.
    pub fn apply(&mut self, command: Command) -> Vec<Event> {
        tracing::debug!(?command, now = self.clock.now(), "applying command");
        let mut out = Vec::new();
        match command {
            Command::Begin(tran) => self.begin(tran, &mut out),
            Command::Read(tran, var) => self.read(tran, var, &mut out),
            Command::Write(tran, var, value) => self.write(tran, var, value, &mut out),
            Command::End(tran) => self.end(tran, &mut out),
            Command::Fail(site) => self.fail(site, &mut out),
            Command::Recover(site) => self.recover(site, &mut out),
            Command::Dump => self.dump(&mut out),
            Command::QueryState => self.query_state(&mut out),
        }
        self.clock.tick();
        out
    }

    /// Status of a transaction, if it is (still) in the table.
    pub fn transaction_status(&self, tran: TranId) -> Option<TransactionStatus> {
        self.transactions.get(&tran).map(|t| t.status)
    }

    /// Committed value of `var` at `site`, if the site stores it.
    pub fn committed_value(&self, site: SiteId, var: VarId) -> Option<i64> {
        self.site(site)
            .committed_values()
            .find(|(v, _)| *v == var)
            .map(|(_, value)| value)
    }

    /// Whether `site` is currently up.
    pub fn is_site_available(&self, site: SiteId) -> bool {
        self.site(site).is_available()
    }

    fn site(&self, id: SiteId) -> &Site {
        &self.sites[(id.raw() - 1) as usize]
    }

    fn site_mut(&mut self, id: SiteId) -> &mut Site {
        &mut self.sites[(id.raw() - 1) as usize]
    }

    fn begin(&mut self, tran: TranId, out: &mut Vec<Event>) {
        if self.transactions.contains_key(&tran) {
            out.push(Event::Rejected(Error::DuplicateTransaction(tran)));
            return;
        }
        let now = self.clock.now();
        self.transactions.insert(tran, Transaction::new(tran, now));
        self.graph.add_node(tran);
        tracing::debug!(%tran, at = now, "transaction started");
    }

    fn read(&mut self, tran: TranId, var: VarId, out: &mut Vec<Event>) {
        let Some(txn) = self.transactions.get(&tran) else {
            out.push(Event::Rejected(Error::UnknownTransaction(tran)));
            return;
        };
        if !txn.is_active() {
            tracing::debug!(%tran, %var, status = ?txn.status, "read ignored");
            return;
        }
        let snapshot = txn.started_at;

        let mut waiting_on = Vec::new();
        for site_id in var.routing_sites() {
            match self.site(site_id).read(var, snapshot) {
                SnapshotRead::Value(value) => {
                    if let Some(txn) = self.transactions.get_mut(&tran) {
                        txn.record_read(var);
                    }
                    self.add_anti_dependencies(tran, var);
                    out.push(Event::ReadValue { var, value });
                    return;
                }
                SnapshotRead::StaleButKnown(_) => waiting_on.push(site_id),
                SnapshotRead::NoVisibleVersion | SnapshotRead::NotStored => {}
            }
        }

        if waiting_on.is_empty() {
            // no site can serve this snapshot, now or after recovery
            self.abort(tran, out);
        } else {
            if let Some(txn) = self.transactions.get_mut(&tran) {
                // tentative: the recovery scan re-probes this variable
                txn.record_read(var);
                txn.status = TransactionStatus::Blocked;
            }
            for site in waiting_on {
                out.push(Event::WaitsForSite { tran, site });
            }
        }
    }

    fn write(&mut self, tran: TranId, var: VarId, value: i64, out: &mut Vec<Event>) {
        let Some(txn) = self.transactions.get(&tran) else {
            out.push(Event::Rejected(Error::UnknownTransaction(tran)));
            return;
        };
        if !txn.is_active() {
            tracing::debug!(%tran, %var, status = ?txn.status, "write ignored");
            return;
        }

        // WW edges from prior writers first, then RW edges from prior
        // readers; a peer that both wrote and read keeps the RW label.
        let writers = self.peers_that_wrote(tran, var);
        let readers = self.peers_that_read(tran, var);
        for peer in writers {
            self.graph.add_edge(peer, tran, EdgeKind::Ww);
        }
        for peer in readers {
            self.graph.add_edge(peer, tran, EdgeKind::Rw);
        }

        let now = self.clock.now();
        if let Some(txn) = self.transactions.get_mut(&tran) {
            txn.stage_write(var, value, now);
        }

        let mut buffered_anywhere = false;
        for site_id in var.routing_sites() {
            let site = self.site_mut(site_id);
            if !site.is_available() {
                continue;
            }
            match site.buffer_write(tran, var, value) {
                Ok(()) => buffered_anywhere = true,
                Err(err) => tracing::debug!(%err, "write not buffered"),
            }
        }
        if !buffered_anywhere {
            out.push(Event::WriteFailed);
        }
    }

    fn end(&mut self, tran: TranId, out: &mut Vec<Event>) {
        let Some(txn) = self.transactions.get(&tran) else {
            // unknown at end time: nothing to decide
            return;
        };
        match txn.status {
            TransactionStatus::Aborted | TransactionStatus::Blocked => {
                self.abort(tran, out);
                return;
            }
            TransactionStatus::Committed => {
                tracing::debug!(%tran, "end ignored; already committed");
                return;
            }
            TransactionStatus::Active => {}
        }

        if !self.writes_survive_failures(txn) {
            tracing::debug!(%tran, "staged write lost to a site failure");
            self.abort(tran, out);
            return;
        }

        let statuses = self.status_snapshot();
        if self.graph.has_validating_cycle(tran, &statuses) {
            tracing::debug!(%tran, "commit would close a cycle of committed peers");
            self.abort(tran, out);
            return;
        }

        // first-committer-wins: peers racing on the same variables abort
        // at their own end
        for peer in self.ww_peers(tran) {
            if let Some(loser) = self.transactions.get_mut(&peer) {
                if loser.status != TransactionStatus::Committed {
                    tracing::debug!(winner = %tran, loser = %peer, "write-write race resolved");
                    loser.status = TransactionStatus::Aborted;
                }
            }
        }

        self.commit(tran, out);
    }

    /// The durability fence: every staged write must still be buffered at
    /// the sites that will commit it. A home site that is down, or any
    /// relevant site that failed after the write was issued, loses the
    /// buffered copy and forces an abort.
    fn writes_survive_failures(&self, txn: &Transaction) -> bool {
        for (&var, staged) in &txn.writes {
            if var.is_replicated() {
                for site in &self.sites {
                    if let Some(failed_at) = site.last_failed() {
                        if staged.issued_at < failed_at {
                            return false;
                        }
                    }
                }
            } else {
                let home = self.site(var.home_site());
                if !home.is_available() {
                    return false;
                }
                if let Some(failed_at) = home.last_failed() {
                    if staged.issued_at < failed_at {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Peer statuses for the cycle check. Blocked and already-marked
    /// transactions get no entry: they cannot anchor a fatal cycle.
    fn status_snapshot(&self) -> FxHashMap<TranId, PeerState> {
        self.transactions
            .iter()
            .filter_map(|(id, txn)| match txn.status {
                TransactionStatus::Committed => Some((*id, PeerState::Committed)),
                TransactionStatus::Active => Some((*id, PeerState::Running)),
                TransactionStatus::Blocked | TransactionStatus::Aborted => None,
            })
            .collect()
    }

    /// Peers connected to `tran` by a WW-labeled edge in either direction.
    fn ww_peers(&self, tran: TranId) -> Vec<TranId> {
        let mut peers = BTreeSet::new();
        for (peer, kind) in self
            .graph
            .out_edges(tran)
            .into_iter()
            .chain(self.graph.in_edges(tran))
        {
            if kind == EdgeKind::Ww {
                peers.insert(peer);
            }
        }
        peers.into_iter().collect()
    }

    fn peers_that_wrote(&self, tran: TranId, var: VarId) -> Vec<TranId> {
        self.transactions
            .iter()
            .filter(|(id, peer)| **id != tran && peer.has_written(var))
            .map(|(id, _)| *id)
            .collect()
    }

    fn peers_that_read(&self, tran: TranId, var: VarId) -> Vec<TranId> {
        self.transactions
            .iter()
            .filter(|(id, peer)| **id != tran && peer.has_read(var))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Reader → writer anti-dependency edges for a served read of `var`.
    fn add_anti_dependencies(&mut self, reader: TranId, var: VarId) {
        for writer in self.peers_that_wrote(reader, var) {
            self.graph.add_edge(reader, writer, EdgeKind::Rw);
        }
    }

    /// Discard buffered writes everywhere, drop the transaction from the
    /// table and the graph, and emit the abort notice.
    fn abort(&mut self, tran: TranId, out: &mut Vec<Event>) {
        for site in &mut self.sites {
            site.discard(tran);
        }
        self.transactions.remove(&tran);
        self.graph.remove_node(tran);
        out.push(Event::Aborted(tran));
    }

    /// Apply every staged write at every available routing site, mark the
    /// transaction Committed, and emit the commit notice. The record stays
    /// in the table and the graph: later cycle checks must see it.
    fn commit(&mut self, tran: TranId, out: &mut Vec<Event>) {
        let now = self.clock.now();
        let writes: Vec<(VarId, i64)> = match self.transactions.get(&tran) {
            Some(txn) => txn.writes.iter().map(|(var, w)| (*var, w.value)).collect(),
            None => return,
        };
        for (var, value) in writes {
            for site_id in var.routing_sites() {
                let site = self.site_mut(site_id);
                if !site.is_available() {
                    continue;
                }
                site.commit_apply(tran, var, value, now);
            }
        }
        if let Some(txn) = self.transactions.get_mut(&tran) {
            txn.status = TransactionStatus::Committed;
        }
        out.push(Event::Committed(tran));
    }

    fn fail(&mut self, raw: u32, out: &mut Vec<Event>) {
        let site_id = SiteId::new(raw);
        if !site_id.in_topology() {
            out.push(Event::Rejected(Error::InvalidSite(raw)));
            return;
        }
        if !self.site(site_id).is_available() {
            out.push(Event::Rejected(Error::SiteAlreadyDown(site_id)));
            return;
        }
        let now = self.clock.now();
        self.site_mut(site_id).fail(now);
    }

    fn recover(&mut self, raw: u32, out: &mut Vec<Event>) {
        let site_id = SiteId::new(raw);
        if !site_id.in_topology() {
            out.push(Event::Rejected(Error::InvalidSite(raw)));
            return;
        }
        let now = self.clock.now();
        self.site_mut(site_id).recover(now);

        // re-probe blocked readers through the recovered site; the first
        // variable served re-activates the transaction
        let blocked: Vec<TranId> = self
            .transactions
            .iter()
            .filter(|(_, txn)| txn.status == TransactionStatus::Blocked)
            .map(|(id, _)| *id)
            .collect();
        for tran in blocked {
            let Some(txn) = self.transactions.get(&tran) else {
                continue;
            };
            let snapshot = txn.started_at;
            let candidates: Vec<VarId> = txn
                .reads
                .iter()
                .copied()
                .filter(|var| self.site(site_id).stores(*var))
                .collect();
            for var in candidates {
                if let SnapshotRead::Value(value) = self.site(site_id).read(var, snapshot) {
                    self.add_anti_dependencies(tran, var);
                    if let Some(txn) = self.transactions.get_mut(&tran) {
                        txn.status = TransactionStatus::Active;
                    }
                    out.push(Event::Unblocked { tran, var, value });
                    break;
                }
            }
        }
    }

    fn dump(&self, out: &mut Vec<Event>) {
        for site in &self.sites {
            out.push(Event::SiteDump {
                site: site.id(),
                values: site.committed_values().collect(),
            });
        }
    }

    fn query_state(&self, out: &mut Vec<Event>) {
        let transactions = self
            .transactions
            .values()
            .map(|txn| TransactionReport {
                id: txn.id,
                status: txn.status,
                started_at: txn.started_at,
                reads: txn.reads.iter().copied().collect(),
                writes: txn
                    .writes
                    .iter()
                    .map(|(var, w)| WriteReport {
                        var: *var,
                        value: w.value,
                        issued_at: w.issued_at,
                    })
                    .collect(),
            })
            .collect();
        let sites = self
            .sites
            .iter()
            .map(|site| SiteReport {
                id: site.id(),
                available: site.is_available(),
                last_failed: site.last_failed(),
                last_recovered: site.last_recovered(),
                buffered: site
                    .buffered_writes()
                    .into_iter()
                    .map(|(tran, staged)| BufferReport { tran, staged })
                    .collect(),
            })
            .collect();
        out.push(Event::StateReport(StateReport {
            now: self.clock.now(),
            transactions,
            sites,
        }));
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
