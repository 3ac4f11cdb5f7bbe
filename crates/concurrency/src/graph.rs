//! Serialization graph
//!
//! A directed graph over transaction IDs with at most one labeled edge per
//! ordered pair. Edges are inserted by the coordinator as reads and writes
//! arrive and only ever leave when a node is removed. At commit time the
//! graph answers one question: would this transaction close a cycle whose
//! other members have all already committed?

use repkv_core::TranId;
use rustc_hash::{FxHashMap, FxHashSet};

/// Conflict edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Write–write: an earlier writer precedes a later writer.
    Ww,
    /// Anti-dependency: a reader precedes a later writer.
    Rw,
}

/// Status snapshot of a peer transaction, as seen by the cycle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// The peer has committed.
    Committed,
    /// The peer is still running and may yet abort.
    Running,
}

/// Directed conflict graph over active and recently committed transactions.
#[derive(Debug, Default)]
pub struct SerializationGraph {
    edges: FxHashMap<TranId, FxHashMap<TranId, EdgeKind>>,
}

impl SerializationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; a second add of the same ID is a no-op.
    pub fn add_node(&mut self, tran: TranId) {
        self.edges.entry(tran).or_default();
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, tran: TranId) {
        self.edges.remove(&tran);
        for outgoing in self.edges.values_mut() {
            outgoing.remove(&tran);
        }
    }

    /// Whether `tran` is a node of the graph.
    pub fn contains(&self, tran: TranId) -> bool {
        self.edges.contains_key(&tran)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Insert the edge `u → v` with label `kind`, overwriting any existing
    /// label on that pair. Both endpoints must already be nodes; otherwise
    /// this logs and does nothing.
    pub fn add_edge(&mut self, u: TranId, v: TranId, kind: EdgeKind) {
        if !self.edges.contains_key(&u) || !self.edges.contains_key(&v) {
            tracing::warn!(%u, %v, ?kind, "edge endpoints missing from graph");
            return;
        }
        if let Some(outgoing) = self.edges.get_mut(&u) {
            outgoing.insert(v, kind);
        }
    }

    /// Outgoing edges of `tran` as `(successor, label)` pairs.
    pub fn out_edges(&self, tran: TranId) -> Vec<(TranId, EdgeKind)> {
        self.edges
            .get(&tran)
            .map(|outgoing| outgoing.iter().map(|(v, kind)| (*v, *kind)).collect())
            .unwrap_or_default()
    }

    /// Incoming edges of `tran` as `(predecessor, label)` pairs.
    pub fn in_edges(&self, tran: TranId) -> Vec<(TranId, EdgeKind)> {
        self.edges
            .iter()
            .filter_map(|(u, outgoing)| outgoing.get(&tran).map(|kind| (*u, *kind)))
            .collect()
    }

    /// Whether the graph holds a directed cycle in which every node other
    /// than `target` is committed according to `statuses`.
    ///
    /// Such a cycle means committing `target` would close a serialization
    /// cycle with peers that can no longer abort. Cycles through
    /// still-running peers do not count: those peers may themselves abort
    /// later. Every edge participates regardless of label; write–write
    /// races are resolved separately by first-committer-wins.
    pub fn has_validating_cycle(
        &self,
        target: TranId,
        statuses: &FxHashMap<TranId, PeerState>,
    ) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = FxHashSet::default();
        let mut parent = FxHashMap::default();

        for &node in self.edges.keys() {
            if !visited.contains(&node)
                && self.search(target, node, &mut visited, &mut stack, &mut parent, statuses)
            {
                return true;
            }
        }
        false
    }

    /// Depth-first search from `node`. Edges into a node that is neither
    /// the target nor committed are skipped outright. A back edge onto the
    /// traversal stack closes a candidate cycle, which is then replayed
    /// through the parent map and checked node by node.
    fn search(
        &self,
        target: TranId,
        node: TranId,
        visited: &mut FxHashSet<TranId>,
        stack: &mut FxHashSet<TranId>,
        parent: &mut FxHashMap<TranId, TranId>,
        statuses: &FxHashMap<TranId, PeerState>,
    ) -> bool {
        visited.insert(node);
        stack.insert(node);

        if let Some(outgoing) = self.edges.get(&node) {
            for &next in outgoing.keys() {
                if next != target && statuses.get(&next) != Some(&PeerState::Committed) {
                    continue;
                }
                if stack.contains(&next) {
                    if self.cycle_validates(target, next, node, parent, statuses) {
                        return true;
                    }
                    continue;
                }
                if !visited.contains(&next) {
                    parent.insert(next, node);
                    if self.search(target, next, visited, stack, parent, statuses) {
                        return true;
                    }
                }
            }
        }

        stack.remove(&node);
        false
    }

    /// Replay the cycle closed by the back edge `end → start` and confirm
    /// every node on it except `target` is committed.
    fn cycle_validates(
        &self,
        target: TranId,
        start: TranId,
        end: TranId,
        parent: &FxHashMap<TranId, TranId>,
        statuses: &FxHashMap<TranId, PeerState>,
    ) -> bool {
        let mut current = end;
        loop {
            if current != target && statuses.get(&current) != Some(&PeerState::Committed) {
                return false;
            }
            if current == start {
                return true;
            }
            match parent.get(&current) {
                Some(&up) => current = up,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(raw: u32) -> TranId {
        TranId::new(raw)
    }

    fn statuses(entries: &[(u32, PeerState)]) -> FxHashMap<TranId, PeerState> {
        entries.iter().map(|&(id, state)| (t(id), state)).collect()
    }

    fn graph_with_nodes(ids: &[u32]) -> SerializationGraph {
        let mut graph = SerializationGraph::new();
        for &id in ids {
            graph.add_node(t(id));
        }
        graph
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut graph = graph_with_nodes(&[1]);
        graph.add_node(t(1));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_add_edge_requires_both_endpoints() {
        let mut graph = graph_with_nodes(&[1]);
        graph.add_edge(t(1), t(2), EdgeKind::Ww);
        assert!(graph.out_edges(t(1)).is_empty());
    }

    #[test]
    fn test_later_edge_overwrites_label() {
        let mut graph = graph_with_nodes(&[1, 2]);
        graph.add_edge(t(1), t(2), EdgeKind::Ww);
        graph.add_edge(t(1), t(2), EdgeKind::Rw);

        assert_eq!(graph.out_edges(t(1)), vec![(t(2), EdgeKind::Rw)]);
    }

    #[test]
    fn test_remove_node_erases_incoming_edges() {
        let mut graph = graph_with_nodes(&[1, 2]);
        graph.add_edge(t(1), t(2), EdgeKind::Rw);
        graph.remove_node(t(2));

        assert!(!graph.contains(t(2)));
        assert!(graph.out_edges(t(1)).is_empty());
    }

    #[test]
    fn test_in_edges() {
        let mut graph = graph_with_nodes(&[1, 2, 3]);
        graph.add_edge(t(1), t(3), EdgeKind::Ww);
        graph.add_edge(t(2), t(3), EdgeKind::Rw);

        let mut incoming = graph.in_edges(t(3));
        incoming.sort_by_key(|(id, _)| *id);
        assert_eq!(incoming, vec![(t(1), EdgeKind::Ww), (t(2), EdgeKind::Rw)]);
    }

    #[test]
    fn test_two_cycle_with_committed_peer_validates() {
        let mut graph = graph_with_nodes(&[1, 2]);
        graph.add_edge(t(1), t(2), EdgeKind::Rw);
        graph.add_edge(t(2), t(1), EdgeKind::Rw);

        let statuses = statuses(&[(1, PeerState::Committed), (2, PeerState::Running)]);
        assert!(graph.has_validating_cycle(t(2), &statuses));
    }

    #[test]
    fn test_cycle_through_running_peer_does_not_validate() {
        let mut graph = graph_with_nodes(&[1, 2]);
        graph.add_edge(t(1), t(2), EdgeKind::Rw);
        graph.add_edge(t(2), t(1), EdgeKind::Rw);

        let statuses = statuses(&[(1, PeerState::Running), (2, PeerState::Running)]);
        assert!(!graph.has_validating_cycle(t(1), &statuses));
        assert!(!graph.has_validating_cycle(t(2), &statuses));
    }

    #[test]
    fn test_three_cycle_mixed_states() {
        let mut graph = graph_with_nodes(&[1, 2, 3]);
        graph.add_edge(t(1), t(2), EdgeKind::Rw);
        graph.add_edge(t(2), t(3), EdgeKind::Ww);
        graph.add_edge(t(3), t(1), EdgeKind::Rw);

        let one_running = statuses(&[
            (1, PeerState::Running),
            (2, PeerState::Committed),
            (3, PeerState::Running),
        ]);
        assert!(!graph.has_validating_cycle(t(1), &one_running));

        let others_committed = statuses(&[
            (1, PeerState::Running),
            (2, PeerState::Committed),
            (3, PeerState::Committed),
        ]);
        assert!(graph.has_validating_cycle(t(1), &others_committed));
    }

    #[test]
    fn test_ww_edges_participate_in_cycles() {
        let mut graph = graph_with_nodes(&[1, 2]);
        graph.add_edge(t(1), t(2), EdgeKind::Ww);
        graph.add_edge(t(2), t(1), EdgeKind::Ww);

        let statuses = statuses(&[(1, PeerState::Committed), (2, PeerState::Running)]);
        assert!(graph.has_validating_cycle(t(2), &statuses));
    }

    #[test]
    fn test_fully_committed_cycle_validates_for_any_target() {
        let mut graph = graph_with_nodes(&[1, 2, 3]);
        graph.add_edge(t(2), t(3), EdgeKind::Rw);
        graph.add_edge(t(3), t(2), EdgeKind::Rw);

        let statuses = statuses(&[
            (1, PeerState::Running),
            (2, PeerState::Committed),
            (3, PeerState::Committed),
        ]);
        assert!(graph.has_validating_cycle(t(1), &statuses));
    }

    #[test]
    fn test_acyclic_graph_has_no_validating_cycle() {
        let mut graph = graph_with_nodes(&[1, 2, 3]);
        graph.add_edge(t(1), t(2), EdgeKind::Rw);
        graph.add_edge(t(2), t(3), EdgeKind::Rw);

        let statuses = statuses(&[
            (1, PeerState::Committed),
            (2, PeerState::Committed),
            (3, PeerState::Committed),
        ]);
        assert!(!graph.has_validating_cycle(t(1), &statuses));
    }

    #[test]
    fn test_peer_absent_from_status_map_is_treated_as_not_committed() {
        // blocked and already-marked peers carry no status entry
        let mut graph = graph_with_nodes(&[1, 2]);
        graph.add_edge(t(1), t(2), EdgeKind::Rw);
        graph.add_edge(t(2), t(1), EdgeKind::Rw);

        let statuses = statuses(&[(1, PeerState::Running)]);
        assert!(!graph.has_validating_cycle(t(1), &statuses));
    }
}
