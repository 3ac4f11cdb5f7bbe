//! Identifier newtypes, logical time, and the fixed topology
//!
//! The simulated cluster has a fixed shape: `SITE_COUNT` sites named
//! `1..=10` and `VAR_COUNT` variables named `x1..=x20`. Even-indexed
//! variables are replicated at every site; odd-indexed variables live at
//! exactly one home site. All routing decisions flow through
//! [`VarId::routing_sites`] so the parity rule exists in one place.

use serde::Serialize;
use std::fmt;

/// Number of sites in the cluster.
pub const SITE_COUNT: u32 = 10;

/// Number of variables in the database.
pub const VAR_COUNT: u32 = 20;

/// Logical time.
///
/// A monotonically increasing tick advanced by the driver after every
/// executed command. All timestamps observed while handling a single
/// command are equal.
pub type Timestamp = u64;

/// Transaction identifier, as written in the command stream (`T3` → 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TranId(u32);

impl TranId {
    /// Wrap a raw transaction number.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TranId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Site identifier in `1..=SITE_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SiteId(u32);

impl SiteId {
    /// Wrap a raw site number. The coordinator validates range before use.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw site number.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Whether this identifier names a site that exists in the topology.
    pub fn in_topology(self) -> bool {
        (1..=SITE_COUNT).contains(&self.0)
    }

    /// All sites, in ascending order.
    pub fn all() -> impl Iterator<Item = SiteId> {
        (1..=SITE_COUNT).map(SiteId)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Variable identifier, as written in the command stream (`x7` → 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VarId(u32);

impl VarId {
    /// Wrap a raw variable number.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Even-indexed variables are replicated at every site.
    pub fn is_replicated(self) -> bool {
        self.0 % 2 == 0
    }

    /// The single site an odd-indexed variable lives at: `1 + (i mod 10)`.
    ///
    /// Defined for every variable, but only meaningful as a routing target
    /// for non-replicated ones.
    pub fn home_site(self) -> SiteId {
        SiteId(1 + self.0 % 10)
    }

    /// The sites a read or write of this variable is routed to, in probe
    /// order: every site for a replicated variable, the home site otherwise.
    pub fn routing_sites(self) -> Vec<SiteId> {
        if self.is_replicated() {
            SiteId::all().collect()
        } else {
            vec![self.home_site()]
        }
    }

    /// Whether `site` stores this variable.
    pub fn stored_at(self, site: SiteId) -> bool {
        self.is_replicated() || self.home_site() == site
    }

    /// Seed value of the variable: `10 * i`, committed at time zero.
    pub fn initial_value(self) -> i64 {
        i64::from(self.0) * 10
    }

    /// All variables, in ascending order.
    pub fn all() -> impl Iterator<Item = VarId> {
        (1..=VAR_COUNT).map(VarId)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(TranId::new(1).to_string(), "T1");
        assert_eq!(VarId::new(12).to_string(), "x12");
        assert_eq!(SiteId::new(4).to_string(), "4");
    }

    #[test]
    fn test_replication_parity() {
        assert!(VarId::new(2).is_replicated());
        assert!(VarId::new(20).is_replicated());
        assert!(!VarId::new(1).is_replicated());
        assert!(!VarId::new(19).is_replicated());
    }

    #[test]
    fn test_home_sites_for_odd_variables() {
        assert_eq!(VarId::new(1).home_site(), SiteId::new(2));
        assert_eq!(VarId::new(3).home_site(), SiteId::new(4));
        assert_eq!(VarId::new(9).home_site(), SiteId::new(10));
        assert_eq!(VarId::new(11).home_site(), SiteId::new(2));
        assert_eq!(VarId::new(19).home_site(), SiteId::new(10));
    }

    #[test]
    fn test_routing_replicated_probes_all_sites() {
        let sites = VarId::new(4).routing_sites();
        assert_eq!(sites.len(), SITE_COUNT as usize);
        assert_eq!(sites.first(), Some(&SiteId::new(1)));
        assert_eq!(sites.last(), Some(&SiteId::new(10)));
    }

    #[test]
    fn test_routing_non_replicated_probes_home_only() {
        assert_eq!(VarId::new(3).routing_sites(), vec![SiteId::new(4)]);
    }

    #[test]
    fn test_stored_at() {
        // x5 is homed at site 6 only
        assert!(VarId::new(5).stored_at(SiteId::new(6)));
        assert!(!VarId::new(5).stored_at(SiteId::new(5)));
        // x6 is everywhere
        for site in SiteId::all() {
            assert!(VarId::new(6).stored_at(site));
        }
    }

    #[test]
    fn test_initial_values() {
        assert_eq!(VarId::new(1).initial_value(), 10);
        assert_eq!(VarId::new(20).initial_value(), 200);
    }

    #[test]
    fn test_site_topology_bounds() {
        assert!(SiteId::new(1).in_topology());
        assert!(SiteId::new(10).in_topology());
        assert!(!SiteId::new(0).in_topology());
        assert!(!SiteId::new(11).in_topology());
    }
}
