//! Per-site version store for repkv
//!
//! This crate implements the site-local half of the simulator:
//! - Variable: a committed value with its append-only version history
//! - Site: one replica node with availability status, fail/recover
//!   timestamps, its subset of variables, and the per-transaction
//!   uncommitted-write buffer
//! - SnapshotRead: the outcome of a failure-aware snapshot read
//!
//! Sites never observe each other and never call back into the
//! coordinator; all cross-site reasoning happens a layer up.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod site;
pub mod version;

pub use site::{Site, SnapshotRead};
pub use version::Variable;
