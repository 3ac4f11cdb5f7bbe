//! Concurrency layer for repkv
//!
//! This crate implements the bookkeeping the coordinator validates against:
//! - SerializationGraph: labeled conflict edges between transactions and
//!   the validating-cycle predicate used at commit time
//! - Transaction: per-transaction record (start time, status, read set,
//!   staged write set)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod transaction;

pub use graph::{EdgeKind, PeerState, SerializationGraph};
pub use transaction::{StagedWrite, Transaction, TransactionStatus};
