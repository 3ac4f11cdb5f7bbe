//! Core types for repkv
//!
//! This crate defines the foundational vocabulary of the simulator:
//! - TranId / SiteId / VarId: identifier newtypes
//! - Timestamp: the logical tick the driver advances between commands
//! - The fixed topology (ten sites, twenty variables) and the replication
//!   routing rule
//! - Error: control-plane and buffering error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{BufferRejection, Error, Result};
pub use types::{SiteId, Timestamp, TranId, VarId, SITE_COUNT, VAR_COUNT};
