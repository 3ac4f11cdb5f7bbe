//! # repkv
//!
//! A deterministic, single-process simulator of a replicated key-value
//! store executing interactive transactions under snapshot isolation with
//! SSI-style commit validation.
//!
//! Ten sites replicate twenty integer variables: even-indexed variables
//! live at every site, odd-indexed ones at a single home site. A scripted
//! command stream drives transactions (`begin`/`R`/`W`/`end`) and the
//! cluster (`fail`/`recover`/`dump`), one command per logical tick, and
//! the coordinator decides deterministically which transactions commit:
//! snapshot reads honor site failures (available-copies rule), write-write
//! races resolve first-committer-wins, and a commit that would close a
//! serialization cycle with already-committed peers aborts instead.
//!
//! # Quick Start
//!
//! ```
//! use repkv::{Command, Coordinator, Event, TranId, VarId};
//!
//! let mut db = Coordinator::new();
//! db.apply(Command::Begin(TranId::new(1)));
//! let events = db.apply(Command::Read(TranId::new(1), VarId::new(2)));
//! assert_eq!(
//!     events,
//!     vec![Event::ReadValue { var: VarId::new(2), value: 20 }]
//! );
//! ```
//!
//! # Architecture
//!
//! The [`Coordinator`] is the only stateful component: it owns the sites,
//! the transaction table, and the serialization graph. Sites hold version
//! histories and uncommitted-write buffers and never observe each other;
//! the graph tracks labeled conflict edges and answers the cycle-validity
//! question at commit time. The `repkv-cli` crate supplies the script
//! parser and output formatting around the [`Command`]/[`Event`] pair.

pub use repkv_concurrency::{
    EdgeKind, PeerState, SerializationGraph, Transaction, TransactionStatus,
};
pub use repkv_core::{Error, Result, SiteId, Timestamp, TranId, VarId, SITE_COUNT, VAR_COUNT};
pub use repkv_engine::{Command, Coordinator, Event, LogicalClock, StateReport};
pub use repkv_storage::{Site, SnapshotRead, Variable};
