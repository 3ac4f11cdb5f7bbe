//! Error types for repkv
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. Every transactional failure is recovered inside the
//! coordinator; nothing here ever aborts the process. Control-plane
//! mistakes (unknown or duplicate transactions, bad site numbers) become
//! one-line diagnostics in the output stream, and buffering failures feed
//! the coordinator's write path.

use crate::types::{SiteId, TranId, VarId};
use std::fmt;
use thiserror::Error;

/// Result type alias for repkv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A command referenced a transaction that is not in the table.
    #[error("Transaction {0} does not exist")]
    UnknownTransaction(TranId),

    /// `begin` was issued for a transaction ID already in use.
    #[error("Transaction {0} already exists")]
    DuplicateTransaction(TranId),

    /// A site number outside `1..=SITE_COUNT`.
    #[error("Invalid site ID: {0}")]
    InvalidSite(u32),

    /// `fail` was issued for a site that is already down.
    #[error("Site {0} is already failed")]
    SiteAlreadyDown(SiteId),

    /// A staged write could not be buffered at a site.
    #[error("cannot buffer write of {var} at site {site}: {reason}")]
    CannotBuffer {
        /// The site that rejected the write.
        site: SiteId,
        /// The variable being written.
        var: VarId,
        /// Why the site rejected it.
        reason: BufferRejection,
    },
}

/// Why a site refused to buffer a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRejection {
    /// The site is currently unavailable.
    SiteDown,
    /// The site does not store the variable.
    NotStored,
}

impl fmt::Display for BufferRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferRejection::SiteDown => write!(f, "site not available"),
            BufferRejection::NotStored => write!(f, "variable not stored here"),
        }
    }
}

impl Error {
    /// Whether this is a control-plane mistake: a diagnostic line is
    /// emitted and no simulator state changes.
    pub fn is_control_plane(&self) -> bool {
        matches!(
            self,
            Error::UnknownTransaction(_)
                | Error::DuplicateTransaction(_)
                | Error::InvalidSite(_)
                | Error::SiteAlreadyDown(_)
        )
    }
}
