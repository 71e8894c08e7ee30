//! Error types for blockjournal
//!
//! Provides a unified error type for journal and filter operations.
//!
//! The type is `Clone` so that the journal reader and writer can record one
//! terminal error and hand the same error back on every later call.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Result type alias using JournalError
pub type Result<T> = std::result::Result<T, JournalError>;

/// Unified error type for blockjournal operations
#[derive(Debug, Clone, Error)]
pub enum JournalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[source] Arc<io::Error>),

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    /// A block or chunk failed validation. `size` is the number of bytes
    /// discarded because of it.
    #[error("block/chunk corrupted: {reason} ({size} bytes)")]
    Corrupted { size: usize, reason: String },

    /// A journal ended before its last chunk was seen.
    #[error("unexpected truncation of journal")]
    UnexpectedEof,

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("stale journal reader")]
    StaleReader,

    #[error("stale journal writer")]
    StaleWriter,

    #[error("journal writer closed")]
    WriterClosed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl JournalError {
    pub(crate) fn corrupted(size: usize, reason: impl Into<String>) -> Self {
        JournalError::Corrupted {
            size,
            reason: reason.into(),
        }
    }

    /// True for errors caused by damaged data rather than misuse or I/O.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            JournalError::Corrupted { .. } | JournalError::UnexpectedEof
        )
    }
}

impl From<io::Error> for JournalError {
    fn from(err: io::Error) -> Self {
        JournalError::Io(Arc::new(err))
    }
}

/// Lets journal sessions sit behind `std::io::Read` / `std::io::Write`.
/// The original error stays reachable through `io::Error::get_ref`.
impl From<JournalError> for io::Error {
    fn from(err: JournalError) -> Self {
        let kind = match &err {
            JournalError::Io(e) => e.kind(),
            JournalError::Corrupted { .. } => io::ErrorKind::InvalidData,
            JournalError::UnexpectedEof => io::ErrorKind::UnexpectedEof,
            JournalError::Config(_) => io::ErrorKind::InvalidInput,
            JournalError::StaleReader
            | JournalError::StaleWriter
            | JournalError::WriterClosed => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
