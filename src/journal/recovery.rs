//! Journal Recovery
//!
//! Replays every intact journal in a stream after a crash.

use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use crate::config::ReaderOptions;
use crate::error::{JournalError, Result};

use super::dropper::{Dropper, LogDropper};
use super::Reader;

/// Replays journals from a stream
pub struct JournalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of journals successfully replayed
    pub journals_recovered: u64,

    /// Number of journals cut short by corruption and skipped
    pub journals_dropped: u64,

    /// Number of corruption events the reader reported
    pub corruption_events: u64,

    /// Total bytes the reader discarded
    pub bytes_dropped: u64,
}

impl RecoveryResult {
    /// True if nothing was lost
    pub fn is_clean(&self) -> bool {
        self.journals_dropped == 0 && self.corruption_events == 0
    }
}

impl JournalRecovery {
    /// Feed every intact journal in `inner` to `apply`, in order.
    ///
    /// In non-strict mode:
    /// 1. Damaged blocks are dropped and counted
    /// 2. A journal truncated by a dropped block is skipped
    /// 3. Replay continues with the next journal
    ///
    /// In strict mode the first corruption aborts the replay. Errors from
    /// `apply` and I/O errors always abort.
    pub fn replay<R, F>(inner: R, options: ReaderOptions, mut apply: F) -> Result<RecoveryResult>
    where
        R: Read,
        F: FnMut(&[u8]) -> Result<()>,
    {
        let drops = Rc::new(RefCell::new(LogDropper::default()));
        let sink = Rc::clone(&drops);
        let dropper = move |size: usize, reason: &str| sink.borrow_mut().notify(size, reason);

        let mut reader = Reader::with_dropper(inner, options, Box::new(dropper));
        let mut result = RecoveryResult::default();

        while let Some(mut journal) = reader.next_journal()? {
            match journal.read_all() {
                Ok(payload) => {
                    apply(&payload)?;
                    result.journals_recovered += 1;
                }
                Err(JournalError::UnexpectedEof) => {
                    tracing::warn!(
                        journal = result.journals_recovered + result.journals_dropped,
                        "skipping truncated journal"
                    );
                    result.journals_dropped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let drops = drops.borrow();
        result.corruption_events = drops.events;
        result.bytes_dropped = drops.bytes;

        tracing::debug!(
            recovered = result.journals_recovered,
            dropped = result.journals_dropped,
            bytes_dropped = result.bytes_dropped,
            "journal replay finished"
        );
        Ok(result)
    }

    /// Collect every intact journal in `inner`.
    pub fn recover<R: Read>(inner: R, options: ReaderOptions) -> Result<(Vec<Vec<u8>>, RecoveryResult)> {
        let mut journals = Vec::new();
        let result = Self::replay(inner, options, |payload| {
            journals.push(payload.to_vec());
            Ok(())
        })?;
        Ok((journals, result))
    }
}
