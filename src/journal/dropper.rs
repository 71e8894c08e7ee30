//! Corruption sinks
//!
//! The reader reports every dropped block or chunk to an optional
//! [`Dropper`], in strict and non-strict mode alike.

/// Observer of data the journal reader discards.
pub trait Dropper {
    /// `size` bytes were dropped for `reason`.
    fn notify(&mut self, size: usize, reason: &str);
}

impl<F> Dropper for F
where
    F: FnMut(usize, &str),
{
    fn notify(&mut self, size: usize, reason: &str) {
        self(size, reason)
    }
}

/// Dropper that logs each event and keeps running totals.
#[derive(Debug, Default, Clone)]
pub struct LogDropper {
    /// Number of corruption events seen
    pub events: u64,
    /// Total bytes dropped
    pub bytes: u64,
}

impl Dropper for LogDropper {
    fn notify(&mut self, size: usize, reason: &str) {
        self.events += 1;
        self.bytes += size as u64;
        tracing::info!(size, reason, "journal data dropped");
    }
}
