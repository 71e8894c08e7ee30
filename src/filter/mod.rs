//! Filter Module
//!
//! Probabilistic membership filters stored alongside data blocks so that
//! lookups for absent keys can skip the block entirely.
//!
//! ## Responsibilities
//! - Build a serialized filter from a batch of keys
//! - Answer "may this key be present?" from the serialized bytes alone
//! - Identify the encoding by name so readers can pick a matching filter
//!
//! ## Bloom Encoding
//! ```text
//! ┌───────────────────────────────────┬────────┐
//! │ Bit array (n_bytes)               │ k (1)  │
//! └───────────────────────────────────┴────────┘
//! ```
//! `k` is the number of probes the filter was built with, so filters stay
//! readable after `bits_per_key` changes.

mod bloom;
mod hash;

use bytes::BytesMut;

pub use bloom::{BloomFilter, BloomFilterGenerator};
pub use hash::hash;

/// A filter encoding.
pub trait Filter {
    /// Persisted identifier of the encoding. Readers use it to pick the
    /// implementation matching a stored filter.
    fn name(&self) -> &'static str;

    /// Whether `key` may be in the set encoded by `filter`. A `false` answer
    /// is definite; `true` may be a false positive.
    fn contains(&self, filter: &[u8], key: &[u8]) -> bool;

    /// Start building a new filter
    fn new_generator(&self) -> Box<dyn FilterGenerator>;
}

/// Accumulates keys and serializes them as a filter.
pub trait FilterGenerator {
    /// Add a key to the filter being built
    fn add(&mut self, key: &[u8]);

    /// Serialize every key added since the last call into `buf`, then start
    /// over with an empty set.
    fn generate(&mut self, buf: &mut dyn FilterBuffer);
}

/// Destination for serialized filters.
pub trait FilterBuffer {
    /// Append `n` zeroed bytes and return them for writing
    fn alloc(&mut self, n: usize) -> &mut [u8];
}

impl FilterBuffer for Vec<u8> {
    fn alloc(&mut self, n: usize) -> &mut [u8] {
        let start = self.len();
        self.resize(start + n, 0);
        &mut self[start..]
    }
}

impl FilterBuffer for BytesMut {
    fn alloc(&mut self, n: usize) -> &mut [u8] {
        let start = self.len();
        self.resize(start + n, 0);
        &mut self[start..]
    }
}

/// Look up a filter implementation by its persisted name.
pub fn by_name(name: &str, bits_per_key: usize) -> Option<Box<dyn Filter>> {
    match name {
        BloomFilter::NAME => Some(Box::new(BloomFilter::new(bits_per_key))),
        _ => None,
    }
}
