//! Bloom filter
//!
//! One 32-bit hash per key; `k` probe positions are derived from it by
//! double hashing (Kirsch and Mitzenmacher, 2006).

use super::hash::hash;
use super::{Filter, FilterBuffer, FilterGenerator};

const SEED: u32 = 0xbc9f_1d34;

/// Largest probe count written. Larger trailer values are reserved.
const MAX_PROBES: usize = 30;

/// Small filters have very high false-positive rates, so never go below
/// this many bits.
const MIN_BITS: usize = 64;

fn bloom_hash(key: &[u8]) -> u32 {
    hash(key, SEED)
}

/// Bloom filter with a fixed bits-per-key ratio.
///
/// The probe count is stored in each serialized filter, so filters built
/// with a different `bits_per_key` remain readable. For the same reason the
/// name does not include the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomFilter {
    bits_per_key: usize,
}

impl BloomFilter {
    pub const NAME: &'static str = "leveldb.BuiltinBloomFilter";

    /// `bits_per_key = 10` gives roughly a 1% false-positive rate.
    pub fn new(bits_per_key: usize) -> Self {
        Self { bits_per_key }
    }

    pub fn bits_per_key(&self) -> usize {
        self.bits_per_key
    }

    /// Probe count for this ratio: `bits_per_key * ln 2`, rounded down to
    /// save a little probing, within `1..=30`.
    pub fn probes(&self) -> u8 {
        (self.bits_per_key * 69 / 100).clamp(1, MAX_PROBES) as u8
    }

    pub fn generator(&self) -> BloomFilterGenerator {
        BloomFilterGenerator {
            bits_per_key: self.bits_per_key,
            k: self.probes(),
            key_hashes: Vec::new(),
        }
    }

    /// Serialize a filter for `keys` in one go.
    pub fn build<I, K>(&self, keys: I) -> Vec<u8>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut generator = self.generator();
        for key in keys {
            generator.add(key.as_ref());
        }
        let mut out: Vec<u8> = Vec::new();
        generator.generate(&mut out);
        out
    }
}

impl Filter for BloomFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn contains(&self, filter: &[u8], key: &[u8]) -> bool {
        if filter.len() < 2 {
            return false;
        }
        let n_bytes = filter.len() - 1;
        let n_bits = (n_bytes * 8) as u64;

        let k = filter[n_bytes];
        if usize::from(k) > MAX_PROBES {
            // Reserved for new encodings of short filters. Consider it a match.
            return true;
        }

        let mut h = bloom_hash(key);
        let delta = h.rotate_right(17);
        for _ in 0..k {
            let pos = u64::from(h) % n_bits;
            if filter[(pos / 8) as usize] & (1 << (pos % 8)) == 0 {
                return false;
            }
            h = h.wrapping_add(delta);
        }
        true
    }

    fn new_generator(&self) -> Box<dyn FilterGenerator> {
        Box::new(self.generator())
    }
}

/// Accumulates key hashes for one bloom filter at a time.
#[derive(Debug, Clone)]
pub struct BloomFilterGenerator {
    bits_per_key: usize,
    k: u8,
    key_hashes: Vec<u32>,
}

impl BloomFilterGenerator {
    /// Keys added since the last `generate`
    pub fn len(&self) -> usize {
        self.key_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_hashes.is_empty()
    }

    /// Serialized size of a filter over `keys` keys.
    pub fn encoded_len(&self, keys: usize) -> usize {
        (keys * self.bits_per_key).max(MIN_BITS).div_ceil(8) + 1
    }
}

impl FilterGenerator for BloomFilterGenerator {
    fn add(&mut self, key: &[u8]) {
        self.key_hashes.push(bloom_hash(key));
    }

    fn generate(&mut self, buf: &mut dyn FilterBuffer) {
        let n_bytes = self.encoded_len(self.key_hashes.len()) - 1;
        let n_bits = (n_bytes * 8) as u64;

        let dest = buf.alloc(n_bytes + 1);
        dest[n_bytes] = self.k;
        for &key_hash in &self.key_hashes {
            let mut h = key_hash;
            let delta = h.rotate_right(17);
            for _ in 0..self.k {
                let pos = u64::from(h) % n_bits;
                dest[(pos / 8) as usize] |= 1 << (pos % 8);
                h = h.wrapping_add(delta);
            }
        }

        self.key_hashes.clear();
    }
}
