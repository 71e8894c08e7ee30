//! 32-bit key hash used by the bloom filter.
//!
//! Murmur-like hash from LevelDB. The output is persisted indirectly through
//! the filter bits, so it must never change.

const M: u32 = 0xc6a4_a793;
const R: u32 = 24;

pub fn hash(data: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ (data.len() as u32).wrapping_mul(M);

    let mut words = data.chunks_exact(4);
    for word in &mut words {
        h = h.wrapping_add(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
        h = h.wrapping_mul(M);
        h ^= h >> 16;
    }

    let rest = words.remainder();
    if !rest.is_empty() {
        for (shift, &byte) in rest.iter().enumerate() {
            h = h.wrapping_add(u32::from(byte) << (8 * shift));
        }
        h = h.wrapping_mul(M);
        h ^= h >> R;
    }
    h
}
