//! Tests for the Bloom Filter
//!
//! These tests verify:
//! - No false negatives across filter sizes
//! - False-positive rate for 10 bits per key
//! - Serialized length and trailer byte
//! - Compatibility between different bits-per-key settings
//! - Use through the Filter trait objects and buffers

use blockjournal::filter::{self, BloomFilter, Filter};
use bytes::BytesMut;

// =============================================================================
// Helper Functions
// =============================================================================

fn int_key(i: u32) -> [u8; 4] {
    i.to_le_bytes()
}

fn build(filter: &BloomFilter, keys: impl IntoIterator<Item = u32>) -> Vec<u8> {
    filter.build(keys.into_iter().map(int_key))
}

/// Lengths 1, 2, ..., 10, 20, ..., 100, 200, ... up to 10000
fn next_length(len: u32) -> u32 {
    if len < 10 {
        len + 1
    } else if len < 100 {
        len + 10
    } else if len < 1000 {
        len + 100
    } else {
        len + 1000
    }
}

// =============================================================================
// Membership Tests
// =============================================================================

#[test]
fn test_small_filter() {
    let filter = BloomFilter::new(10);
    let bytes = filter.build([b"hello".as_slice(), b"world".as_slice()]);

    assert!(filter.contains(&bytes, b"hello"));
    assert!(filter.contains(&bytes, b"world"));
    assert!(!filter.contains(&bytes, b"x"));
    assert!(!filter.contains(&bytes, b"foo"));
}

#[test]
fn test_no_false_negatives_across_lengths() {
    let filter = BloomFilter::new(10);
    let mut len = 1;
    while len <= 10_000 {
        let bytes = build(&filter, 0..len);
        for i in 0..len {
            assert!(filter.contains(&bytes, &int_key(i)), "length {} key {}", len, i);
        }
        len = next_length(len);
    }
}

#[test]
fn test_false_positive_rate() {
    let filter = BloomFilter::new(10);
    let keys = 10_000u32;
    let bytes = build(&filter, 0..keys);

    let probes = 10_000u32;
    let hits = (0..probes)
        .filter(|i| filter.contains(&bytes, &int_key(1_000_000_000 + i)))
        .count();
    let rate = hits as f64 / probes as f64;

    // Roughly 1% in practice; allow twice 0.69^10.
    let bound = 2.0 * 0.69f64.powi(10);
    assert!(rate < bound, "false positive rate {} exceeds {}", rate, bound);
}

#[test]
fn test_false_positive_rate_per_length() {
    let filter = BloomFilter::new(10);
    let mut mediocre = 0;
    let mut good = 0;
    let mut len = 1;
    while len <= 10_000 {
        let bytes = build(&filter, 0..len);
        let hits = (0..10_000u32)
            .filter(|i| filter.contains(&bytes, &int_key(1_000_000_000 + i)))
            .count();
        let rate = hits as f64 / 10_000.0;
        assert!(rate <= 0.02, "length {} rate {}", len, rate);
        if rate > 0.0125 {
            mediocre += 1;
        } else {
            good += 1;
        }
        len = next_length(len);
    }
    assert!(mediocre <= good / 5, "{} mediocre vs {} good filters", mediocre, good);
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encoded_length() {
    for (keys, bits_per_key) in [(0u32, 10usize), (1, 10), (6, 10), (7, 10), (100, 10), (1000, 3), (33, 17)] {
        let filter = BloomFilter::new(bits_per_key);
        let bytes = build(&filter, 0..keys);
        let expected_bits = (keys as usize * bits_per_key).max(64);
        assert_eq!(bytes.len(), expected_bits.div_ceil(8) + 1, "{} keys at {} bits", keys, bits_per_key);
        assert_eq!(filter.generator().encoded_len(keys as usize), bytes.len());
    }
}

#[test]
fn test_trailer_records_probe_count() {
    for bits_per_key in [1usize, 5, 10, 20, 44, 100] {
        let filter = BloomFilter::new(bits_per_key);
        let bytes = build(&filter, 0..100);
        assert_eq!(*bytes.last().unwrap(), filter.probes());
    }
}

#[test]
fn test_filters_readable_with_other_parameters() {
    let writer = BloomFilter::new(20);
    let reader = BloomFilter::new(4);
    let bytes = build(&writer, 0..500);
    for i in 0..500 {
        assert!(reader.contains(&bytes, &int_key(i)));
    }
}

// =============================================================================
// Trait and Buffer Tests
// =============================================================================

#[test]
fn test_generator_through_trait_objects() {
    let filter = filter::by_name(BloomFilter::NAME, 10).unwrap();
    let mut generator = filter.new_generator();

    let mut buf = BytesMut::new();
    for i in 0..50 {
        generator.add(&int_key(i));
    }
    generator.generate(&mut buf);
    let first_len = buf.len();

    // A second filter appended to the same buffer starts from scratch.
    generator.add(b"only");
    generator.generate(&mut buf);

    let (first, second) = buf.split_at(first_len);
    for i in 0..50 {
        assert!(filter.contains(first, &int_key(i)));
    }
    assert!(filter.contains(second, b"only"));
    assert_eq!(second.len(), 9);
}

#[test]
fn test_same_keys_same_bytes() {
    let filter = BloomFilter::new(10);
    let mut vec_buf: Vec<u8> = Vec::new();
    let mut generator = filter.new_generator();
    for key in ["a", "b", "c"] {
        generator.add(key.as_bytes());
    }
    generator.generate(&mut vec_buf);

    assert_eq!(vec_buf, filter.build(["a", "b", "c"]));
}
