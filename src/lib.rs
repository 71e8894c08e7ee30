//! # blockjournal
//!
//! Two low-level primitives of an LSM-tree storage engine:
//! - A block-framed, checksummed journal (write-ahead log) format that
//!   resynchronizes after corruption
//! - A bloom filter for skipping data blocks that cannot hold a key
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐    ┌────────────┐    32 KiB blocks    ┌────────────┐    ┌──────────────┐
//! │ SingleWriter │───▶│   Writer   │───▶ io::Write ──────▶│   Reader   │───▶│ SingleReader │
//! │ (one journal)│    │ (framing)  │      io::Read        │  (resync)  │    │ (one journal)│
//! └──────────────┘    └────────────┘                     └────────────┘    └──────────────┘
//!
//! ┌──────────────────────┐  generate  ┌──────────────┐  contains  ┌─────────────┐
//! │ BloomFilterGenerator │───────────▶│ filter bytes │───────────▶│ BloomFilter │
//! └──────────────────────┘            └──────────────┘            └─────────────┘
//! ```
//!
//! Everything here is single-threaded. The journal types are not `Send`.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod checksum;

pub mod journal;
pub mod filter;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{JournalError, Result};
pub use config::{Config, ReaderOptions};
pub use filter::{BloomFilter, Filter, FilterGenerator};
pub use journal::{Reader, Writer};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blockjournal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
