//! Journal Module
//!
//! Reads and writes sequences of journals. Each journal is a stream of
//! bytes that completes before the next journal starts.
//!
//! ## Responsibilities
//! - Frame journals into checksummed chunks packed into 32 KiB blocks
//! - Reassemble multi-chunk journals on read
//! - Detect corruption and resynchronize at the next block boundary
//! - Invalidate per-journal sessions when the parent moves on
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────────── Block (32768 bytes) ────────────────────────┐
//! │ ┌──────────┬─────────┬──────────┬─────────┐                         │
//! │ │ CRC (4)  │ Len (2) │ Type (1) │ Payload │  ... more chunks ...    │
//! │ └──────────┴─────────┴──────────┴─────────┘            zero padding │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - CRC is the masked checksum of the type byte followed by the payload
//! - All integers are little-endian
//! - Type is Full (1), First (2), Middle (3) or Last (4)
//! - A chunk never crosses a block boundary; the last block may be short
//!
//! A journal is a single Full chunk, or First, any number of Middle, and
//! Last. On a format error the reader drops the rest of the block and
//! looks for the next Full or First chunk.
//!
//! ## Usage
//! ```
//! use std::io::{Read, Write};
//! use blockjournal::journal::{Reader, Writer};
//! use blockjournal::ReaderOptions;
//!
//! let mut out = Vec::new();
//! {
//!     let mut writer = Writer::new(&mut out);
//!     for s in ["alpha", "beta"] {
//!         writer.next_journal()?.write_all(s.as_bytes())?;
//!     }
//!     writer.close()?;
//! }
//!
//! let mut reader = Reader::new(out.as_slice(), ReaderOptions::default());
//! let mut seen = Vec::new();
//! while let Some(mut journal) = reader.next_journal()? {
//!     let mut s = String::new();
//!     journal.read_to_string(&mut s)?;
//!     seen.push(s);
//! }
//! assert_eq!(seen, ["alpha", "beta"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Neither readers nor writers are safe for concurrent use.

mod chunk;
mod dropper;
mod reader;
mod recovery;
mod writer;

pub use chunk::{ChunkHeader, ChunkType};
pub use dropper::{Dropper, LogDropper};
pub use reader::{Reader, SingleReader};
pub use recovery::{JournalRecovery, RecoveryResult};
pub use writer::{SingleWriter, Writer};

/// Size of a block, the unit of I/O. Part of the wire format.
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Chunk header: checksum (4) + length (2) + type (1)
pub const HEADER_SIZE: usize = 7;

/// Largest payload a single chunk can carry
pub const MAX_CHUNK_PAYLOAD: usize = BLOCK_SIZE - HEADER_SIZE;
