//! Chunk framing
//!
//! Defines the chunk types and the 7-byte chunk header.

use super::HEADER_SIZE;

/// Position of a chunk within its journal.
///
/// The discriminants are part of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkType {
    /// The whole journal in one chunk
    Full = 1,
    /// First chunk of a multi-chunk journal
    First = 2,
    /// Neither first nor last
    Middle = 3,
    /// Last chunk of a multi-chunk journal
    Last = 4,
}

impl ChunkType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ChunkType::Full),
            2 => Some(ChunkType::First),
            3 => Some(ChunkType::Middle),
            4 => Some(ChunkType::Last),
            _ => None,
        }
    }

    /// Type for a chunk given whether it opens and/or closes its journal.
    pub fn for_position(first: bool, last: bool) -> Self {
        match (first, last) {
            (true, true) => ChunkType::Full,
            (true, false) => ChunkType::First,
            (false, false) => ChunkType::Middle,
            (false, true) => ChunkType::Last,
        }
    }

    /// Can a journal start with this chunk?
    pub fn starts_journal(self) -> bool {
        matches!(self, ChunkType::Full | ChunkType::First)
    }

    /// Does this chunk close its journal?
    pub fn ends_journal(self) -> bool {
        matches!(self, ChunkType::Full | ChunkType::Last)
    }
}

/// Raw chunk header as laid out on disk:
/// `checksum: u32 LE | length: u16 LE | type: u8`.
///
/// The type byte is kept raw so the reader can report invalid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub checksum: u32,
    pub length: u16,
    pub chunk_type: u8,
}

impl ChunkHeader {
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            checksum: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u16::from_le_bytes([bytes[4], bytes[5]]),
            chunk_type: bytes[6],
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.checksum.to_le_bytes());
        out[4..6].copy_from_slice(&self.length.to_le_bytes());
        out[6] = self.chunk_type;
        out
    }

    /// All-zero header: the rest of the block is padding.
    pub fn is_zero(&self) -> bool {
        self.checksum == 0 && self.length == 0 && self.chunk_type == 0
    }
}
