//! Journal Writer
//!
//! Frames journals into chunks and writes whole blocks to an underlying
//! `Write`.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::{Rc, Weak};

use crate::checksum;
use crate::error::{JournalError, Result};

use super::chunk::{ChunkHeader, ChunkType};
use super::{BLOCK_SIZE, HEADER_SIZE, MAX_CHUNK_PAYLOAD};

/// Writes a sequence of journals.
///
/// Call [`Writer::next_journal`] to get a [`SingleWriter`] for each journal;
/// doing so finishes the previous one. Call [`Writer::close`] to finish the
/// final journal, or [`Writer::flush`] to finish it and flush the
/// underlying writer while keeping the writer open. Dropping a writer
/// without either discards the buffered tail.
pub struct Writer<W: Write> {
    state: Rc<RefCell<WriterState<W>>>,
}

struct WriterState<W> {
    inner: W,
    /// Generation of the live session
    seq: u64,
    /// `buf[i..j]` is the chunk being assembled, header included
    i: usize,
    j: usize,
    /// `buf[..written]` already went to `inner`. Non-zero only after a flush.
    written: usize,
    /// Whether the current chunk is the first chunk of its journal
    first: bool,
    /// Whether a chunk is buffered but its header not yet filled in
    pending: bool,
    err: Option<JournalError>,
    buf: Box<[u8; BLOCK_SIZE]>,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            state: Rc::new(RefCell::new(WriterState::new(inner))),
        }
    }

    /// Start the next journal, finishing the current one.
    ///
    /// The returned writer goes stale after the next `next_journal`, `flush`,
    /// `close` or `reset`.
    pub fn next_journal(&mut self) -> Result<SingleWriter<W>> {
        let seq = {
            let mut state = self.state.borrow_mut();
            state.seq += 1;
            if let Some(err) = &state.err {
                return Err(err.clone());
            }
            if state.pending {
                state.fill_header(true);
            }
            state.i = state.j;
            state.j += HEADER_SIZE;
            // No room for a header: pad the block with zeroes and start over.
            if state.j > BLOCK_SIZE {
                let start = state.i;
                state.buf[start..].fill(0);
                state.write_block();
                if let Some(err) = &state.err {
                    return Err(err.clone());
                }
            }
            state.first = true;
            state.pending = true;
            state.seq
        };
        Ok(SingleWriter {
            state: Rc::downgrade(&self.state),
            seq,
        })
    }

    /// Finish the current journal, write everything buffered and flush the
    /// underlying writer. The block is not padded, so a later journal
    /// continues in it.
    pub fn flush(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.seq += 1;
        state.write_pending();
        if let Some(err) = &state.err {
            return Err(err.clone());
        }
        if let Err(e) = state.inner.flush() {
            let err = JournalError::from(e);
            state.err = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }

    /// Finish the current journal and close the writer. Every later call
    /// fails with [`JournalError::WriterClosed`].
    pub fn close(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.seq += 1;
        state.write_pending();
        if let Some(err) = &state.err {
            return Err(err.clone());
        }
        tracing::debug!("journal writer closed");
        state.err = Some(JournalError::WriterClosed);
        Ok(())
    }

    /// Rebind the writer to `inner` so it can be reused.
    ///
    /// The current journal is finished and written to the old destination
    /// first, unless the writer already failed or was closed. Returns the old
    /// destination together with the result of that final write.
    pub fn reset(&mut self, inner: W) -> (W, Result<()>) {
        let mut state = self.state.borrow_mut();
        state.seq += 1;
        let mut result = Ok(());
        if state.err.is_none() {
            state.write_pending();
            if let Some(err) = state.err.take() {
                result = Err(err);
            }
        }
        let old = std::mem::replace(&mut state.inner, inner);
        state.clear();
        tracing::debug!(ok = result.is_ok(), "journal writer reset");
        (old, result)
    }
}

impl<W: Write> WriterState<W> {
    /// Back to an empty block with no journal open. Keeps `seq` and the
    /// block buffer.
    fn clear(&mut self) {
        self.i = 0;
        self.j = 0;
        self.written = 0;
        self.first = false;
        self.pending = false;
        self.err = None;
    }

    fn new(inner: W) -> Self {
        Self {
            inner,
            seq: 0,
            i: 0,
            j: 0,
            written: 0,
            first: false,
            pending: false,
            err: None,
            buf: Box::new([0u8; BLOCK_SIZE]),
        }
    }

    /// Fill in the header of the chunk in `buf[i..j]`.
    fn fill_header(&mut self, last: bool) {
        assert!(
            self.i + HEADER_SIZE <= self.j && self.j <= BLOCK_SIZE,
            "bad writer state: i={} j={}",
            self.i,
            self.j
        );
        let (i, j) = (self.i, self.j);
        let length = j - i - HEADER_SIZE;
        debug_assert!(length <= MAX_CHUNK_PAYLOAD);
        let chunk_type = ChunkType::for_position(self.first, last) as u8;
        let header = ChunkHeader {
            checksum: checksum::value_of(&[&[chunk_type][..], &self.buf[i + HEADER_SIZE..j]]),
            length: length as u16,
            chunk_type,
        };
        self.buf[i..i + HEADER_SIZE].copy_from_slice(&header.encode());
    }

    /// Write the buffered block and reserve the next chunk's header.
    fn write_block(&mut self) {
        if let Err(e) = self.inner.write_all(&self.buf[self.written..]) {
            self.err = Some(e.into());
        }
        tracing::trace!(bytes = BLOCK_SIZE - self.written, "wrote journal block");
        self.i = 0;
        self.j = HEADER_SIZE;
        self.written = 0;
    }

    /// Finish the pending chunk and write everything not yet written.
    fn write_pending(&mut self) {
        if self.err.is_some() {
            return;
        }
        if self.pending {
            self.fill_header(true);
            self.pending = false;
        }
        if let Err(e) = self.inner.write_all(&self.buf[self.written..self.j]) {
            self.err = Some(e.into());
        }
        self.written = self.j;
    }
}

/// Writer for a single journal, returned by [`Writer::next_journal`].
pub struct SingleWriter<W> {
    state: Weak<RefCell<WriterState<W>>>,
    seq: u64,
}

impl<W: Write> SingleWriter<W> {
    fn upgrade(&self) -> Result<Rc<RefCell<WriterState<W>>>> {
        self.state.upgrade().ok_or(JournalError::StaleWriter)
    }

    /// Append `data` to the journal. Either all of it is accepted or the
    /// writer records an error.
    pub fn append(&mut self, mut data: &[u8]) -> Result<usize> {
        let rc = self.upgrade()?;
        let mut state = rc.borrow_mut();
        if state.seq != self.seq {
            return Err(JournalError::StaleWriter);
        }
        if let Some(err) = &state.err {
            return Err(err.clone());
        }
        let total = data.len();
        while !data.is_empty() {
            if state.j == BLOCK_SIZE {
                state.fill_header(false);
                state.write_block();
                if let Some(err) = &state.err {
                    return Err(err.clone());
                }
                state.first = false;
            }
            let start = state.j;
            let n = data.len().min(BLOCK_SIZE - start);
            state.buf[start..start + n].copy_from_slice(&data[..n]);
            state.j += n;
            data = &data[n..];
        }
        Ok(total)
    }
}

impl<W: Write> Write for SingleWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf).map_err(io::Error::from)
    }

    /// Flushing ends the journal, so it belongs to [`Writer::flush`]. This
    /// only checks that the session is still live.
    fn flush(&mut self) -> io::Result<()> {
        let rc = self.upgrade()?;
        let state = rc.borrow();
        if state.seq != self.seq {
            return Err(JournalError::StaleWriter.into());
        }
        Ok(())
    }
}
