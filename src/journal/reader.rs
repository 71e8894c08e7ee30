//! Journal Reader
//!
//! Reads journals from blocks pulled off an underlying `Read`.

use std::cell::RefCell;
use std::io::{self, Read};
use std::rc::{Rc, Weak};

use crate::checksum;
use crate::config::ReaderOptions;
use crate::error::{JournalError, Result};

use super::chunk::{ChunkHeader, ChunkType};
use super::dropper::Dropper;
use super::{BLOCK_SIZE, HEADER_SIZE};

/// Reads a sequence of journals.
///
/// Call [`Reader::next_journal`] to get a [`SingleReader`] for each journal.
/// It is fine to move to the next journal without reading the current one
/// to the end. A `SingleReader` goes stale as soon as `next_journal` or
/// `reset` is called again.
pub struct Reader<R> {
    state: Rc<RefCell<ReaderState<R>>>,
}

/// Terminal condition recorded by the reader.
#[derive(Debug, Clone)]
enum Halt {
    /// Input exhausted at a journal boundary
    Eof,
    /// Strict-mode corruption
    Failed(JournalError),
}

/// Outcome of one chunk-advance step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// `buf[i..j]` holds the payload of an accepted chunk
    Chunk,
    /// Something was dropped; try again
    Skip,
    /// Clean end of stream
    End,
}

struct ReaderState<R> {
    inner: R,
    dropper: Option<Box<dyn Dropper>>,
    strict: bool,
    checksum: bool,
    /// Generation of the live session
    seq: u64,
    /// `buf[i..j]` is the unread portion of the current chunk's payload
    i: usize,
    j: usize,
    /// Valid bytes in `buf`. Only the final block can have `n < BLOCK_SIZE`.
    n: usize,
    /// Bytes of the next block already read when the input last failed
    filled: usize,
    /// Whether the current chunk is the last chunk of its journal
    last: bool,
    halt: Option<Halt>,
    buf: Box<[u8; BLOCK_SIZE]>,
}

impl<R: Read> Reader<R> {
    /// Create a reader without a corruption sink.
    ///
    /// With `options.strict`, corrupted or invalid chunks halt the reader
    /// entirely. Otherwise the reader drops the damaged block and moves on.
    pub fn new(inner: R, options: ReaderOptions) -> Self {
        Self::build(inner, options, None)
    }

    /// Create a reader that reports every drop to `dropper`
    pub fn with_dropper(inner: R, options: ReaderOptions, dropper: Box<dyn Dropper>) -> Self {
        Self::build(inner, options, Some(dropper))
    }

    fn build(inner: R, options: ReaderOptions, dropper: Option<Box<dyn Dropper>>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ReaderState {
                inner,
                dropper,
                strict: options.strict,
                checksum: options.checksum,
                seq: 0,
                i: 0,
                j: 0,
                n: 0,
                filled: 0,
                last: true,
                halt: None,
                buf: Box::new([0u8; BLOCK_SIZE]),
            })),
        }
    }

    /// Advance to the next journal.
    ///
    /// Returns `Ok(None)` once the input is exhausted. In non-strict mode a
    /// journal that turns out to be corrupted part way through makes its
    /// session fail with [`JournalError::UnexpectedEof`].
    pub fn next_journal(&mut self) -> Result<Option<SingleReader<R>>> {
        let seq = {
            let mut state = self.state.borrow_mut();
            state.seq += 1;
            match &state.halt {
                Some(Halt::Eof) => return Ok(None),
                Some(Halt::Failed(err)) => return Err(err.clone()),
                None => {}
            }
            // Skip whatever is left of the previous journal's chunk.
            state.i = state.j;
            loop {
                match state.next_chunk(true)? {
                    Step::Chunk => break,
                    Step::Skip => continue,
                    Step::End => return Ok(None),
                }
            }
            state.seq
        };
        Ok(Some(SingleReader {
            state: Rc::downgrade(&self.state),
            seq,
            err: None,
        }))
    }

    /// Rebind the reader to a new input so it can be reused.
    ///
    /// Returns the previous input and the fatal error accumulated on it, if
    /// any. Reaching the end of the previous input is not an error.
    pub fn reset(
        &mut self,
        inner: R,
        options: ReaderOptions,
        dropper: Option<Box<dyn Dropper>>,
    ) -> (R, Result<()>) {
        let mut state = self.state.borrow_mut();
        state.seq += 1;
        let previous = match state.halt.take() {
            Some(Halt::Failed(err)) => Err(err),
            _ => Ok(()),
        };
        let old = std::mem::replace(&mut state.inner, inner);
        state.dropper = dropper;
        state.strict = options.strict;
        state.checksum = options.checksum;
        state.i = 0;
        state.j = 0;
        state.n = 0;
        state.filled = 0;
        state.last = true;
        (old, previous)
    }
}

impl<R: Read> ReaderState<R> {
    /// Report a drop. Strict mode turns it into the sticky error unless it is
    /// a `skip` (orphan) event.
    fn corrupt(&mut self, size: usize, reason: String, skip: bool) -> Result<Step> {
        tracing::warn!(size, reason = %reason, strict = self.strict, "journal corruption");
        if let Some(dropper) = self.dropper.as_mut() {
            dropper.notify(size, &reason);
        }
        if self.strict && !skip {
            let err = JournalError::corrupted(size, reason);
            self.halt = Some(Halt::Failed(err.clone()));
            return Err(err);
        }
        Ok(Step::Skip)
    }

    fn drop_block(&mut self) {
        self.i = self.n;
        self.j = self.n;
    }

    /// Input ran out. Fine between journals, corruption inside one.
    fn end_of_input(&mut self, first: bool) -> Result<Step> {
        if !first {
            return self.corrupt(0, "missing chunk part".to_string(), false);
        }
        tracing::debug!("journal input exhausted");
        self.halt = Some(Halt::Eof);
        Ok(Step::End)
    }

    /// Point `buf[i..j]` at the next chunk's payload, reading the next block
    /// if needed. `first` is set when looking for the start of a journal.
    fn next_chunk(&mut self, first: bool) -> Result<Step> {
        loop {
            if self.j + HEADER_SIZE <= self.n {
                let mut raw = [0u8; HEADER_SIZE];
                raw.copy_from_slice(&self.buf[self.j..self.j + HEADER_SIZE]);
                let header = ChunkHeader::decode(&raw);
                let unprocessed = self.n - self.j;

                if header.is_zero() {
                    self.drop_block();
                    return self.corrupt(unprocessed, "zero header".to_string(), false);
                }
                let chunk_type = match ChunkType::from_u8(header.chunk_type) {
                    Some(chunk_type) => chunk_type,
                    None => {
                        self.drop_block();
                        return self.corrupt(
                            unprocessed,
                            format!("invalid chunk type {:#x}", header.chunk_type),
                            false,
                        );
                    }
                };

                self.i = self.j + HEADER_SIZE;
                self.j = self.i + header.length as usize;
                if self.j > self.n {
                    self.drop_block();
                    return self.corrupt(
                        unprocessed,
                        "chunk length overflows block".to_string(),
                        false,
                    );
                }
                // Checksum covers the type byte and the payload.
                if self.checksum
                    && header.checksum != checksum::value(&self.buf[self.i - 1..self.j])
                {
                    self.drop_block();
                    return self.corrupt(unprocessed, "checksum mismatch".to_string(), false);
                }

                if first && !chunk_type.starts_journal() {
                    let chunk_len = self.j - self.i + HEADER_SIZE;
                    self.i = self.j;
                    return self.corrupt(chunk_len, "orphan chunk".to_string(), true);
                }
                self.last = chunk_type.ends_journal();
                return Ok(Step::Chunk);
            }

            // A short block can only be the last one.
            if self.n < BLOCK_SIZE && self.n > 0 {
                return self.end_of_input(first);
            }

            let n = self.fill_block()?;
            if n == 0 {
                return self.end_of_input(first);
            }
            self.i = 0;
            self.j = 0;
            self.n = n;
        }
    }

    /// Read up to one block. Fewer bytes than `BLOCK_SIZE` means the input
    /// ended.
    ///
    /// On an I/O error the bytes read so far are kept, and the next call
    /// resumes the same block, so block boundaries stay aligned.
    fn fill_block(&mut self) -> Result<usize> {
        while self.filled < BLOCK_SIZE {
            match self.inner.read(&mut self.buf[self.filled..]) {
                Ok(0) => break,
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(partial = self.filled, error = %e, "journal block read failed");
                    return Err(e.into());
                }
            }
        }
        let filled = std::mem::take(&mut self.filled);
        tracing::trace!(bytes = filled, "read journal block");
        Ok(filled)
    }
}

/// Reader for a single journal, returned by [`Reader::next_journal`].
pub struct SingleReader<R> {
    state: Weak<RefCell<ReaderState<R>>>,
    seq: u64,
    err: Option<JournalError>,
}

impl<R: Read> SingleReader<R> {
    fn upgrade(&self) -> Result<Rc<RefCell<ReaderState<R>>>> {
        self.state.upgrade().ok_or(JournalError::StaleReader)
    }

    /// Make sure `buf[i..j]` has unread payload. `Ok(false)` means the
    /// journal is complete.
    fn ready(&mut self, state: &mut ReaderState<R>) -> Result<bool> {
        if state.seq != self.seq {
            return Err(JournalError::StaleReader);
        }
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        if let Some(Halt::Failed(err)) = &state.halt {
            return Err(err.clone());
        }
        while state.i == state.j {
            if state.last {
                return Ok(false);
            }
            let err = match state.next_chunk(false) {
                Ok(Step::Chunk) => continue,
                // A dropped block cannot be resumed mid-journal.
                Ok(Step::Skip) | Ok(Step::End) => JournalError::UnexpectedEof,
                // Nothing was consumed; the caller may retry.
                Err(err @ JournalError::Io(_)) => return Err(err),
                Err(err) => err,
            };
            self.err = Some(err.clone());
            return Err(err);
        }
        Ok(true)
    }

    /// Read into `buf`, returning 0 at the end of the journal.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let rc = self.upgrade()?;
        let mut state = rc.borrow_mut();
        if !self.ready(&mut state)? {
            return Ok(0);
        }
        let start = state.i;
        let n = buf.len().min(state.j - start);
        buf[..n].copy_from_slice(&state.buf[start..start + n]);
        state.i += n;
        Ok(n)
    }

    /// Read one byte, or `None` at the end of the journal.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let rc = self.upgrade()?;
        let mut state = rc.borrow_mut();
        if !self.ready(&mut state)? {
            return Ok(None);
        }
        let byte = state.buf[state.i];
        state.i += 1;
        Ok(Some(byte))
    }

    /// Read the rest of the journal.
    ///
    /// An I/O error discards what this call gathered. Use
    /// [`SingleReader::read_chunk`] to retry without losing data.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let rc = self.upgrade()?;
        let mut state = rc.borrow_mut();
        let mut out = Vec::new();
        while self.ready(&mut state)? {
            let (start, end) = (state.i, state.j);
            out.extend_from_slice(&state.buf[start..end]);
            state.i = end;
        }
        Ok(out)
    }
}

impl<R: Read> Read for SingleReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map_err(io::Error::from)
    }
}
