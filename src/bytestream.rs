//! The two roles an endpoint plays: a pull-based byte source and a push-based byte sink.

use std::{cell::RefCell, fmt, ops::Deref};

use bytes::Bytes;

use crate::{error::Result, table::BufferTable};

/// Pull side: hands out byte ranges by absolute stream offset.
pub trait ByteSource {
    /// Returns a view of at least `min_len` bytes (at least one if `min_len` is 0) starting at
    /// `offset`, running to the end of the buffer that holds them.
    ///
    /// The view keeps its buffer resident until it is dropped. Fetching a range that is still
    /// resident returns the same bytes without touching the file.
    ///
    /// Fails with [`Error::Eof`](crate::Error::Eof) if the stream ends before `min_len` bytes.
    fn fetch(&self, offset: u64, min_len: usize) -> Result<Fetched<'_>>;

    /// Promises not to fetch below `offset` again, letting idle buffers there be evicted.
    fn discard(&self, offset: u64);

    /// Copies bytes starting at `offset` into `dst`, crossing buffer boundaries as needed.
    ///
    /// Returns the number of bytes copied, which is short only at the end of the stream.
    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<usize> {
        let mut copied = 0;
        while copied < dst.len() {
            let view = match self.fetch(offset + copied as u64, 1) {
                Ok(view) => view,
                Err(err) if err.is_eof() => break,
                Err(err) => return Err(err),
            };
            let len = view.len().min(dst.len() - copied);
            dst[copied..copied + len].copy_from_slice(&view[..len]);
            copied += len;
        }
        Ok(copied)
    }
}

/// Push side: accumulates output bytes until they are flushed.
pub trait ByteSink {
    /// Buffers `bytes` at the write cursor. Never touches the file.
    fn append(&self, bytes: &[u8]) -> Result<()>;

    /// Writes every buffered byte to the file in offset order.
    ///
    /// A second flush with nothing appended in between does no I/O. If a flush fails part way,
    /// calling it again writes only what is still missing.
    fn flush(&self) -> Result<()>;

    /// Formats `args` straight into the sink.
    fn append_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        match args.as_str() {
            Some(text) => self.append(text.as_bytes()),
            None => self.append(args.to_string().as_bytes()),
        }
    }
}

/// A counted reference to resident stream bytes.
///
/// Dereferences to the bytes from the fetched offset to the end of their buffer. Dropping the
/// view releases the reference; cloning it takes another.
pub struct Fetched<'a> {
    table: &'a RefCell<BufferTable>,
    offset: u64,
    bytes: Bytes,
}

impl<'a> Fetched<'a> {
    /// `bytes` must already be accounted for by an `acquire` on `offset`.
    pub(crate) fn new(table: &'a RefCell<BufferTable>, offset: u64, bytes: Bytes) -> Self {
        Self {
            table,
            offset,
            bytes,
        }
    }

    /// Stream offset of the first byte of the view.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stream offset one past the last byte of the view.
    pub fn end(&self) -> u64 {
        self.offset + self.bytes.len() as u64
    }

    /// The viewed bytes as a cheaply clonable handle that outlives the view's reference.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Releases the reference now rather than at the end of scope.
    pub fn release(self) {}
}

impl Deref for Fetched<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Fetched<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Clone for Fetched<'_> {
    fn clone(&self) -> Self {
        let acquired = self.table.borrow_mut().acquire(self.offset);
        debug_assert!(acquired, "cloned a view whose buffer is gone");
        Self {
            table: self.table,
            offset: self.offset,
            bytes: self.bytes.clone(),
        }
    }
}

impl Drop for Fetched<'_> {
    fn drop(&mut self) {
        self.table.borrow_mut().release(self.offset);
    }
}

impl fmt::Debug for Fetched<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetched")
            .field("range", &format_args!("{}..{}", self.offset, self.end()))
            .finish()
    }
}
