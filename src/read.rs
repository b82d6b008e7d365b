//! [`std::io::Read`] over a [`ByteSource`].

use std::io::{self, BufRead, Read};

use crate::bytestream::{ByteSource, Fetched};

/// Reads a [`ByteSource`] front to back, holding at most one view at a time.
///
/// Every time the reader moves onto a new buffer it discards the offsets behind it, so the
/// source can evict what has already been read.
pub struct Reader<'a, S: ?Sized> {
    source: &'a S,
    pos: u64,
    view: Option<Fetched<'a>>,
    consumed: usize,
}

impl<'a, S: ByteSource + ?Sized> Reader<'a, S> {
    /// Reads from the start of the stream.
    pub fn new(source: &'a S) -> Self {
        Self::at(source, 0)
    }

    /// Reads from `offset`.
    pub fn at(source: &'a S, offset: u64) -> Self {
        Self {
            source,
            pos: offset,
            view: None,
            consumed: 0,
        }
    }

    /// Offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Gets a reference to the underlying source.
    pub fn get_ref(&self) -> &'a S {
        self.source
    }
}

impl<S: ByteSource + ?Sized> BufRead for Reader<'_, S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let exhausted = self
            .view
            .as_ref()
            .map_or(true, |view| self.consumed >= view.len());
        if exhausted {
            self.view = None;
            self.consumed = 0;
            self.source.discard(self.pos);
            match self.source.fetch(self.pos, 1) {
                Ok(view) => self.view = Some(view),
                Err(err) if err.is_eof() => return Ok(&[]),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(self
            .view
            .as_ref()
            .map_or(&[][..], |view| &view[self.consumed..]))
    }

    fn consume(&mut self, amt: usize) {
        self.consumed += amt;
        self.pos += amt as u64;
    }
}

impl<S: ByteSource + ?Sized> Read for Reader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let len = available.len().min(buf.len());
        buf[..len].copy_from_slice(&available[..len]);
        self.consume(len);
        Ok(len)
    }
}

impl<S: ?Sized> std::fmt::Debug for Reader<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("pos", &self.pos)
            .field("view", &self.view)
            .finish()
    }
}
