//! [`std::io::Write`] over a [`ByteSink`].

use std::{fmt, io};

use crate::bytestream::ByteSink;

/// Appends everything written to a [`ByteSink`]; [`flush`](io::Write::flush) flushes the sink.
///
/// Writes never block on the file, only `flush` does.
pub struct Writer<'a, S: ?Sized> {
    sink: &'a S,
}

impl<'a, S: ByteSink + ?Sized> Writer<'a, S> {
    /// Writes into `sink`.
    pub fn new(sink: &'a S) -> Self {
        Self { sink }
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> &'a S {
        self.sink
    }
}

impl<S: ByteSink + ?Sized> io::Write for Writer<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.append(buf)?;
        Ok(buf.len())
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.sink.append_fmt(args).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush().map_err(Into::into)
    }
}

impl<S: ?Sized> fmt::Debug for Writer<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer").finish_non_exhaustive()
    }
}
