use std::io::{self, Read, Seek, SeekFrom, Write};

/// Adapts a handle that cannot reposition (stdin, a pipe, a socket) for binding with
/// [`Seekability::Sequential`](super::Seekability::Sequential).
///
/// Reads and writes pass straight through. Every seek fails with
/// [`io::ErrorKind::Unsupported`]; a sequentially bound endpoint never asks for one.
///
/// ```
/// use stdio_bytestream::{ByteSource, Seekability, Sequential, Stdio};
///
/// let mut input = Sequential::new(&b"piped"[..]);
/// let mut stdio = Stdio::new();
/// stdio.reset(&mut input, Seekability::Sequential);
/// assert_eq!(&stdio.fetch(0, 5)?[..], b"piped");
/// # Ok::<(), stdio_bytestream::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Sequential<H> {
    inner: H,
}

impl<H> Sequential<H> {
    /// Wraps `inner`.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    /// Gets a reference to the underlying handle.
    pub fn get_ref(&self) -> &H {
        &self.inner
    }

    /// Gets a mutable reference to the underlying handle.
    pub fn get_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    /// Consumes this wrapper, returning the underlying handle.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: Read> Read for Sequential<H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<H: Write> Write for Sequential<H> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<H> Seek for Sequential<H> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("sequential handle cannot seek to {pos:?}"),
        ))
    }
}
