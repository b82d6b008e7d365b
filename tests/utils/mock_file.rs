use std::{
    cell::Cell,
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
    rc::Rc,
};

/// Call counters shared with the test while the handle is bound.
#[derive(Debug, Default)]
pub struct Stats {
    pub reads: Cell<usize>,
    pub writes: Cell<usize>,
    pub seeks: Cell<usize>,
    pub flushes: Cell<usize>,
    pub written: Cell<usize>,
}

fn bump(cell: &Cell<usize>, by: usize) {
    cell.set(cell.get() + by);
}

/// An in-memory handle that counts calls and can misbehave on demand.
#[derive(Debug, Default)]
pub struct MockFile {
    inner: Cursor<Vec<u8>>,
    stats: Rc<Stats>,
    /// Zero-based index of the `read` call that fails.
    pub fail_read: Option<usize>,
    /// Upper bound on the bytes accepted by a single `write`.
    pub max_write: Option<usize>,
    /// Zero-based index of the `write` call that fails.
    pub fail_write: Option<usize>,
    /// Every `write` reports that nothing was written.
    pub zero_writes: bool,
}

impl MockFile {
    pub fn new(contents: &[u8]) -> Self {
        Self {
            inner: Cursor::new(contents.to_vec()),
            ..Self::default()
        }
    }

    pub fn stats(&self) -> Rc<Stats> {
        Rc::clone(&self.stats)
    }

    pub fn contents(&self) -> &[u8] {
        self.inner.get_ref()
    }
}

impl Read for MockFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let call = self.stats.reads.get();
        bump(&self.stats.reads, 1);
        if self.fail_read == Some(call) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected read failure"));
        }
        self.inner.read(buf)
    }
}

impl Write for MockFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let call = self.stats.writes.get();
        bump(&self.stats.writes, 1);
        if self.zero_writes {
            return Ok(0);
        }
        if self.fail_write == Some(call) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        let len = self.max_write.map_or(buf.len(), |max| max.min(buf.len()));
        let len = self.inner.write(&buf[..len])?;
        bump(&self.stats.written, len);
        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        bump(&self.stats.flushes, 1);
        Ok(())
    }
}

impl Seek for MockFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        bump(&self.stats.seeks, 1);
        self.inner.seek(pos)
    }
}
