//! The stream endpoint: one file handle, one buffer table, a source role and a sink role.

mod mode;
mod sequential;
mod sink;
mod source;

pub use self::{mode::OpenMode, sequential::Sequential};

use std::{
    cell::RefCell,
    fmt,
    fs::File,
    io::{self, Seek, SeekFrom},
    path::Path,
};

use crate::{
    config::Config,
    error::{Error, Result},
    table::BufferTable,
    util::retry_interrupted,
};

/// Whether the bound handle can reposition.
///
/// Declared when binding: a sequential handle is only ever read and written forward from where
/// it stood at bind time, and fetching a range that has been evicted fails instead of seeking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seekability {
    /// Offsets are absolute positions in the file and evicted ranges can be read again.
    Seekable,
    /// Pipes, sockets, terminals: offsets count from the handle's position at bind time.
    ///
    /// Handles that do not implement [`Seek`] are bound through a [`Sequential`] wrapper.
    Sequential,
}

/// What an endpoint is currently bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No handle; every stream operation fails with `InvalidArgument`.
    Unbound,
    /// A caller-owned handle that stays open after teardown.
    Borrowed,
    /// A file opened by the endpoint and closed on teardown.
    Owned,
}

/// What [`Stdio::uninit`] did.
#[must_use]
#[derive(Debug)]
pub struct Teardown {
    discarded: usize,
    closed: bool,
    close_error: Option<io::Error>,
}

impl Teardown {
    /// Appended bytes that had not been flushed and were thrown away.
    pub fn discarded_bytes(&self) -> usize {
        self.discarded
    }

    /// Whether nothing was lost: everything appended was flushed and an owned file reached
    /// storage without error.
    pub fn is_clean(&self) -> bool {
        self.discarded == 0 && self.close_error.is_none()
    }

    /// Whether an owned file was closed.
    pub fn closed_handle(&self) -> bool {
        self.closed
    }

    /// The error syncing an owned, writable file to storage before closing it, if any.
    pub fn close_error(&self) -> Option<&io::Error> {
        self.close_error.as_ref()
    }

    /// Turns a failed close into an [`Error::Io`].
    pub fn into_close_result(self) -> Result<()> {
        match self.close_error {
            Some(err) => Err(Error::io("close", err)),
            None => Ok(()),
        }
    }
}

/// Runs before an owned handle is dropped, since dropping a `File` swallows its errors.
type Close<H> = fn(&H) -> io::Result<()>;

enum Binding<'h, H> {
    Unbound,
    Borrowed(&'h mut H),
    Owned(H, Option<Close<H>>),
}

pub(crate) struct Io<'h, H> {
    binding: Binding<'h, H>,
    seekability: Seekability,
    /// Where the handle is known to stand, if anywhere.
    pos: Option<u64>,
    read_offset: u64,
    write_offset: u64,
}

impl<'h, H> Io<'h, H> {
    fn unbound() -> Self {
        Self {
            binding: Binding::Unbound,
            seekability: Seekability::Seekable,
            pos: None,
            read_offset: 0,
            write_offset: 0,
        }
    }

    fn state(&self) -> State {
        match self.binding {
            Binding::Unbound => State::Unbound,
            Binding::Borrowed(_) => State::Borrowed,
            Binding::Owned(..) => State::Owned,
        }
    }

    pub(crate) fn handle(&mut self) -> Result<&mut H> {
        match &mut self.binding {
            Binding::Unbound => Err(Error::invalid("endpoint is not bound to a file")),
            Binding::Borrowed(handle) => Ok(&mut **handle),
            Binding::Owned(handle, _) => Ok(handle),
        }
    }
}

impl<'h, H: Seek> Io<'h, H> {
    /// Moves the handle to `pos`, seeking only if it is not already there.
    pub(crate) fn position(&mut self, pos: u64) -> Result<&mut H> {
        self.handle()?;
        if self.pos != Some(pos) {
            if self.seekability == Seekability::Sequential {
                let at = self.pos.map_or_else(|| "an unknown offset".into(), |at| at.to_string());
                return Err(Error::io(
                    "seek",
                    io::Error::new(
                        io::ErrorKind::Unsupported,
                        format!("sequential handle is at {at}, cannot reach offset {pos}"),
                    ),
                ));
            }
            let handle = self.handle()?;
            retry_interrupted(|| handle.seek(SeekFrom::Start(pos)))
                .map_err(|err| Error::io("seek", err))?;
            self.pos = Some(pos);
        }
        self.handle()
    }
}

/// A buffered stream over one file handle, acting as both a [`ByteSource`] and a
/// [`ByteSink`].
///
/// The endpoint starts unbound. [`reset`](Stdio::reset) binds a handle the caller keeps
/// owning; [`open`](Stdio::open) opens a file the endpoint owns. [`uninit`](Stdio::uninit)
/// tears it down, closing an owned file.
///
/// Reading and writing go through `&self` so one reader and one writer can interleave while
/// views are outstanding. The endpoint does no locking and is not `Sync`.
///
/// [`ByteSource`]: crate::ByteSource
/// [`ByteSink`]: crate::ByteSink
pub struct Stdio<'h, H = File> {
    config: Config,
    table: RefCell<BufferTable>,
    io: RefCell<Io<'h, H>>,
}

impl<'h, H> Stdio<'h, H> {
    /// Creates an unbound endpoint with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an unbound endpoint with the given sizing.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            table: RefCell::new(BufferTable::new(config.resident_limit())),
            io: RefCell::new(Io::unbound()),
        }
    }

    /// The sizing this endpoint was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// What the endpoint is bound to.
    pub fn state(&self) -> State {
        self.io.borrow().state()
    }

    /// Seekability declared (or detected) at bind time.
    pub fn seekability(&self) -> Seekability {
        self.io.borrow().seekability
    }

    /// Binds a caller-owned handle, dropping every buffer and resetting both cursors.
    ///
    /// The handle stays borrowed until the endpoint is torn down, and is left open afterwards.
    /// A sequential handle is taken to stand at stream offset 0. Output that was appended but not
    /// flushed under a previous binding is discarded.
    pub fn reset(&mut self, handle: &'h mut H, seekability: Seekability) {
        let pos = match seekability {
            Seekability::Seekable => None,
            Seekability::Sequential => Some(0),
        };
        self.rebind(Binding::Borrowed(handle), seekability, pos, 0);
        tracing::debug!(?seekability, "bound borrowed handle");
    }

    /// Tears the endpoint down: every buffer is released and an owned file is closed.
    ///
    /// Call [`flush`](crate::ByteSink::flush) first. Unflushed output is discarded, reported by
    /// [`Teardown::discarded_bytes`] and logged as a warning.
    pub fn uninit(mut self) -> Teardown {
        self.teardown()
    }

    /// End of the furthest byte read from the file so far.
    pub fn read_offset(&self) -> u64 {
        self.io.borrow().read_offset
    }

    /// Offset the next appended byte will land at.
    pub fn write_offset(&self) -> u64 {
        self.io.borrow().write_offset
    }

    /// Bytes appended but not yet flushed.
    pub fn pending_bytes(&self) -> usize {
        self.table.borrow().unflushed_bytes()
    }

    /// Bytes currently held in memory.
    pub fn resident_bytes(&self) -> usize {
        self.table.borrow().resident_bytes()
    }

    /// Runs `f` against the buffer table.
    pub fn inspect<R>(&self, f: impl FnOnce(&BufferTable) -> R) -> R {
        f(&self.table.borrow())
    }

    fn rebind(
        &mut self,
        binding: Binding<'h, H>,
        seekability: Seekability,
        pos: Option<u64>,
        write_offset: u64,
    ) {
        let discarded = self.table.get_mut().clear();
        if discarded > 0 {
            tracing::warn!(discarded, "rebinding discarded unflushed output");
        }
        let previous = std::mem::replace(
            self.io.get_mut(),
            Io {
                binding,
                seekability,
                pos,
                read_offset: 0,
                write_offset,
            },
        );
        let _ = release(previous.binding);
    }

    fn teardown(&mut self) -> Teardown {
        let discarded = self.table.get_mut().clear();
        if discarded > 0 {
            tracing::warn!(discarded, "endpoint torn down with unflushed output");
        }
        let io = std::mem::replace(self.io.get_mut(), Io::unbound());
        let (closed, close_error) = release(io.binding);
        Teardown {
            discarded,
            closed,
            close_error,
        }
    }
}

/// Gives up a binding, closing an owned handle. Returns whether one was closed and how syncing
/// it went.
fn release<H>(binding: Binding<'_, H>) -> (bool, Option<io::Error>) {
    let Binding::Owned(handle, close) = binding else {
        return (false, None);
    };
    let result = close.map_or(Ok(()), |close| close(&handle));
    drop(handle);
    if let Err(err) = &result {
        tracing::warn!(%err, "owned file failed to reach storage on close");
    }
    (true, result.err())
}

impl<'h> Stdio<'h, File> {
    /// Opens `path` with an `fopen`-style `mode` and binds the endpoint to it.
    ///
    /// Regular files are seekable; anything else is treated as sequential. Append modes start
    /// the write cursor at the end of the file. If opening fails the endpoint is left exactly as
    /// it was.
    pub fn open(&mut self, path: impl AsRef<Path>, mode: &str) -> Result<()> {
        self.open_path(path.as_ref(), mode)
    }

    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    fn open_path(&mut self, path: &Path, mode: &str) -> Result<()> {
        let mode: OpenMode = mode.parse()?;
        let file = mode
            .options()
            .open(path)
            .map_err(|err| Error::io("open", err))?;
        let metadata = file.metadata().map_err(|err| Error::io("stat", err))?;

        let seekability = if metadata.is_file() {
            Seekability::Seekable
        } else {
            Seekability::Sequential
        };
        let write_offset = if mode.is_append() { metadata.len() } else { 0 };

        let close: Option<Close<File>> = mode.is_write().then_some(File::sync_all);
        self.rebind(Binding::Owned(file, close), seekability, Some(0), write_offset);
        tracing::debug!(?seekability, write_offset, "opened owned handle");
        Ok(())
    }
}

impl<H> Default for Stdio<'_, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Drop for Stdio<'_, H> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

impl<H> fmt::Debug for Stdio<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let io = self.io.borrow();
        f.debug_struct("Stdio")
            .field("state", &io.state())
            .field("seekability", &io.seekability)
            .field("read_offset", &io.read_offset)
            .field("write_offset", &io.write_offset)
            .field("table", &*self.table.borrow())
            .finish()
    }
}
