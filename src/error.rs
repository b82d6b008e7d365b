//! Errors and status reporting.

use std::{fmt, io};

/// Result type for byte stream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching, appending or binding a stream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying handle failed to open, read, write or seek.
    #[error("failed to {op}: {source}")]
    Io {
        /// The operation that failed.
        op: &'static str,
        /// The cause reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// The stream ended before the requested bytes were available.
    ///
    /// This is not a failure of the handle: callers use it to tell "done" apart from "broken".
    #[error("end of stream at offset {offset} ({available} bytes available)")]
    Eof {
        /// The offset that was requested.
        offset: u64,
        /// How many bytes exist at and after `offset`.
        available: usize,
    },

    /// The request is malformed or not valid in the endpoint's current state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        Self::Io { op, source }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// The status kind this error reports as.
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Io { .. } => StatusKind::IoError,
            Self::Eof { .. } => StatusKind::Eof,
            Self::InvalidArgument(_) => StatusKind::InvalidArgument,
        }
    }

    /// Whether this error is an end-of-stream condition.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof { .. })
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io { source, .. } => source,
            Error::Eof { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            Error::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
        }
    }
}

/// Coarse classification of an operation's outcome.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// The operation succeeded.
    #[default]
    Ok,
    /// Open, read, write or seek failed.
    IoError,
    /// End of stream was reached.
    Eof,
    /// The arguments or the endpoint state were invalid.
    InvalidArgument,
}

/// A caller-owned record of the last operation's outcome.
///
/// Every fallible operation returns a [`Result`]; `Status` is for callers that prefer to thread
/// a single status object through a pipeline and check it once at the end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    kind: StatusKind,
    message: String,
}

impl Status {
    /// A fresh `Ok` status.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded kind.
    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    /// The recorded message, empty for `Ok`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the recorded kind is [`StatusKind::Ok`].
    pub fn is_ok(&self) -> bool {
        self.kind == StatusKind::Ok
    }

    /// Whether the recorded kind is [`StatusKind::Eof`].
    pub fn is_eof(&self) -> bool {
        self.kind == StatusKind::Eof
    }

    /// Overwrite the status from `err`.
    pub fn set(&mut self, err: &Error) {
        self.kind = err.kind();
        self.message = err.to_string();
    }

    /// Return to `Ok`.
    pub fn clear(&mut self) {
        self.kind = StatusKind::Ok;
        self.message.clear();
    }

    /// Record the outcome of `result`, passing through the success value.
    pub fn record<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.clear();
                Some(value)
            }
            Err(err) => {
                self.set(&err);
                None
            }
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{:?}: {}", self.kind, self.message)
        }
    }
}
