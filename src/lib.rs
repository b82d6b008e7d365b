//! Buffered byte streams over a single file handle.
//!
//! A [`Stdio`] endpoint wraps one handle and plays two roles:
//!
//!  Role | Trait | Operations
//! ------|-------|-----------
//!  source | [`ByteSource`] | [`fetch`](ByteSource::fetch) a view of the bytes at an absolute offset, [`discard`](ByteSource::discard) what is no longer needed
//!  sink | [`ByteSink`] | [`append`](ByteSink::append) bytes at the write cursor, [`flush`](ByteSink::flush) them to the file
//!
//! Bytes live in a [`BufferTable`] of reference-counted buffers ordered by offset. Every
//! [`Fetched`] view holds a reference on its buffer, so the bytes it points at stay put until
//! the view is dropped; fetching the same range twice returns the same bytes without rereading
//! the file.
//!
//! An endpoint is bound either to a caller-owned handle with [`Stdio::reset`] or to a file it
//! opens itself with [`Stdio::open`], and torn down with [`Stdio::uninit`].
//!
//! ```
//! use std::io::Cursor;
//! use stdio_bytestream::{ByteSink, ByteSource, Seekability, Stdio};
//!
//! let mut file = Cursor::new(Vec::new());
//! let mut stdio = Stdio::new();
//! stdio.reset(&mut file, Seekability::Seekable);
//!
//! stdio.append(b"hello, world")?;
//! stdio.flush()?;
//!
//! let view = stdio.fetch(7, 5)?;
//! assert_eq!(&view[..5], b"world");
//! drop(view);
//!
//! assert!(stdio.uninit().is_clean());
//! assert_eq!(file.get_ref(), b"hello, world");
//! # Ok::<(), stdio_bytestream::Error>(())
//! ```
//!
//! # Feature Organization
//!
//!  Feature | Does
//! ---------|------
#![cfg_attr(
    feature = "futures-io",
    doc = " `futures-io` | [`futures::io::AsyncRead`](futures_io::AsyncRead), `AsyncBufRead` and `AsyncWrite` for [`Reader`] and [`Writer`]"
)]
#![cfg_attr(
    not(feature = "futures-io"),
    doc = " `futures-io` (*inactive*) | `futures::io::AsyncRead`, `AsyncBufRead` and `AsyncWrite` for `Reader` and `Writer`"
)]
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_copy_implementations,
    missing_debug_implementations
)]

mod buffer;
mod bytestream;
mod config;
mod error;
#[cfg(feature = "futures-io")]
mod futures;
pub mod glue;
mod read;
mod stdio;
mod table;
mod util;
mod write;

pub use crate::{
    buffer::Buffer,
    bytestream::{ByteSink, ByteSource, Fetched},
    config::{Config, DEFAULT_BUF_SIZE, DEFAULT_RESIDENT_LIMIT},
    error::{Error, Result, Status, StatusKind},
    read::Reader,
    stdio::{OpenMode, Seekability, Sequential, State, Stdio, Teardown},
    table::BufferTable,
    write::Writer,
};
