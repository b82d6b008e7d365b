use std::io::{self, Read, Seek};

use bytes::BytesMut;

use super::{Io, Stdio};
use crate::{
    bytestream::{ByteSource, Fetched},
    error::{Error, Result},
    table::BufferTable,
    util::retry_interrupted,
};

fn overlaps_unflushed(offset: u64) -> Error {
    Error::invalid(format!(
        "fetch overlaps unflushed output at offset {offset}, flush first"
    ))
}

impl<H: Read + Seek> ByteSource for Stdio<'_, H> {
    fn fetch(&self, offset: u64, min_len: usize) -> Result<Fetched<'_>> {
        let want = min_len.max(1);
        let target = offset
            .checked_add(want as u64)
            .ok_or_else(|| Error::invalid(format!("{want} bytes at {offset} overflow the stream")))?;

        let mut io = self.io.borrow_mut();
        io.handle()?;
        let mut table = self.table.borrow_mut();

        let idx = table.allocate_index(offset);
        let filled = self.fill(&mut table, &mut io, idx, target);

        let (start, len, pending) = match table.get(idx) {
            Some(buf) => (buf.offset(), buf.len(), buf.is_pending()),
            None => return Err(Error::invalid(format!("buffer at {offset} vanished"))),
        };
        let available = (start + len as u64).saturating_sub(offset);
        if filled.is_err() || available < want as u64 {
            if len == 0 && !pending {
                table.evict(start);
            }
            filled?;
            return Err(Error::Eof {
                offset,
                available: available as usize,
            });
        }

        let bytes = table
            .get(idx)
            .and_then(|buf| buf.view(offset))
            .ok_or_else(|| overlaps_unflushed(offset))?;
        table.acquire(offset);
        table.enforce_limit();
        tracing::trace!(offset, len = bytes.len(), "fetched");
        Ok(Fetched::new(&self.table, offset, bytes))
    }

    fn discard(&self, offset: u64) {
        self.table.borrow_mut().discard(offset);
    }
}

impl<H: Read + Seek> Stdio<'_, H> {
    /// Grows the filled buffer at `idx` until it reaches `target` or the file ends.
    ///
    /// Adjacent filled buffers are merged in rather than read again.
    fn fill(
        &self,
        table: &mut BufferTable,
        io: &mut Io<'_, H>,
        idx: usize,
        target: u64,
    ) -> Result<()> {
        let buf_size = self.config.buf_size() as u64;
        loop {
            let (end, pending) = match table.get(idx) {
                Some(buf) => (buf.end(), buf.is_pending()),
                None => return Ok(()),
            };
            if pending {
                return Err(overlaps_unflushed(end));
            }
            if end >= target {
                return Ok(());
            }

            let limit = match table.get(idx + 1).map(|next| (next.offset(), next.is_pending())) {
                Some((next, true)) if next == end => return Err(overlaps_unflushed(next)),
                Some((next, false)) if next == end => {
                    table.merge_next(idx);
                    continue;
                }
                Some((next, _)) => next,
                None => u64::MAX,
            };

            let needed = target - end;
            let capacity = needed
                .div_ceil(buf_size)
                .saturating_mul(buf_size)
                .min(limit - end)
                .min(usize::MAX as u64);
            let needed = needed.min(capacity);

            let (chunk, failure) =
                read_chunk(io, end, needed as usize, capacity as usize, buf_size as usize)?;
            let read = chunk.len() as u64;
            io.read_offset = io.read_offset.max(end + read);
            tracing::debug!(offset = end, len = read, "filled from file");
            if read > 0 {
                table.extend_filled(idx, chunk.freeze());
            }
            if let Some(err) = failure {
                return Err(Error::io("read", err));
            }
            if read < needed {
                return Ok(());
            }
        }
    }
}

/// Reads at `at` until `needed` bytes arrive or the file ends, growing the chunk by at most
/// `step` bytes per read and never past `capacity`.
///
/// A read error after some bytes arrived is returned next to them so they can stay resident.
fn read_chunk<H: Read + Seek>(
    io: &mut Io<'_, H>,
    at: u64,
    needed: usize,
    capacity: usize,
    step: usize,
) -> Result<(BytesMut, Option<io::Error>)> {
    let handle = io.position(at)?;
    let mut chunk = BytesMut::new();
    let mut failure = None;
    while chunk.len() < needed {
        let filled = chunk.len();
        chunk.resize(filled + step.min(capacity - filled), 0);
        match retry_interrupted(|| handle.read(&mut chunk[filled..])) {
            Ok(len) => chunk.truncate(filled + len),
            Err(err) => {
                chunk.truncate(filled);
                failure = Some(err);
            }
        }
        if failure.is_some() || chunk.len() == filled {
            break;
        }
    }
    io.pos = Some(at + chunk.len() as u64);
    Ok((chunk, failure))
}
