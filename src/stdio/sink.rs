use std::io::{ErrorKind, Seek, Write};

use super::Stdio;
use crate::{
    bytestream::ByteSink,
    error::{Error, Result},
    util::retry_interrupted,
};

impl<H: Write + Seek> ByteSink for Stdio<'_, H> {
    fn append(&self, bytes: &[u8]) -> Result<()> {
        let mut io = self.io.borrow_mut();
        io.handle()?;
        if bytes.is_empty() {
            return Ok(());
        }

        let start = io.write_offset;
        let end = start
            .checked_add(bytes.len() as u64)
            .ok_or_else(|| Error::invalid("append overflows the stream"))?;

        let mut table = self.table.borrow_mut();
        table.clear_for_write(start, end).map_err(|pinned| {
            Error::invalid(format!(
                "cannot append over offset {pinned} while a fetched view references it"
            ))
        })?;

        let capacity = self.config.buf_size();
        let (mut rest, mut at) = (bytes, start);
        while !rest.is_empty() {
            let idx = table.write_target(at, capacity);
            let len = table.push_pending(idx, rest, capacity);
            rest = &rest[len..];
            at += len as u64;
        }
        io.write_offset = end;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn flush(&self) -> Result<()> {
        let mut io = self.io.borrow_mut();
        io.handle()?;
        let mut table = self.table.borrow_mut();
        if table.unflushed_bytes() == 0 {
            return Ok(());
        }

        let mut written = 0;
        while let Some(idx) = table.first_unflushed() {
            let Some((offset, buf)) = table.pending_mut(idx) else {
                break;
            };
            let at = offset + buf.written().len() as u64;
            let handle = io.position(at)?;
            let len = retry_interrupted(|| handle.write(buf.unwritten()))
                .map_err(|err| Error::io("write", err))?;
            if len == 0 {
                return Err(Error::io(
                    "write",
                    std::io::Error::new(ErrorKind::WriteZero, "failed to write the buffered data"),
                ));
            }
            buf.advance(len);
            io.pos = Some(at + len as u64);
            written += len;
            if buf.unwritten().is_empty() {
                table.retire(idx);
            }
        }

        let handle = io.handle()?;
        retry_interrupted(|| handle.flush()).map_err(|err| Error::io("flush", err))?;
        tracing::debug!(written, "flushed");
        Ok(())
    }
}
