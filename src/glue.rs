//! Whole-stream helpers built on the two roles.

use std::path::Path;

use crate::{
    bytestream::{ByteSink, ByteSource},
    error::Result,
    stdio::Stdio,
};

/// Reads `source` from offset 0 to the end of the stream, discarding as it goes.
pub fn read_to_end<S: ByteSource + ?Sized>(source: &S) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut offset = 0;
    loop {
        let view = match source.fetch(offset, 1) {
            Ok(view) => view,
            Err(err) if err.is_eof() => break,
            Err(err) => return Err(err),
        };
        out.extend_from_slice(&view);
        offset = view.end();
        drop(view);
        source.discard(offset);
    }
    Ok(out)
}

/// Opens `path` for reading and returns its whole contents.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let mut stdio: Stdio<'_> = Stdio::new();
    stdio.open(path, "rb")?;
    let contents = read_to_end(&stdio)?;
    let _ = stdio.uninit();
    Ok(contents)
}

/// Creates or truncates `path` and writes `data` to it.
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let mut stdio: Stdio<'_> = Stdio::new();
    stdio.open(path, "wb")?;
    stdio.append(data)?;
    stdio.flush()?;
    stdio.uninit().into_close_result()
}
