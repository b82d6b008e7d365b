use futures::{
    executor::block_on,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt},
};
use stdio_bytestream::{Config, Reader, Seekability, Stdio, Writer};

mod utils;

use utils::MockFile;

#[test]
#[ntest::timeout(1000)]
fn async_read_to_end() {
    let data: Vec<u8> = (0..3000u32).map(|i| i as u8).collect();
    let mut file = MockFile::new(&data);
    let mut stdio = Stdio::with_config(Config::new().with_buf_size(64));
    stdio.reset(&mut file, Seekability::Seekable);

    let mut out = Vec::new();
    block_on(Reader::new(&stdio).read_to_end(&mut out)).unwrap();
    assert_eq!(out, data);
}

#[test]
fn async_lines() {
    let mut file = MockFile::new(b"alpha\nbeta\ngamma");
    let mut stdio = Stdio::with_config(Config::new().with_buf_size(4));
    stdio.reset(&mut file, Seekability::Seekable);

    let mut reader = Reader::new(&stdio);
    let mut line = String::new();
    let mut lines = Vec::new();
    while block_on(reader.read_line(&mut line)).unwrap() > 0 {
        lines.push(std::mem::take(&mut line));
    }
    assert_eq!(lines, ["alpha\n", "beta\n", "gamma"]);
}

#[test]
fn async_write_then_close() {
    let mut file = MockFile::new(b"");
    let stats = file.stats();
    let mut stdio = Stdio::new();
    stdio.reset(&mut file, Seekability::Seekable);

    let mut writer = Writer::new(&stdio);
    block_on(async {
        writer.write_all(b"async ").await?;
        writer.write_all(b"bytes").await?;
        writer.close().await
    })
    .unwrap();
    assert_eq!(stats.flushes.get(), 1);

    assert!(stdio.uninit().is_clean());
    assert_eq!(file.contents(), b"async bytes");
}
