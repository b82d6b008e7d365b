use std::io::{self, Read as _};

use stdio_bytestream::{
    ByteSource, Config, Error, Reader, Seekability, Sequential, StatusKind, Stdio,
};

mod utils;

use utils::MockFile;

fn small(buf_size: usize) -> Config {
    Config::new().with_buf_size(buf_size)
}

#[test]
fn fetch_walks_to_end_of_stream() {
    let mut file = MockFile::new(b"XYZ123");
    let mut stdio = Stdio::new();
    stdio.reset(&mut file, Seekability::Seekable);

    let head = stdio.fetch(0, 3).unwrap();
    assert_eq!(&head[..3], b"XYZ");
    let tail = stdio.fetch(3, 3).unwrap();
    assert_eq!(&tail[..3], b"123");

    let err = stdio.fetch(6, 1).unwrap_err();
    assert!(matches!(err, Error::Eof { offset: 6, available: 0 }), "{err}");
    assert_eq!(err.kind(), StatusKind::Eof);
}

#[test]
fn resident_range_is_not_read_again() {
    let mut file = MockFile::new(b"0123456789");
    let stats = file.stats();
    let mut stdio = Stdio::new();
    stdio.reset(&mut file, Seekability::Seekable);

    let first = stdio.fetch(2, 4).unwrap();
    let reads = stats.reads.get();
    assert!(reads > 0);

    let second = stdio.fetch(2, 4).unwrap();
    let inner = stdio.fetch(4, 2).unwrap();
    assert_eq!(stats.reads.get(), reads);
    assert_eq!(&first[..], &second[..]);
    assert_eq!(&inner[..2], b"45");

    // Idle but not discarded: still served from memory.
    drop((first, second, inner));
    assert_eq!(&stdio.fetch(2, 1).unwrap()[..1], b"2");
    assert_eq!(stats.reads.get(), reads);
}

#[test]
fn fetch_at_end_allocates_nothing() {
    let mut file = MockFile::new(b"abc");
    let mut stdio = Stdio::new();
    stdio.reset(&mut file, Seekability::Seekable);

    drop(stdio.fetch(0, 1).unwrap());
    let before = stdio.inspect(|table| table.len());
    for offset in [3, 4, 100] {
        assert!(stdio.fetch(offset, 1).unwrap_err().is_eof());
    }
    assert_eq!(stdio.inspect(|table| table.len()), before);
}

#[test]
fn short_fetch_reports_available_and_keeps_bytes() {
    let mut file = MockFile::new(b"abcdefghij");
    let stats = file.stats();
    let mut stdio = Stdio::with_config(small(4));
    stdio.reset(&mut file, Seekability::Seekable);

    let err = stdio.fetch(8, 5).unwrap_err();
    assert!(matches!(err, Error::Eof { offset: 8, available: 2 }), "{err}");

    let reads = stats.reads.get();
    let tail = stdio.fetch(8, 1).unwrap();
    assert_eq!(&tail[..], b"ij");
    assert_eq!(stats.reads.get(), reads);
}

#[test]
fn zero_min_len_still_yields_a_byte() {
    let mut file = MockFile::new(b"q");
    let mut stdio = Stdio::new();
    stdio.reset(&mut file, Seekability::Seekable);

    assert_eq!(&stdio.fetch(0, 0).unwrap()[..], b"q");
    assert!(stdio.fetch(1, 0).unwrap_err().is_eof());
}

#[test]
fn adjacent_buffers_merge_under_live_views() {
    let mut file = MockFile::new(b"abcdefghij");
    let mut stdio = Stdio::with_config(small(4));
    stdio.reset(&mut file, Seekability::Seekable);

    let left = stdio.fetch(0, 2).unwrap();
    let right = stdio.fetch(4, 2).unwrap();
    assert_eq!(stdio.inspect(|table| table.len()), 2);

    let spanning = stdio.fetch(2, 5).unwrap();
    assert_eq!(&spanning[..], b"cdefgh");
    stdio.inspect(|table| {
        let bufs: Vec<_> = table
            .iter()
            .map(|buf| (buf.offset(), buf.len(), buf.refcount()))
            .collect();
        assert_eq!(bufs, [(0, 8, 3)]);
    });

    // Views taken before the merge still see their own bytes.
    assert_eq!(&left[..], b"abcd");
    assert_eq!(&right[..], b"efgh");
    drop((left, right, spanning));
    assert_eq!(stdio.inspect(|table| table.find(0).unwrap().refcount()), 0);
}

#[test]
fn buffer_grows_to_satisfy_min_len() {
    let mut file = MockFile::new(b"abcdefghij");
    let mut stdio = Stdio::with_config(small(4));
    stdio.reset(&mut file, Seekability::Seekable);

    let short = stdio.fetch(0, 2).unwrap();
    assert_eq!(&short[..], b"abcd");
    let long = stdio.fetch(0, 6).unwrap();
    assert_eq!(&long[..], b"abcdefgh");
    assert_eq!(stdio.inspect(|table| table.len()), 1);
    assert_eq!(stdio.read_offset(), 8);
}

#[test]
fn discard_lets_idle_buffers_go() {
    let mut file = MockFile::new(b"abcdefghijkl");
    let mut stdio = Stdio::with_config(small(4));
    stdio.reset(&mut file, Seekability::Seekable);

    let held = stdio.fetch(0, 1).unwrap();
    drop(stdio.fetch(4, 1).unwrap());
    drop(stdio.fetch(8, 1).unwrap());
    assert_eq!(stdio.resident_bytes(), 12);

    stdio.discard(8);
    assert_eq!(stdio.resident_bytes(), 8, "held buffer must survive discard");
    drop(held);
    assert_eq!(stdio.resident_bytes(), 4);
    assert!(stdio.inspect(|table| table.find(8).is_some()));
}

#[test]
fn resident_limit_evicts_lowest_idle_buffers() {
    let mut file = MockFile::new(b"abcdefghijkl");
    let stats = file.stats();
    let mut stdio = Stdio::with_config(small(4).with_resident_limit(8));
    stdio.reset(&mut file, Seekability::Seekable);

    for offset in [0, 4, 8] {
        drop(stdio.fetch(offset, 1).unwrap());
    }
    assert_eq!(stdio.resident_bytes(), 8);
    assert!(stdio.inspect(|table| table.find(0).is_none()));

    // Seekable: an evicted range is simply read again.
    let reads = stats.reads.get();
    assert_eq!(&stdio.fetch(0, 1).unwrap()[..], b"abcd");
    assert!(stats.reads.get() > reads);
}

#[test]
fn sequential_refetch_after_eviction_fails() {
    let mut file = MockFile::new(b"abcdefgh");
    let stats = file.stats();
    let mut stdio = Stdio::with_config(small(4).with_resident_limit(0));
    stdio.reset(&mut file, Seekability::Sequential);

    assert_eq!(&stdio.fetch(0, 4).unwrap()[..], b"abcd");
    assert_eq!(stdio.resident_bytes(), 0);
    assert_eq!(&stdio.fetch(4, 4).unwrap()[..], b"efgh");

    let err = stdio.fetch(0, 1).unwrap_err();
    assert_eq!(err.kind(), StatusKind::IoError);
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::Unsupported);
    assert_eq!(stats.seeks.get(), 0);
    assert!(stdio.inspect(|table| table.is_empty()));
}

#[test]
fn read_error_surfaces_as_io_error() {
    struct Broken;

    impl io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    impl io::Seek for Broken {
        fn seek(&mut self, _: io::SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    let mut handle = Broken;
    let mut stdio = Stdio::new();
    stdio.reset(&mut handle, Seekability::Seekable);
    let err = stdio.fetch(0, 1).unwrap_err();
    assert!(matches!(err, Error::Io { op: "read", .. }), "{err}");
    assert!(stdio.inspect(|table| table.is_empty()));
}

#[test]
fn read_at_crosses_buffers() {
    let mut file = MockFile::new(b"0123456789");
    let mut stdio = Stdio::with_config(small(4));
    stdio.reset(&mut file, Seekability::Seekable);

    let mut dst = [0; 6];
    assert_eq!(stdio.read_at(2, &mut dst).unwrap(), 6);
    assert_eq!(&dst, b"234567");

    let mut dst = [0; 5];
    assert_eq!(stdio.read_at(8, &mut dst).unwrap(), 2);
    assert_eq!(&dst[..2], b"89");
    assert_eq!(stdio.read_at(10, &mut dst).unwrap(), 0);
}

#[test]
#[ntest::timeout(1000)]
fn reader_streams_and_discards() {
    let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
    let mut file = MockFile::new(&data);
    let mut stdio = Stdio::with_config(small(7));
    stdio.reset(&mut file, Seekability::Seekable);

    let mut out = Vec::new();
    let mut reader = Reader::new(&stdio);
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
    assert_eq!(reader.position(), 1000);
    drop(reader);
    assert_eq!(stdio.resident_bytes(), 0);
}

#[test]
fn reader_starts_at_offset() {
    let mut file = MockFile::new(b"header:body");
    let mut stdio = Stdio::new();
    stdio.reset(&mut file, Seekability::Seekable);

    let mut body = String::new();
    Reader::at(&stdio, 7).read_to_string(&mut body).unwrap();
    assert_eq!(body, "body");
}

#[test]
fn random_access_matches_file() {
    use rand::{rngs::StdRng, Rng as _, SeedableRng as _};

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let data: Vec<u8> = (0..4096).map(|_| rng.random()).collect();
    let mut file = MockFile::new(&data);
    let mut stdio = Stdio::with_config(small(100).with_resident_limit(1000));
    stdio.reset(&mut file, Seekability::Seekable);

    for _ in 0..500 {
        let offset = rng.random_range(0..data.len());
        let len = rng.random_range(0..300);
        let mut dst = vec![0; len];
        let copied = stdio.read_at(offset as u64, &mut dst).unwrap();
        let expected = &data[offset..(offset + len).min(data.len())];
        assert_eq!(&dst[..copied], expected);
        assert!(stdio.resident_bytes() <= 1000);
    }
}

#[test]
fn read_error_after_partial_fill_is_not_eof() {
    let mut file = MockFile::new(b"abcdefgh");
    file.fail_read = Some(1);
    let stats = file.stats();
    let mut stdio = Stdio::with_config(small(4));
    stdio.reset(&mut file, Seekability::Seekable);

    let err = stdio.fetch(0, 10).unwrap_err();
    assert!(matches!(err, Error::Io { op: "read", .. }), "{err}");
    assert_eq!(err.kind(), StatusKind::IoError);

    // What arrived before the failure stays resident.
    assert_eq!(stdio.resident_bytes(), 4);
    let reads = stats.reads.get();
    assert_eq!(&stdio.fetch(0, 2).unwrap()[..], b"abcd");
    assert_eq!(stats.reads.get(), reads);

    // The handle recovered, so asking again reads on to the real end.
    let err = stdio.fetch(0, 10).unwrap_err();
    assert!(matches!(err, Error::Eof { offset: 0, available: 8 }), "{err}");
}

#[test]
#[ntest::timeout(1000)]
fn huge_min_len_is_eof_not_allocation() {
    let mut file = MockFile::new(b"XYZ123");
    let mut stdio = Stdio::new();
    stdio.reset(&mut file, Seekability::Seekable);

    for min_len in [usize::MAX, usize::MAX / 2, 1 << 40] {
        let err = stdio.fetch(0, min_len).unwrap_err();
        assert!(matches!(err, Error::Eof { offset: 0, available: 6 }), "{err}");
    }
    assert_eq!(stdio.resident_bytes(), 6);
    assert_eq!(
        stdio.fetch(1, usize::MAX).unwrap_err().kind(),
        StatusKind::InvalidArgument
    );
}

#[test]
fn non_seekable_reader_binds_sequentially() {
    let mut input = Sequential::new(&b"first line\nsecond line"[..]);
    let mut stdio = Stdio::with_config(small(8).with_resident_limit(0));
    stdio.reset(&mut input, Seekability::Sequential);

    let mut text = String::new();
    Reader::new(&stdio).read_to_string(&mut text).unwrap();
    assert_eq!(text, "first line\nsecond line");

    let err = stdio.fetch(0, 1).unwrap_err();
    assert_eq!(err.kind(), StatusKind::IoError);
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::Unsupported);
}

#[test]
fn sequential_wrapper_refuses_to_seek() {
    let mut input = Sequential::new(&b"data"[..]);
    let mut stdio = Stdio::new();
    stdio.reset(&mut input, Seekability::Seekable);

    let err = stdio.fetch(0, 1).unwrap_err();
    assert!(matches!(err, Error::Io { op: "seek", .. }), "{err}");
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::Unsupported);
    assert!(stdio.inspect(|table| table.is_empty()));
}
