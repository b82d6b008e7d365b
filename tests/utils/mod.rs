#![allow(unused)] // Different tests use a different subset of functions

mod mock_file;

pub use self::mock_file::{MockFile, Stats};

use std::{fs, io::Write, path::Path};

use proptest_derive::Arbitrary;
use tempfile::NamedTempFile;

/// Output split into arbitrary appends.
#[derive(Arbitrary, Debug)]
pub struct Chunks(pub Vec<Vec<u8>>);

impl Chunks {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.iter().flatten().copied().collect()
    }
}

pub fn temp_file_with(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

pub fn contents(path: impl AsRef<Path>) -> Vec<u8> {
    fs::read(path).unwrap()
}

/// Routes `tracing` output through the test harness so it only shows for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_ansi(false)
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stdio_bytestream=trace".into()),
        )
        .try_init();
}
