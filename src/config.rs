/// Default size of each buffer, currently 8 KB.
pub const DEFAULT_BUF_SIZE: usize = 8192;

/// Default number of resident bytes above which idle buffers are evicted, currently 1 MB.
pub const DEFAULT_RESIDENT_LIMIT: usize = 1 << 20;

/// Sizing of an endpoint's buffer table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    buf_size: usize,
    resident_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buf_size: DEFAULT_BUF_SIZE,
            resident_limit: DEFAULT_RESIDENT_LIMIT,
        }
    }
}

impl Config {
    /// The default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Granularity of file reads and capacity of each sink buffer. Clamped to at least one byte.
    pub fn with_buf_size(mut self, buf_size: usize) -> Self {
        self.buf_size = buf_size.max(1);
        self
    }

    /// Resident bytes above which unreferenced buffers are evicted, lowest offsets first.
    ///
    /// Referenced buffers and unflushed output are never evicted, so the table can exceed this.
    pub fn with_resident_limit(mut self, resident_limit: usize) -> Self {
        self.resident_limit = resident_limit;
        self
    }

    /// See [`Config::with_buf_size`].
    pub fn buf_size(&self) -> usize {
        self.buf_size
    }

    /// See [`Config::with_resident_limit`].
    pub fn resident_limit(&self) -> usize {
        self.resident_limit
    }
}
