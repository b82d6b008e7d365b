/// Buffer whose prefix has already been handed on (written to a file, consumed by a reader).
#[derive(Debug, Default)]
pub(crate) struct PartialBuffer<B> {
    buffer: B,
    index: usize,
}

impl<B: AsRef<[u8]>> PartialBuffer<B> {
    pub(crate) fn new(buffer: B) -> Self {
        Self { buffer, index: 0 }
    }

    pub(crate) fn written(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.index]
    }

    pub(crate) fn unwritten(&self) -> &[u8] {
        &self.buffer.as_ref()[self.index..]
    }

    pub(crate) fn advance(&mut self, amount: usize) {
        debug_assert!(
            self.index + amount <= self.buffer.as_ref().len(),
            "advanced past the end of the buffer"
        );
        self.index += amount;
    }

    pub(crate) fn get_ref(&self) -> &B {
        &self.buffer
    }

    pub(crate) fn get_mut(&mut self) -> &mut B {
        &mut self.buffer
    }
}

pub(crate) fn retry_interrupted<T>(mut op: impl FnMut() -> std::io::Result<T>) -> std::io::Result<T> {
    loop {
        match op() {
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
