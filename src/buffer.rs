use std::fmt;

use bytes::Bytes;

use crate::util::PartialBuffer;

pub(crate) enum Payload {
    /// Bytes read from the file. Never mutated in place, only replaced by a longer copy.
    Filled(Bytes),
    /// Bytes produced by the sink; the written prefix has reached the file.
    Pending(PartialBuffer<Vec<u8>>),
}

/// One resident chunk of the stream.
pub struct Buffer {
    offset: u64,
    refcount: u32,
    pub(crate) payload: Payload,
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.payload {
            Payload::Filled(_) => "filled",
            Payload::Pending(_) => "pending",
        };
        f.debug_struct("Buffer")
            .field("range", &format_args!("{}..{}", self.offset, self.end()))
            .field("kind", &kind)
            .field("refcount", &self.refcount)
            .field("unflushed", &self.unflushed())
            .finish()
    }
}

impl Buffer {
    pub(crate) fn filled(offset: u64, bytes: Bytes) -> Self {
        Self {
            offset,
            refcount: 0,
            payload: Payload::Filled(bytes),
        }
    }

    pub(crate) fn pending(offset: u64, capacity: usize) -> Self {
        Self {
            offset,
            refcount: 0,
            payload: Payload::Pending(PartialBuffer::new(Vec::with_capacity(capacity))),
        }
    }

    /// Stream offset of the first byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Filled(bytes) => bytes.len(),
            Payload::Pending(buf) => buf.get_ref().len(),
        }
    }

    /// Whether the buffer holds no bytes yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stream offset one past the last byte.
    pub fn end(&self) -> u64 {
        self.offset + self.len() as u64
    }

    /// Outstanding references handed out by the byte source.
    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    /// Whether this buffer accumulates sink output rather than holding file contents.
    pub fn is_pending(&self) -> bool {
        matches!(self.payload, Payload::Pending(_))
    }

    /// Bytes appended but not yet written to the file.
    pub fn unflushed(&self) -> usize {
        match &self.payload {
            Payload::Filled(_) => 0,
            Payload::Pending(buf) => buf.unwritten().len(),
        }
    }

    /// Whether `offset` falls inside this buffer. An empty buffer covers only its own offset.
    pub fn contains(&self, offset: u64) -> bool {
        offset == self.offset || (offset > self.offset && offset < self.end())
    }

    /// The filled bytes from `offset` to the end of the buffer.
    pub(crate) fn view(&self, offset: u64) -> Option<Bytes> {
        match &self.payload {
            Payload::Filled(bytes) => {
                let start = usize::try_from(offset.checked_sub(self.offset)?).ok()?;
                (start <= bytes.len()).then(|| bytes.slice(start..))
            }
            Payload::Pending(_) => None,
        }
    }

    pub(crate) fn inc_ref(&mut self) {
        self.refcount += 1;
    }

    pub(crate) fn dec_ref(&mut self) {
        debug_assert!(self.refcount > 0, "released a buffer with no references");
        self.refcount = self.refcount.saturating_sub(1);
    }

    pub(crate) fn add_refs(&mut self, refs: u32) {
        self.refcount += refs;
    }
}
