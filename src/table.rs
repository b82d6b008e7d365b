//! The offset-ordered table of resident buffers.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::{
    buffer::{Buffer, Payload},
    util::PartialBuffer,
};

/// Resident buffers of one stream, sorted by offset and never overlapping.
///
/// A buffer leaves the table only when nothing references it and it holds no unflushed sink
/// output. Unreferenced file contents stay resident until the reader discards past them or the
/// table grows beyond its resident limit, so backing up over recently read bytes is served from
/// memory.
pub struct BufferTable {
    bufs: Vec<Buffer>,
    resident: usize,
    limit: usize,
    watermark: u64,
    active: Option<u64>,
}

impl fmt::Debug for BufferTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferTable")
            .field("buffers", &self.bufs)
            .field("resident", &format_args!("{}/{}", self.resident, self.limit))
            .field("watermark", &self.watermark)
            .field("active", &self.active)
            .finish()
    }
}

impl BufferTable {
    /// Creates an empty table that starts evicting idle buffers above `resident_limit` bytes.
    pub fn new(resident_limit: usize) -> Self {
        Self {
            bufs: Vec::new(),
            resident: 0,
            limit: resident_limit,
            watermark: 0,
            active: None,
        }
    }

    /// Number of resident buffers.
    pub fn len(&self) -> usize {
        self.bufs.len()
    }

    /// Whether no buffer is resident.
    pub fn is_empty(&self) -> bool {
        self.bufs.is_empty()
    }

    /// Total bytes held by resident buffers.
    pub fn resident_bytes(&self) -> usize {
        self.resident
    }

    /// Bytes appended to the sink but not yet written to the file.
    pub fn unflushed_bytes(&self) -> usize {
        self.bufs.iter().map(Buffer::unflushed).sum()
    }

    /// Offset below which the reader has promised not to fetch again.
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// Resident buffers in ascending offset order.
    pub fn iter(&self) -> impl Iterator<Item = &Buffer> + '_ {
        self.bufs.iter()
    }

    /// The buffer currently receiving sink output, if any.
    pub fn active_write(&self) -> Option<&Buffer> {
        self.active.and_then(|offset| self.find(offset))
    }

    /// The resident buffer whose range contains `offset`.
    pub fn find(&self, offset: u64) -> Option<&Buffer> {
        self.position(offset).map(|idx| &self.bufs[idx])
    }

    /// The buffer covering `offset`, inserting an empty one at its sorted position if none is
    /// resident.
    pub fn allocate(&mut self, offset: u64) -> &Buffer {
        let idx = self.allocate_index(offset);
        &self.bufs[idx]
    }

    /// Takes a reference on the buffer covering `offset`.
    ///
    /// Returns `false` if nothing covering `offset` is resident.
    pub fn acquire(&mut self, offset: u64) -> bool {
        match self.position(offset) {
            Some(idx) => {
                self.bufs[idx].inc_ref();
                true
            }
            None => false,
        }
    }

    /// Drops a reference on the buffer covering `offset` and evicts it if that was the last one
    /// and the buffer is no longer wanted.
    pub fn release(&mut self, offset: u64) {
        let Some(idx) = self.position(offset) else {
            debug_assert!(false, "released offset {offset} which is not resident");
            return;
        };
        let buf = &mut self.bufs[idx];
        buf.dec_ref();
        if buf.refcount() == 0 {
            if buf.end() <= self.watermark && self.is_evictable(idx) {
                self.remove(idx);
            }
            self.enforce_limit();
        }
    }

    /// Removes the buffer covering `offset` and frees its bytes.
    ///
    /// The buffer must be unreferenced and hold no unflushed output; anything else is a bug in
    /// the caller and the buffer is left in place.
    pub fn evict(&mut self, offset: u64) -> bool {
        let Some(idx) = self.position(offset) else {
            return false;
        };
        if !self.is_evictable(idx) {
            debug_assert!(false, "evicted a buffer that is still in use: {:?}", self.bufs[idx]);
            return false;
        }
        self.remove(idx);
        true
    }

    /// Raises the discard watermark to `offset` and evicts idle buffers that lie wholly below it.
    pub fn discard(&mut self, offset: u64) {
        if offset <= self.watermark {
            return;
        }
        self.watermark = offset;
        let mut idx = 0;
        while idx < self.bufs.len() && self.bufs[idx].offset() < offset {
            if self.bufs[idx].end() <= offset && self.is_evictable(idx) {
                self.remove(idx);
            } else {
                idx += 1;
            }
        }
    }

    /// Drops every buffer, returning how many unflushed bytes were thrown away.
    pub fn clear(&mut self) -> usize {
        let discarded = self.unflushed_bytes();
        self.bufs.clear();
        self.resident = 0;
        self.watermark = 0;
        self.active = None;
        discarded
    }

    fn position(&self, offset: u64) -> Option<usize> {
        let idx = self.bufs.partition_point(|buf| buf.offset() <= offset);
        let idx = idx.checked_sub(1)?;
        self.bufs[idx].contains(offset).then_some(idx)
    }

    fn is_evictable(&self, idx: usize) -> bool {
        let buf = &self.bufs[idx];
        buf.refcount() == 0 && buf.unflushed() == 0 && self.active != Some(buf.offset())
    }

    fn remove(&mut self, idx: usize) -> Buffer {
        let buf = self.bufs.remove(idx);
        self.resident -= buf.len();
        if self.active == Some(buf.offset()) {
            self.active = None;
        }
        tracing::debug!(offset = buf.offset(), len = buf.len(), "evicted buffer");
        buf
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&Buffer> {
        self.bufs.get(idx)
    }

    pub(crate) fn allocate_index(&mut self, offset: u64) -> usize {
        if let Some(idx) = self.position(offset) {
            return idx;
        }
        let idx = self.bufs.partition_point(|buf| buf.offset() <= offset);
        self.bufs.insert(idx, Buffer::filled(offset, Bytes::new()));
        idx
    }

    /// Evicts unreferenced buffers, lowest offsets first, until the table fits its limit.
    pub(crate) fn enforce_limit(&mut self) {
        let mut idx = 0;
        while self.resident > self.limit && idx < self.bufs.len() {
            if self.is_evictable(idx) {
                self.remove(idx);
            } else {
                idx += 1;
            }
        }
    }

    pub(crate) fn extend_filled(&mut self, idx: usize, chunk: Bytes) {
        let added = chunk.len();
        if let Payload::Filled(bytes) = &mut self.bufs[idx].payload {
            if bytes.is_empty() {
                *bytes = chunk;
            } else {
                let mut joined = BytesMut::with_capacity(bytes.len() + chunk.len());
                joined.extend_from_slice(bytes);
                joined.extend_from_slice(&chunk);
                *bytes = joined.freeze();
            }
            self.resident += added;
        }
    }

    /// Folds the filled buffer after `idx` into it. Both must be filled and adjacent.
    pub(crate) fn merge_next(&mut self, idx: usize) {
        debug_assert_eq!(self.bufs[idx].end(), self.bufs[idx + 1].offset());
        let next = self.bufs.remove(idx + 1);
        let refs = next.refcount();
        if let Payload::Filled(bytes) = next.payload {
            self.resident -= bytes.len();
            self.extend_filled(idx, bytes);
        }
        self.bufs[idx].add_refs(refs);
    }

    /// Makes room for sink output over `start..end` by evicting idle file contents there.
    ///
    /// Fails with the offset of the first buffer in the range that a live view still pins.
    pub(crate) fn clear_for_write(&mut self, start: u64, end: u64) -> Result<(), u64> {
        let overlaps = |buf: &Buffer| !buf.is_pending() && buf.offset() < end && buf.end() > start;
        if let Some(pinned) = self
            .bufs
            .iter()
            .find(|buf| overlaps(buf) && buf.refcount() > 0)
        {
            return Err(pinned.offset());
        }
        let mut idx = 0;
        while idx < self.bufs.len() {
            if overlaps(&self.bufs[idx]) {
                self.remove(idx);
            } else {
                idx += 1;
            }
        }
        Ok(())
    }

    /// The pending buffer that should receive output at `at`, allocating one if the active
    /// buffer is full or does not end at `at`.
    pub(crate) fn write_target(&mut self, at: u64, capacity: usize) -> usize {
        if let Some(idx) = self.active.and_then(|offset| self.position(offset)) {
            let buf = &self.bufs[idx];
            if buf.is_pending() && buf.end() == at && buf.len() < capacity {
                return idx;
            }
        }
        let idx = self.bufs.partition_point(|buf| buf.offset() <= at);
        self.bufs.insert(idx, Buffer::pending(at, capacity));
        self.active = Some(at);
        idx
    }

    /// Copies as much of `bytes` as fits into the pending buffer at `idx`.
    pub(crate) fn push_pending(&mut self, idx: usize, bytes: &[u8], capacity: usize) -> usize {
        let Payload::Pending(buf) = &mut self.bufs[idx].payload else {
            return 0;
        };
        let vec = buf.get_mut();
        let len = capacity.saturating_sub(vec.len()).min(bytes.len());
        vec.extend_from_slice(&bytes[..len]);
        self.resident += len;
        len
    }

    pub(crate) fn first_unflushed(&self) -> Option<usize> {
        self.bufs.iter().position(|buf| buf.unflushed() > 0)
    }

    pub(crate) fn pending_mut(&mut self, idx: usize) -> Option<(u64, &mut PartialBuffer<Vec<u8>>)> {
        let buf = self.bufs.get_mut(idx)?;
        let offset = buf.offset();
        match &mut buf.payload {
            Payload::Pending(partial) => Some((offset, partial)),
            Payload::Filled(_) => None,
        }
    }

    /// Drops a pending buffer whose contents have all reached the file.
    pub(crate) fn retire(&mut self, idx: usize) {
        debug_assert_eq!(self.bufs[idx].unflushed(), 0);
        self.remove(idx);
    }
}
