//! Circular byte stream used for TCP socket send and receive queues.
//!
//! A [`StreamBuffer`] is a fixed-length byte ring with four cursors:
//!
//! ```text
//!   tail ──── mid ──── head ──── front ──── (free) ──── tail
//!    │  read, not │ confirmed, │ staged     │
//!    │  released  │ not read   │ (out of    │
//!    │            │            │  order)    │
//! ```
//!
//! - `tail`: oldest byte still present.
//! - `mid`: boundary between bytes already handed out (delivered to the
//!   application, or passed to the transmitter) and bytes not yet handed out.
//! - `head`: next confirmed append position.
//! - `front`: end of speculatively written bytes.  Data between `head` and
//!   `front` is present in storage but not part of the stream until promoted.
//!
//! Every cursor lives in `[0, length)` and moves forward modulo the length.
//! One slot is always left free so that `head == tail` means empty; the usable
//! capacity is therefore `length - 1`.
//!
//! # Contract
//!
//! Capacity shortfalls are never errors.  [`add`](StreamBuffer::add),
//! [`get`](StreamBuffer::get) and friends return how many bytes they actually
//! processed and callers turn a short count into their own backpressure.
//! Calls outside the contract panic: a consuming `get` at a non-zero offset,
//! or an `add` whose offset lies beyond the writable window.
//!
//! The buffer has no internal locking.  Owners that produce and consume from
//! different contexts wrap it in [`SharedStream`](crate::shared::SharedStream).

use alloc::boxed::Box;
use alloc::vec;
use core::fmt;

use ringnet_lib::{align_up_word, klog_debug, klog_trace};

use crate::error::{StreamError, StreamResult};

/// Smallest usable storage length: one data byte plus the sacrificed slot.
pub const MIN_STREAM_LENGTH: usize = 2;

/// Point-in-time copy of the four cursors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamCursors {
    pub tail: usize,
    pub mid: usize,
    pub head: usize,
    pub front: usize,
    pub length: usize,
}

pub struct StreamBuffer {
    storage: Box<[u8]>,
    tail: usize,
    mid: usize,
    head: usize,
    front: usize,
}

impl StreamBuffer {
    /// Allocate a zeroed stream of `length` bytes (capacity `length - 1`).
    pub fn new(length: usize) -> StreamResult<Self> {
        if length < MIN_STREAM_LENGTH {
            return Err(StreamError::LengthTooSmall { length });
        }
        if length > isize::MAX as usize {
            return Err(StreamError::CapacityOverflow { requested: length });
        }
        Self::from_storage(vec![0u8; length].into_boxed_slice())
    }

    /// Build a stream over storage the owner already allocated.
    pub fn from_storage(storage: Box<[u8]>) -> StreamResult<Self> {
        if storage.len() < MIN_STREAM_LENGTH {
            return Err(StreamError::LengthTooSmall {
                length: storage.len(),
            });
        }
        Ok(Self {
            storage,
            tail: 0,
            mid: 0,
            head: 0,
            front: 0,
        })
    }

    /// Allocate a stream able to hold at least `usable` bytes.
    ///
    /// The storage length is `usable + 1` rounded up to the machine word, so
    /// the resulting [`capacity`](Self::capacity) may exceed `usable`.
    pub fn for_capacity(usable: usize) -> StreamResult<Self> {
        let length = match usable.checked_add(1) {
            Some(length) if length <= (isize::MAX as usize) - ringnet_lib::WORD_SIZE => length,
            _ => return Err(StreamError::CapacityOverflow { requested: usable }),
        };
        Self::new(align_up_word(length.max(MIN_STREAM_LENGTH)))
    }

    // -------------------------------------------------------------------------
    // Modular primitives
    // -------------------------------------------------------------------------

    /// Physical storage length (`LENGTH`).
    #[inline]
    pub fn length(&self) -> usize {
        self.storage.len()
    }

    /// Usable capacity, `length() - 1`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.length() - 1
    }

    #[inline]
    fn wrap(&self, index: usize) -> usize {
        index % self.length()
    }

    /// Free slots between `lower` and `upper`.
    #[inline]
    pub fn space(&self, lower: usize, upper: usize) -> usize {
        let length = self.length();
        (length + upper - lower - 1) % length
    }

    /// Occupied slots between `lower` and `upper`.
    #[inline]
    pub fn distance(&self, lower: usize, upper: usize) -> usize {
        let length = self.length();
        (length + upper - lower) % length
    }

    // -------------------------------------------------------------------------
    // Cursor queries
    // -------------------------------------------------------------------------

    /// Room for confirmed appends at `head`.
    #[inline]
    pub fn writable_space(&self) -> usize {
        self.space(self.head, self.tail)
    }

    /// Room for speculative writes past `front`.
    #[inline]
    pub fn speculative_space(&self) -> usize {
        self.space(self.front, self.tail)
    }

    /// Bytes available to a consumer.
    #[inline]
    pub fn readable_size(&self) -> usize {
        self.distance(self.tail, self.head)
    }

    /// Confirmed bytes not yet passed by `mid`.
    #[inline]
    pub fn pending_size(&self) -> usize {
        self.distance(self.mid, self.head)
    }

    /// Bytes already passed by `mid` but still held at `tail`.
    #[inline]
    pub fn unreleased_size(&self) -> usize {
        self.distance(self.tail, self.mid)
    }

    /// Speculatively written bytes between `head` and `front`.
    #[inline]
    pub fn staged_size(&self) -> usize {
        self.distance(self.head, self.front)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.writable_space() == 0
    }

    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }

    #[inline]
    pub fn mid(&self) -> usize {
        self.mid
    }

    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    #[inline]
    pub fn front(&self) -> usize {
        self.front
    }

    pub fn cursors(&self) -> StreamCursors {
        StreamCursors {
            tail: self.tail,
            mid: self.mid,
            head: self.head,
            front: self.front,
            length: self.length(),
        }
    }

    /// `true` if `left` comes at or before `right` in stream order.
    ///
    /// Both indices are linearised with `tail` as position zero: an index
    /// numerically below `tail` has wrapped and sorts after every index at or
    /// above it.
    pub fn less_or_equal(&self, left: usize, right: usize) -> bool {
        let tail = self.tail;
        if (left < tail) != (right < tail) {
            right < tail
        } else {
            left <= right
        }
    }

    /// Check the cursor ordering `tail <= mid <= head <= front`.
    pub fn check_invariants(&self) -> bool {
        let length = self.length();
        self.tail < length
            && self.mid < length
            && self.head < length
            && self.front < length
            && self.less_or_equal(self.tail, self.mid)
            && self.less_or_equal(self.mid, self.head)
            && self.less_or_equal(self.head, self.front)
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Reset all cursors to zero.  Stored bytes are left in place.
    pub fn clear(&mut self) {
        klog_debug!(
            "stream: clear (len={} readable={} staged={})",
            self.length(),
            self.readable_size(),
            self.staged_size()
        );
        self.tail = 0;
        self.mid = 0;
        self.head = 0;
        self.front = 0;
    }

    /// Advance `mid` toward `head` by at most `count`; returns the distance moved.
    pub fn move_mid(&mut self, count: usize) -> usize {
        let moved = count.min(self.pending_size());
        self.mid = self.wrap(self.mid + moved);
        moved
    }

    /// Move `mid` back to `tail`, returning how many bytes became pending again.
    pub fn rewind_mid(&mut self) -> usize {
        let rewound = self.unreleased_size();
        self.mid = self.tail;
        rewound
    }

    /// Write `data` at `head + offset`.
    ///
    /// With `offset == 0` the bytes are appended and `head` advances.  With a
    /// positive offset the bytes are staged ahead of `head`, which stays put,
    /// and `front` grows to cover them.  The write is truncated to the free
    /// space behind `head + offset`; the return value is the number of bytes
    /// stored.
    ///
    /// # Panics
    ///
    /// If `offset` exceeds [`writable_space`](Self::writable_space).
    pub fn add(&mut self, offset: usize, data: &[u8]) -> usize {
        let len = data.len();
        self.write_at(offset, Some(data), len)
    }

    /// Append staged bytes to the stream without copying.
    ///
    /// Moves `head` over at most `count` bytes previously written with a
    /// positive offset; never past `front`.
    pub fn promote(&mut self, count: usize) -> usize {
        let count = count.min(self.staged_size());
        self.write_at(0, None, count)
    }

    fn write_at(&mut self, offset: usize, data: Option<&[u8]>, requested: usize) -> usize {
        let space = self.writable_space();
        assert!(
            offset <= space,
            "stream write offset {} beyond writable window {}",
            offset,
            space
        );

        let count = requested.min(space - offset);
        if count < requested {
            klog_trace!(
                "stream: short write {}/{} at offset {}",
                count,
                requested,
                offset
            );
        }
        if count == 0 {
            return 0;
        }

        let start = self.wrap(self.head + offset);
        if let Some(data) = data {
            let first = count.min(self.length() - start);
            self.storage[start..start + first].copy_from_slice(&data[..first]);
            self.storage[..count - first].copy_from_slice(&data[first..count]);
        }

        let end = self.wrap(start + count);
        if offset == 0 {
            self.head = end;
        }
        if self.less_or_equal(self.front, end) {
            self.front = end;
        }

        debug_assert!(self.check_invariants());
        count
    }

    /// Copy up to `buf.len()` bytes starting `offset` bytes past `tail`.
    ///
    /// With `peek == false` the bytes are consumed and `tail` advances; `mid`
    /// is carried along if `tail` passes it.  Returns 0 when nothing is
    /// readable.
    ///
    /// # Panics
    ///
    /// If `offset != 0` while `peek == false`.
    pub fn get(&mut self, offset: usize, buf: &mut [u8], peek: bool) -> usize {
        let len = buf.len();
        self.read_at(offset, Some(buf), len, peek)
    }

    /// Non-consuming read at `offset` past `tail`.
    pub fn peek_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.readable_size().saturating_sub(offset));
        if count > 0 {
            self.copy_out(self.wrap(self.tail + offset), &mut buf[..count]);
        }
        count
    }

    /// Consuming read from `tail`.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        self.get(0, buf, false)
    }

    /// Drop up to `count` bytes at `tail` without copying them.
    pub fn discard(&mut self, count: usize) -> usize {
        self.read_at(0, None, count, false)
    }

    fn read_at(
        &mut self,
        offset: usize,
        dest: Option<&mut [u8]>,
        requested: usize,
        peek: bool,
    ) -> usize {
        assert!(
            peek || offset == 0,
            "consuming stream read at non-zero offset {}",
            offset
        );

        let count = requested.min(self.readable_size().saturating_sub(offset));
        if count == 0 {
            return 0;
        }

        if let Some(dest) = dest {
            self.copy_out(self.wrap(self.tail + offset), &mut dest[..count]);
        }

        if !peek {
            if self.unreleased_size() < count {
                self.mid = self.wrap(self.tail + count);
            }
            self.tail = self.wrap(self.tail + count);
        }

        debug_assert!(self.check_invariants());
        count
    }

    fn copy_out(&self, start: usize, dest: &mut [u8]) {
        let count = dest.len();
        let first = count.min(self.length() - start);
        dest[..first].copy_from_slice(&self.storage[start..start + first]);
        dest[first..].copy_from_slice(&self.storage[..count - first]);
    }

    /// Contiguous readable run at `tail`, for zero-copy consumers.
    ///
    /// The slice ends at whichever comes first: the end of readable data or
    /// the physical end of storage.  Bytes past a wrap need a second call
    /// after the first run is consumed.
    pub fn get_ptr(&self) -> &[u8] {
        let run = self.readable_size().min(self.length() - self.tail);
        &self.storage[self.tail..self.tail + run]
    }
}

impl fmt::Debug for StreamBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBuffer")
            .field("length", &self.length())
            .field("tail", &self.tail)
            .field("mid", &self.mid)
            .field("head", &self.head)
            .field("front", &self.front)
            .finish()
    }
}
