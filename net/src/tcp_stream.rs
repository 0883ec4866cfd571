//! TCP socket queues built on [`StreamBuffer`].
//!
//! These adapters sit at the boundary between the protocol engine and the
//! socket layer.  They translate sequence numbers into stream offsets and
//! keep the per-direction bookkeeping; the state machine itself (handshake,
//! retransmit timers, congestion control) lives elsewhere.
//!
//! # Receive side
//!
//! [`RxStream`] keeps `rcv_nxt`, the next in-order sequence number.  A
//! segment at `rcv_nxt` is appended; a segment further ahead is staged at
//! its offset past `head` and its range is remembered.  When in-order data
//! reaches a staged range, the range is promoted into the stream without a
//! second copy and `rcv_nxt` jumps past it.
//!
//! # Send side
//!
//! [`TxStream`] maps the cursors onto the send sequence space:
//!
//! - `tail` = `snd_una` (oldest unacknowledged byte)
//! - `mid`  = `snd_nxt` (next byte to hand to the transmitter)
//! - `head` = end of data written by the application

use alloc::vec::Vec;

use bitflags::bitflags;
use ringnet_lib::{klog_debug, klog_trace};

use crate::config::StreamConfig;
use crate::error::StreamResult;
use crate::seq::{seq_diff, seq_gt, seq_le};
use crate::stream_buffer::StreamBuffer;

bitflags! {
    /// Flags accepted by [`RxStream::recv`].
    ///
    /// Bit values match the socket ABI's `MSG_*` constants.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RecvFlags: u32 {
        /// Copy data out but leave it queued.
        const PEEK  = 0x02;
        /// Drop the requested bytes without copying them.
        const TRUNC = 0x20;
    }
}

impl Default for RecvFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Receive stream
// =============================================================================

/// Out-of-order byte range, as offsets past the current `head`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagedRange {
    pub start: usize,
    pub end: usize,
}

impl StagedRange {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Overlapping or directly adjacent ranges can be merged.
    #[inline]
    fn touches(&self, other: &StagedRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

pub struct RxStream {
    buffer: StreamBuffer,
    rcv_nxt: u32,
    /// Sorted, disjoint, non-adjacent.
    staged: Vec<StagedRange>,
    max_staged: usize,
}

impl RxStream {
    pub fn new(buffer: StreamBuffer, rcv_nxt: u32, max_staged: usize) -> Self {
        Self {
            buffer,
            rcv_nxt,
            staged: Vec::with_capacity(max_staged),
            max_staged,
        }
    }

    pub fn from_config(config: &StreamConfig, rcv_nxt: u32) -> StreamResult<Self> {
        config.validate()?;
        let buffer = StreamBuffer::for_capacity(config.rx_size)?;
        Ok(Self::new(buffer, rcv_nxt, config.max_ooo_segments))
    }

    /// Drop all queued and staged data and restart at `rcv_nxt`.
    pub fn reset(&mut self, rcv_nxt: u32) {
        self.buffer.clear();
        self.staged.clear();
        self.rcv_nxt = rcv_nxt;
    }

    #[inline]
    pub fn rcv_nxt(&self) -> u32 {
        self.rcv_nxt
    }

    /// In-order bytes ready for the application.
    #[inline]
    pub fn available(&self) -> usize {
        self.buffer.readable_size()
    }

    /// Receive window to advertise, clamped to the unscaled header field.
    #[inline]
    pub fn window(&self) -> u16 {
        self.buffer.writable_space().min(u16::MAX as usize) as u16
    }

    #[inline]
    pub fn has_gaps(&self) -> bool {
        !self.staged.is_empty()
    }

    #[inline]
    pub fn staged_ranges(&self) -> &[StagedRange] {
        &self.staged
    }

    #[inline]
    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    /// Store segment payload `data` that starts at sequence number `seq`.
    ///
    /// Returns how many bytes of `data` were written into the stream.  Bytes
    /// already received are trimmed and not counted; segments that start
    /// outside the window, or that would need a new range while the range
    /// table is full, are dropped and return 0.
    pub fn store(&mut self, seq: u32, data: &[u8]) -> usize {
        let diff = seq_diff(seq, self.rcv_nxt);
        let (offset, data) = if diff < 0 {
            let duplicate = diff.unsigned_abs() as usize;
            if duplicate >= data.len() {
                klog_trace!("rx: duplicate segment seq={} len={}", seq, data.len());
                return 0;
            }
            (0, &data[duplicate..])
        } else {
            (diff as usize, data)
        };

        if data.is_empty() {
            return 0;
        }

        let space = self.buffer.writable_space();
        if offset >= space {
            klog_debug!(
                "rx: segment seq={} outside window (offset={} space={})",
                seq,
                offset,
                space
            );
            return 0;
        }

        if offset == 0 {
            let written = self.buffer.add(0, data);
            self.advance(written);
            return written;
        }

        let expected = data.len().min(space - offset);
        let range = StagedRange {
            start: offset,
            end: offset + expected,
        };
        if self.staged.len() >= self.max_staged && !self.staged.iter().any(|r| r.touches(&range)) {
            klog_debug!(
                "rx: dropping out-of-order segment seq={}, {} ranges staged",
                seq,
                self.staged.len()
            );
            return 0;
        }

        let written = self.buffer.add(offset, data);
        debug_assert_eq!(written, expected);
        self.insert_range(range);
        written
    }

    fn insert_range(&mut self, mut range: StagedRange) {
        let mut idx = 0;
        while idx < self.staged.len() {
            let existing = self.staged[idx];
            if existing.touches(&range) {
                range.start = range.start.min(existing.start);
                range.end = range.end.max(existing.end);
                self.staged.remove(idx);
            } else if existing.start > range.end {
                break;
            } else {
                idx += 1;
            }
        }
        self.staged.insert(idx, range);
    }

    /// `head` moved by `written` in-order bytes; fold in any staged range
    /// that is now contiguous and advance `rcv_nxt`.
    fn advance(&mut self, written: usize) {
        let mut total = written;
        self.shift_ranges(written);

        if let Some(first) = self.staged.first().copied() {
            if first.start == 0 {
                let promoted = self.buffer.promote(first.end);
                debug_assert_eq!(promoted, first.end);
                self.staged.remove(0);
                self.shift_ranges(promoted);
                total += promoted;
                klog_trace!("rx: promoted {} staged bytes", promoted);
            }
        }

        self.rcv_nxt = self.rcv_nxt.wrapping_add(total as u32);
    }

    fn shift_ranges(&mut self, by: usize) {
        if by == 0 {
            return;
        }
        self.staged.retain_mut(|range| {
            range.start = range.start.saturating_sub(by);
            range.end = range.end.saturating_sub(by);
            !range.is_empty()
        });
    }

    /// Copy received data into `buf`, honouring `flags`.
    ///
    /// With [`RecvFlags::TRUNC`] up to `buf.len()` bytes are dropped and
    /// `buf` is left untouched.
    pub fn recv(&mut self, buf: &mut [u8], flags: RecvFlags) -> usize {
        if flags.contains(RecvFlags::TRUNC) {
            if flags.contains(RecvFlags::PEEK) {
                return buf.len().min(self.buffer.readable_size());
            }
            return self.buffer.discard(buf.len());
        }
        self.buffer.get(0, buf, flags.contains(RecvFlags::PEEK))
    }

    /// Contiguous run of received bytes for zero-copy delivery.
    #[inline]
    pub fn peek_run(&self) -> &[u8] {
        self.buffer.get_ptr()
    }

    /// Release `count` bytes previously inspected through [`peek_run`](Self::peek_run).
    #[inline]
    pub fn consume(&mut self, count: usize) -> usize {
        self.buffer.discard(count)
    }
}

impl core::fmt::Debug for RxStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RxStream")
            .field("rcv_nxt", &self.rcv_nxt)
            .field("available", &self.available())
            .field("window", &self.window())
            .field("staged", &self.staged)
            .finish()
    }
}

// =============================================================================
// Send stream
// =============================================================================

pub struct TxStream {
    buffer: StreamBuffer,
    snd_una: u32,
}

impl TxStream {
    pub fn new(buffer: StreamBuffer, snd_una: u32) -> Self {
        Self { buffer, snd_una }
    }

    pub fn from_config(config: &StreamConfig, snd_una: u32) -> StreamResult<Self> {
        config.validate()?;
        let buffer = StreamBuffer::for_capacity(config.tx_size)?;
        Ok(Self::new(buffer, snd_una))
    }

    /// Drop all queued data and restart at `snd_una`.
    pub fn reset(&mut self, snd_una: u32) {
        self.buffer.clear();
        self.snd_una = snd_una;
    }

    #[inline]
    pub fn snd_una(&self) -> u32 {
        self.snd_una
    }

    #[inline]
    pub fn snd_nxt(&self) -> u32 {
        self.snd_una.wrapping_add(self.in_flight() as u32)
    }

    /// Room for more application data.
    #[inline]
    pub fn space(&self) -> usize {
        self.buffer.writable_space()
    }

    /// Written but not yet handed to the transmitter.
    #[inline]
    pub fn unsent(&self) -> usize {
        self.buffer.pending_size()
    }

    /// Transmitted but not yet acknowledged.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.buffer.unreleased_size()
    }

    #[inline]
    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    /// Queue application data; a short count means the stream is full.
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.buffer.add(0, data)
    }

    /// Copy the next unsent bytes into `buf` and mark them as in flight.
    pub fn next_segment(&mut self, buf: &mut [u8]) -> usize {
        let offset = self.in_flight();
        let count = self.buffer.get(offset, buf, true);
        self.buffer.move_mid(count)
    }

    /// Re-read in-flight bytes starting `offset` past `snd_una`, for
    /// retransmission.  Never reads unsent data.
    pub fn peek_in_flight(&self, offset: usize, buf: &mut [u8]) -> usize {
        let limit = self.in_flight().saturating_sub(offset).min(buf.len());
        self.buffer.peek_at(offset, &mut buf[..limit])
    }

    /// Process an acknowledgment; returns the number of bytes released.
    ///
    /// Old or duplicate acks, and acks for data never sent, release nothing.
    pub fn ack(&mut self, ack_num: u32) -> usize {
        if seq_le(ack_num, self.snd_una) {
            return 0;
        }
        if seq_gt(ack_num, self.snd_nxt()) {
            klog_debug!(
                "tx: ack {} beyond snd_nxt {}, ignored",
                ack_num,
                self.snd_nxt()
            );
            return 0;
        }
        let acked = seq_diff(ack_num, self.snd_una) as usize;
        let released = self.buffer.discard(acked);
        self.snd_una = self.snd_una.wrapping_add(released as u32);
        released
    }

    /// Mark every in-flight byte unsent again (retransmission timeout).
    pub fn rewind(&mut self) -> usize {
        let rewound = self.buffer.rewind_mid();
        if rewound > 0 {
            klog_debug!("tx: rewound {} in-flight bytes at snd_una={}", rewound, self.snd_una);
        }
        rewound
    }

    /// Contiguous run of the oldest unacknowledged bytes, for zero-copy
    /// transmit paths.
    #[inline]
    pub fn tx_run(&self) -> &[u8] {
        self.buffer.get_ptr()
    }
}

impl core::fmt::Debug for TxStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TxStream")
            .field("snd_una", &self.snd_una)
            .field("in_flight", &self.in_flight())
            .field("unsent", &self.unsent())
            .field("space", &self.space())
            .finish()
    }
}
