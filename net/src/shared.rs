//! Lock-wrapped stream for owners whose producer and consumer run in
//! different contexts (e.g. a receive interrupt path filling a socket queue
//! that an application task drains).
//!
//! The lock only serialises access; it never waits for data.  A producer
//! that finds the stream full gets a short count back exactly as it would
//! from the bare [`StreamBuffer`].

use spin::{Mutex, MutexGuard};

use crate::stream_buffer::{StreamBuffer, StreamCursors};

pub struct SharedStream {
    inner: Mutex<StreamBuffer>,
}

impl SharedStream {
    pub const fn new(buffer: StreamBuffer) -> Self {
        Self {
            inner: Mutex::new(buffer),
        }
    }

    /// Acquire the stream for a sequence of operations.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, StreamBuffer> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the stream.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut StreamBuffer) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Like [`with`](Self::with), but returns `None` instead of spinning when
    /// another context holds the lock.
    #[inline]
    pub fn try_with<R>(&self, f: impl FnOnce(&mut StreamBuffer) -> R) -> Option<R> {
        self.inner.try_lock().map(|mut guard| f(&mut guard))
    }

    /// Consistent view of all four cursors.
    pub fn snapshot(&self) -> StreamCursors {
        self.inner.lock().cursors()
    }

    pub fn into_inner(self) -> StreamBuffer {
        self.inner.into_inner()
    }
}

impl core::fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.inner.try_lock() {
            Some(guard) => f.debug_tuple("SharedStream").field(&*guard).finish(),
            None => f.write_str("SharedStream(<locked>)"),
        }
    }
}
