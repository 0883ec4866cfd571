//! Byte stream queues for the ringnet TCP/IP stack.
//!
//! [`StreamBuffer`] is the fixed-capacity ring behind every socket's send
//! and receive queue.  [`RxStream`] and [`TxStream`] adapt it to TCP
//! sequence space, and [`SharedStream`] adds a spin lock for owners that
//! touch one stream from more than one context.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod error;
pub mod seq;
pub mod shared;
pub mod stream_buffer;
pub mod tcp_stream;

#[cfg(feature = "itests")]
pub mod stream_buffer_tests;

pub use config::{StreamConfig, config_from_cmdline};
pub use error::{StreamError, StreamResult};
pub use shared::SharedStream;
pub use stream_buffer::{MIN_STREAM_LENGTH, StreamBuffer, StreamCursors};
pub use tcp_stream::{RecvFlags, RxStream, StagedRange, TxStream};
