#![no_std]

#[cfg(test)]
extern crate std;

pub mod alignment;
pub mod klog;
pub mod testing;

#[doc(hidden)]
pub use paste;

pub use alignment::{WORD_SIZE, align_down_usize, align_up_usize, align_up_word};
pub use klog::{
    KlogLevel, klog_get_level, klog_init, klog_is_enabled, klog_register_backend, klog_set_level,
};
