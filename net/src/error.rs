//! Error types for stream construction and configuration.
//!
//! Ring operations themselves never fail: capacity shortfalls come back as
//! short counts and contract violations panic.  Only building a stream (or
//! the configuration that sizes it) can be rejected at runtime.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// Storage shorter than one usable byte plus the sacrificed slot.
    LengthTooSmall { length: usize },
    /// Requested capacity cannot be represented as a storage length.
    CapacityOverflow { requested: usize },
    /// A configuration value is out of range.
    InvalidConfig { key: &'static str },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthTooSmall { length } => {
                write!(f, "stream length {} too small (minimum 2)", length)
            }
            Self::CapacityOverflow { requested } => {
                write!(f, "stream capacity {} overflows storage length", requested)
            }
            Self::InvalidConfig { key } => write!(f, "invalid stream config value for {}", key),
        }
    }
}

/// Convenience result type for stream construction.
pub type StreamResult<T = ()> = Result<T, StreamError>;
