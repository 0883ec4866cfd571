//! Stream sizing configuration.
//!
//! Compile-time defaults live here as constants; an embedding kernel can
//! override them from its command line with [`config_from_cmdline`].
//!
//! | Token          | Field              | Range                          |
//! |----------------|--------------------|--------------------------------|
//! | `net.rxbuf=N`  | `rx_size`          | 1 ..= [`MAX_STREAM_SIZE`]      |
//! | `net.txbuf=N`  | `tx_size`          | 1 ..= [`MAX_STREAM_SIZE`]      |
//! | `net.ooo=N`    | `max_ooo_segments` | 0 ..= [`MAX_OOO_SEGMENTS_LIMIT`] |

use ringnet_lib::klog_debug;

use crate::error::{StreamError, StreamResult};

/// Default maximum segment size assumed when sizing socket streams.
pub const TCP_MSS: usize = 1460;

/// Usable receive stream capacity (four full segments).
pub const DEFAULT_RX_STREAM_SIZE: usize = 4 * TCP_MSS;

/// Usable send stream capacity (four full segments).
pub const DEFAULT_TX_STREAM_SIZE: usize = 4 * TCP_MSS;

/// Out-of-order ranges tracked per receive stream by default.
pub const MAX_OOO_SEGMENTS: usize = 8;

/// Upper bound accepted for `max_ooo_segments`.
pub const MAX_OOO_SEGMENTS_LIMIT: usize = 64;

/// Upper bound accepted for either stream size (1 MiB).
pub const MAX_STREAM_SIZE: usize = 1 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Usable receive stream capacity in bytes.
    pub rx_size: usize,
    /// Usable send stream capacity in bytes.
    pub tx_size: usize,
    /// Out-of-order ranges a receive stream may hold; 0 drops every
    /// out-of-order segment.
    pub max_ooo_segments: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            rx_size: DEFAULT_RX_STREAM_SIZE,
            tx_size: DEFAULT_TX_STREAM_SIZE,
            max_ooo_segments: MAX_OOO_SEGMENTS,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> StreamResult {
        if self.rx_size == 0 || self.rx_size > MAX_STREAM_SIZE {
            return Err(StreamError::InvalidConfig { key: "net.rxbuf" });
        }
        if self.tx_size == 0 || self.tx_size > MAX_STREAM_SIZE {
            return Err(StreamError::InvalidConfig { key: "net.txbuf" });
        }
        if self.max_ooo_segments > MAX_OOO_SEGMENTS_LIMIT {
            return Err(StreamError::InvalidConfig { key: "net.ooo" });
        }
        Ok(())
    }
}

fn parse_size(value: &str) -> Option<usize> {
    if let Some(kib) = value.strip_suffix(['k', 'K']) {
        return kib.parse::<usize>().ok()?.checked_mul(1024);
    }
    value.parse::<usize>().ok()
}

/// Build a [`StreamConfig`] from a kernel-style command line.
///
/// Unknown tokens and unparsable values are ignored; the assembled config is
/// validated before it is returned.
pub fn config_from_cmdline(cmdline: Option<&str>) -> StreamResult<StreamConfig> {
    let mut cfg = StreamConfig::default();
    if let Some(cmdline) = cmdline {
        for token in cmdline.split_whitespace() {
            let (field, value) = if let Some(value) = token.strip_prefix("net.rxbuf=") {
                (&mut cfg.rx_size, value)
            } else if let Some(value) = token.strip_prefix("net.txbuf=") {
                (&mut cfg.tx_size, value)
            } else if let Some(value) = token.strip_prefix("net.ooo=") {
                (&mut cfg.max_ooo_segments, value)
            } else {
                continue;
            };
            match parse_size(value) {
                Some(parsed) => *field = parsed,
                None => klog_debug!("net: ignoring malformed cmdline token {}", token),
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = StreamConfig::default();
        assert_eq!(cfg.rx_size, 5840);
        assert_eq!(cfg.tx_size, 5840);
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(config_from_cmdline(None), Ok(cfg));
    }

    #[test]
    fn test_cmdline_overrides() {
        let cfg = config_from_cmdline(Some("console=ttyS0 net.rxbuf=16k net.txbuf=2920 net.ooo=4"));
        assert_eq!(
            cfg,
            Ok(StreamConfig {
                rx_size: 16 * 1024,
                tx_size: 2920,
                max_ooo_segments: 4,
            })
        );
    }

    #[test]
    fn test_cmdline_malformed_value_ignored() {
        let cfg = config_from_cmdline(Some("net.rxbuf=lots net.ooo=0"));
        assert_eq!(
            cfg,
            Ok(StreamConfig {
                max_ooo_segments: 0,
                ..StreamConfig::default()
            })
        );
    }

    #[test]
    fn test_cmdline_out_of_range_rejected() {
        assert_eq!(
            config_from_cmdline(Some("net.txbuf=0")),
            Err(StreamError::InvalidConfig { key: "net.txbuf" })
        );
        assert_eq!(
            config_from_cmdline(Some("net.rxbuf=4096k")),
            Err(StreamError::InvalidConfig { key: "net.rxbuf" })
        );
        assert_eq!(
            config_from_cmdline(Some("net.ooo=65")),
            Err(StreamError::InvalidConfig { key: "net.ooo" })
        );
    }
}
