//! MonitorTransport middleware for tracing transport traffic
//!
//! Wraps any Transport implementation and logs every packet written and every
//! report read through it.
//!
//! # Example
//!
//! ```ignore
//! use aura_transport::{HidDiscovery, Monitored, MonitorConfig, DeviceDiscovery};
//!
//! let discovery = Monitored::new(HidDiscovery::new(), MonitorConfig::default());
//! let transport = discovery.open_preferred()?;
//! // Now all packets will be logged
//! ```

use std::str::FromStr;

use tracing::info;

use crate::discovery::DeviceDiscovery;
use crate::protocol::{cmd, hex_prefix, Packet};
use crate::types::{DiscoveredDevice, TransportDeviceInfo};
use crate::{BoxedTransport, Transport, TransportError};

/// Packet filter for selective display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PacketFilter {
    #[default]
    All,
    /// Only packets written to the device
    Writes,
    /// Only reports read back
    Reads,
    /// Only packets whose first command byte matches
    Cmd(u8),
}

impl FromStr for PacketFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "writes" | "write" | "out" => Ok(Self::Writes),
            "reads" | "read" | "in" => Ok(Self::Reads),
            s if s.starts_with("cmd=") || s.starts_with("0x") => {
                let hex_str = s.strip_prefix("cmd=").unwrap_or(s);
                let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
                u8::from_str_radix(hex_str, 16)
                    .map(Self::Cmd)
                    .map_err(|e| format!("Invalid command byte: {}", e))
            }
            _ => Err(format!("Unknown filter: {}", s)),
        }
    }
}

/// Configuration for the MonitorTransport
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Dump the whole packet instead of the first bytes
    pub full_hex: bool,
    /// Filter for selective display
    pub filter: PacketFilter,
}

impl MonitorConfig {
    pub fn with_full_hex(mut self, full: bool) -> Self {
        self.full_hex = full;
        self
    }

    pub fn with_filter(mut self, filter: PacketFilter) -> Self {
        self.filter = filter;
        self
    }

    fn shows_write(&self, code: u8) -> bool {
        match self.filter {
            PacketFilter::All | PacketFilter::Writes => true,
            PacketFilter::Reads => false,
            PacketFilter::Cmd(c) => c == code,
        }
    }

    fn shows_read(&self, code: u8) -> bool {
        match self.filter {
            PacketFilter::All | PacketFilter::Reads => true,
            PacketFilter::Writes => false,
            PacketFilter::Cmd(c) => c == code,
        }
    }

    fn hex_len(&self) -> usize {
        if self.full_hex {
            usize::MAX
        } else {
            16
        }
    }
}

/// Transport middleware that logs all packets
pub struct MonitorTransport {
    inner: BoxedTransport,
    config: MonitorConfig,
}

impl MonitorTransport {
    /// Wrap a transport with logging middleware
    pub fn wrap(transport: BoxedTransport, config: MonitorConfig) -> BoxedTransport {
        Box::new(Self {
            inner: transport,
            config,
        })
    }
}

impl Transport for MonitorTransport {
    fn write(&mut self, packet: &Packet) -> Result<usize, TransportError> {
        if self.config.shows_write(packet[1]) {
            info!(
                ">>> {:<16} {}",
                cmd::name(&packet[1..]),
                hex_prefix(packet, self.config.hex_len())
            );
        }
        self.inner.write(packet)
    }

    fn read_timeout(&mut self, timeout_ms: i32) -> Result<Option<Vec<u8>>, TransportError> {
        let resp = self.inner.read_timeout(timeout_ms)?;
        match resp {
            Some(ref data) if data.len() > 1 && self.config.shows_read(data[1]) => {
                info!(
                    "<<< {:<16} {}",
                    cmd::name(&data[1..]),
                    hex_prefix(data, self.config.hex_len())
                );
            }
            None if self.config.filter != PacketFilter::Writes => {
                info!("<<< (timeout after {}ms)", timeout_ms);
            }
            _ => {}
        }
        Ok(resp)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        self.inner.device_info()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close()
    }
}

/// Discovery wrapper that monitors every transport it opens
pub struct Monitored<D> {
    inner: D,
    config: MonitorConfig,
}

impl<D: DeviceDiscovery> Monitored<D> {
    pub fn new(inner: D, config: MonitorConfig) -> Self {
        Self { inner, config }
    }
}

impl<D: DeviceDiscovery> DeviceDiscovery for Monitored<D> {
    fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        self.inner.list_devices()
    }

    fn open_device(&self, device: &DiscoveredDevice) -> Result<BoxedTransport, TransportError> {
        let transport = self.inner.open_device(device)?;
        Ok(MonitorTransport::wrap(transport, self.config.clone()))
    }

    fn open_preferred(&self) -> Result<BoxedTransport, TransportError> {
        let transport = self.inner.open_preferred()?;
        Ok(MonitorTransport::wrap(transport, self.config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_filter_parse() {
        assert_eq!(PacketFilter::from_str("all").unwrap(), PacketFilter::All);
        assert_eq!(
            PacketFilter::from_str("writes").unwrap(),
            PacketFilter::Writes
        );
        assert_eq!(PacketFilter::from_str("in").unwrap(), PacketFilter::Reads);
        assert_eq!(
            PacketFilter::from_str("cmd=0x3f").unwrap(),
            PacketFilter::Cmd(0x3f)
        );
        assert_eq!(
            PacketFilter::from_str("0xB0").unwrap(),
            PacketFilter::Cmd(0xb0)
        );
        assert!(PacketFilter::from_str("bogus").is_err());
    }

    #[test]
    fn test_filter_selection() {
        let cfg = MonitorConfig::default().with_filter(PacketFilter::Cmd(0x52));
        assert!(cfg.shows_write(0x52));
        assert!(!cfg.shows_write(0x3F));

        let cfg = MonitorConfig::default().with_filter(PacketFilter::Writes);
        assert!(cfg.shows_write(0x40));
        assert!(!cfg.shows_read(0x30));
    }
}
