//! Transport and packet codec for ASUS Aura addressable LED controllers
//!
//! This crate provides:
//!
//! - The packet codec for the controller's vendor command set (`command`)
//! - A byte-oriented duplex `Transport` contract and a hidapi-backed
//!   implementation for raw HID device nodes
//! - Device discovery by vendor/product ID
//! - A monitoring wrapper that logs every packet
//! - An in-memory firmware model (`sim` feature) for tests and dry runs

pub mod command;
pub mod error;
pub mod monitor;
pub mod protocol;
pub mod types;

mod discovery;
mod hid_raw;

#[cfg(feature = "sim")]
pub mod sim;

pub use command::{
    decode_config, encode_commit, encode_read_config, encode_set_direct_colors,
    encode_set_effect, encode_set_topology, Commit, ConfigSnapshot, EffectMode, HidCommand,
    HidResponse, ProtocolError, ReadConfig, Rgb, SetDirectColors, SetEffect, SetTopology,
};
pub use discovery::{DeviceDiscovery, HidDiscovery};
pub use error::TransportError;
pub use hid_raw::HidRawTransport;
pub use monitor::{MonitorConfig, MonitorTransport, Monitored, PacketFilter};
pub use protocol::{Packet, REPORT_SIZE};
pub use types::{DiscoveredDevice, TransportDeviceInfo};

/// The transport contract: a blocking, exclusively owned duplex channel
///
/// Implementations never retry; every call either completes or fails.
pub trait Transport: Send {
    /// Write one packet, returning the number of bytes accepted
    fn write(&mut self, packet: &Packet) -> Result<usize, TransportError>;

    /// Read one report, waiting at most `timeout_ms`
    ///
    /// # Returns
    /// `None` on timeout, `Some(bytes)` if a report arrived
    fn read_timeout(&mut self, timeout_ms: i32) -> Result<Option<Vec<u8>>, TransportError>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Release the device handle. Safe to call more than once.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Write a packet, treating a partial write as an error
    fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        let written = self.write(packet)?;
        if written != packet.len() {
            return Err(TransportError::ShortWrite {
                expected: packet.len(),
                written,
            });
        }
        Ok(())
    }

    /// Send a packet and wait for one response report
    fn query(
        &mut self,
        packet: &Packet,
        timeout_ms: i32,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        self.send(packet)?;
        self.read_timeout(timeout_ms)
    }
}

/// Type alias for a boxed transport
pub type BoxedTransport = Box<dyn Transport>;
