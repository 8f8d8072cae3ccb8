//! Raw HID transport for the controller's vendor interface

use hidapi::HidDevice;
use tracing::debug;

use crate::error::TransportError;
use crate::protocol::{cmd, hex_prefix, Packet, REPORT_SIZE};
use crate::types::TransportDeviceInfo;
use crate::Transport;

/// HID transport over a raw device node
///
/// Reports go out as interrupt OUT writes with the 0xEC report ID in byte 0.
pub struct HidRawTransport {
    /// `None` once closed
    device: Option<HidDevice>,
    /// Device information
    info: TransportDeviceInfo,
}

impl HidRawTransport {
    /// Wrap an opened HID device
    pub fn new(device: HidDevice, info: TransportDeviceInfo) -> Self {
        Self {
            device: Some(device),
            info,
        }
    }

    fn device(&self) -> Result<&HidDevice, TransportError> {
        self.device.as_ref().ok_or(TransportError::Disconnected)
    }
}

impl Transport for HidRawTransport {
    fn write(&mut self, packet: &Packet) -> Result<usize, TransportError> {
        debug!(
            "Writing {}: {}",
            cmd::name(&packet[1..]),
            hex_prefix(packet, 9)
        );
        Ok(self.device()?.write(packet)?)
    }

    fn read_timeout(&mut self, timeout_ms: i32) -> Result<Option<Vec<u8>>, TransportError> {
        let mut buf = [0u8; REPORT_SIZE];
        let n = self.device()?.read_timeout(&mut buf, timeout_ms)?;
        if n == 0 {
            debug!("Read timed out after {}ms", timeout_ms);
            return Ok(None);
        }
        debug!("Read {} bytes: {}", n, hex_prefix(&buf[..n], 9));
        Ok(Some(buf[..n].to_vec()))
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // HidDevice closes its handle on drop
        if self.device.take().is_some() {
            debug!("Closed {}", self.info.device_path);
        }
        Ok(())
    }
}
