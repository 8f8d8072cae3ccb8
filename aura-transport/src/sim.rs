//! In-memory model of the controller firmware
//!
//! Reproduces the behaviour that matters for session sequencing:
//!
//! - Runtime LED counts are volatile; a fresh open starts from the stored table.
//! - COMMIT only persists if SET_TOPOLOGY was received since the device was
//!   opened. Otherwise the firmware accepts the bytes and does nothing.
//! - READ_CONFIG answers from the stored (committed) table.
//!
//! Cloning a [`SimulatedDevice`] shares the same firmware state, so a test can
//! hand one clone to the code under test and inspect another.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::discovery::DeviceDiscovery;
use crate::error::TransportError;
use crate::protocol::{channel, cmd, config_offsets, device, Packet, PREFIX, REPORT_SIZE};
use crate::types::{DiscoveredDevice, TransportDeviceInfo};
use crate::{BoxedTransport, Transport};

/// Failure injected into the next open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOpenFailure {
    NotFound,
    PermissionDenied,
}

#[derive(Debug)]
struct SimState {
    runtime: [u8; channel::COUNT],
    committed: [u8; channel::COUNT],
    topology_applied: bool,
    open: bool,
    opens: usize,
    commits: usize,
    written: Vec<Packet>,
    pending: Option<Vec<u8>>,
    open_failure: Option<SimOpenFailure>,
    drop_reads: bool,
    short_writes: bool,
}

/// Shared handle to a simulated controller
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    state: Arc<Mutex<SimState>>,
    info: TransportDeviceInfo,
}

/// Build a READ_CONFIG response carrying `counts` at the protocol offsets
pub fn config_response(counts: [u8; channel::COUNT]) -> Vec<u8> {
    let mut buf = vec![0u8; REPORT_SIZE];
    buf[0] = PREFIX;
    buf[1] = cmd::CONFIG_RESPONSE;
    for (off, count) in config_offsets::LED_COUNT.iter().zip(counts) {
        buf[*off] = count;
    }
    buf
}

impl SimulatedDevice {
    /// Controller whose stored table holds `counts`
    pub fn new(counts: [u8; channel::COUNT]) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                runtime: counts,
                committed: counts,
                topology_applied: false,
                open: false,
                opens: 0,
                commits: 0,
                written: Vec::new(),
                pending: None,
                open_failure: None,
                drop_reads: false,
                short_writes: false,
            })),
            info: TransportDeviceInfo {
                vid: device::VENDOR_ID,
                pid: device::AURA_PIDS[0],
                device_path: "sim://aura0".into(),
                product_name: Some("Simulated AURA LED Controller".into()),
                serial: None,
            },
        }
    }

    /// Controller in the state left by an accidental whole-device reset
    pub fn bricked() -> Self {
        Self::new([5, 5, 5])
    }

    /// Stored (committed) LED counts
    pub fn committed_counts(&self) -> [u8; channel::COUNT] {
        self.state.lock().committed
    }

    /// Volatile LED counts of the current session
    pub fn runtime_counts(&self) -> [u8; channel::COUNT] {
        self.state.lock().runtime
    }

    /// Every packet written so far, oldest first
    pub fn written(&self) -> Vec<Packet> {
        self.state.lock().written.clone()
    }

    /// Forget recorded packets
    pub fn clear_written(&self) {
        self.state.lock().written.clear();
    }

    /// Number of commits that actually reached EEPROM
    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }

    /// Number of successful opens
    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    /// Whether a transport handle is currently held
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Make the next open fail
    pub fn fail_next_open(&self, failure: SimOpenFailure) {
        self.state.lock().open_failure = Some(failure);
    }

    /// Stop answering reads (every read times out)
    pub fn set_drop_reads(&self, drop: bool) {
        self.state.lock().drop_reads = drop;
    }

    /// Accept only half of every packet
    pub fn set_short_writes(&self, short: bool) {
        self.state.lock().short_writes = short;
    }
}

impl DeviceDiscovery for SimulatedDevice {
    fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        Ok(vec![DiscoveredDevice {
            info: self.info.clone(),
        }])
    }

    fn open_device(&self, _device: &DiscoveredDevice) -> Result<BoxedTransport, TransportError> {
        let mut state = self.state.lock();
        match state.open_failure.take() {
            Some(SimOpenFailure::NotFound) => {
                return Err(TransportError::DeviceNotFound(self.info.device_path.clone()))
            }
            Some(SimOpenFailure::PermissionDenied) => {
                return Err(TransportError::PermissionDenied(
                    self.info.device_path.clone(),
                ))
            }
            None => {}
        }

        // Power-on state: runtime mirrors the stored table, topology unset
        state.runtime = state.committed;
        state.topology_applied = false;
        state.pending = None;
        state.open = true;
        state.opens += 1;

        Ok(Box::new(SimTransport {
            state: Arc::clone(&self.state),
            info: self.info.clone(),
            closed: false,
        }))
    }
}

/// Transport end of a [`SimulatedDevice`]
struct SimTransport {
    state: Arc<Mutex<SimState>>,
    info: TransportDeviceInfo,
    closed: bool,
}

impl SimState {
    fn handle(&mut self, packet: &Packet) {
        match &packet[1..] {
            [0xB0, ..] => {
                self.pending = Some(config_response(self.committed));
            }
            [0x52, 0x53, ch, count, ..] => {
                if let Some(slot) = self.runtime.get_mut(*ch as usize) {
                    *slot = *count;
                    self.topology_applied = true;
                }
            }
            [0x3F, 0x55, ..] => {
                if self.topology_applied {
                    self.committed = self.runtime;
                    self.commits += 1;
                } else {
                    debug!("sim: commit before topology ignored");
                }
            }
            _ => {}
        }
    }
}

impl Transport for SimTransport {
    fn write(&mut self, packet: &Packet) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        let mut state = self.state.lock();
        if state.short_writes {
            return Ok(packet.len() / 2);
        }
        state.written.push(*packet);
        state.handle(packet);
        Ok(packet.len())
    }

    fn read_timeout(&mut self, _timeout_ms: i32) -> Result<Option<Vec<u8>>, TransportError> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        let mut state = self.state.lock();
        if state.drop_reads {
            state.pending = None;
            return Ok(None);
        }
        Ok(state.pending.take())
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.state.lock().open = false;
        }
        Ok(())
    }
}

impl Drop for SimTransport {
    fn drop(&mut self) {
        if !self.closed {
            self.state.lock().open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{decode_config, encode_commit, encode_read_config, encode_set_topology};

    #[test]
    fn test_commit_requires_topology() {
        let sim = SimulatedDevice::bricked();
        let mut t = sim.open_preferred().unwrap();

        t.send(&encode_commit()).unwrap();
        assert_eq!(sim.committed_counts(), [5, 5, 5]);
        assert_eq!(sim.commits(), 0);

        t.send(&encode_set_topology(2, 16)).unwrap();
        t.send(&encode_commit()).unwrap();
        assert_eq!(sim.committed_counts(), [5, 5, 16]);
        assert_eq!(sim.commits(), 1);
    }

    #[test]
    fn test_read_config_answers_stored_table() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        let mut t = sim.open_preferred().unwrap();
        let resp = t.query(&encode_read_config(), 100).unwrap();
        let snap = decode_config(resp.as_deref()).unwrap();
        assert_eq!(snap.led_counts, [15, 15, 16]);
        // Response is consumed
        assert_eq!(t.read_timeout(100).unwrap(), None);
    }

    #[test]
    fn test_close_releases_handle() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        let mut t = sim.open_preferred().unwrap();
        assert!(sim.is_open());
        t.close().unwrap();
        t.close().unwrap();
        assert!(!sim.is_open());
        assert!(matches!(
            t.send(&encode_commit()),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn test_injected_open_failure() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        sim.fail_next_open(SimOpenFailure::PermissionDenied);
        assert!(matches!(
            sim.open_preferred(),
            Err(TransportError::PermissionDenied(_))
        ));
        assert!(sim.open_preferred().is_ok());
    }

    #[test]
    fn test_short_write_detected() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        sim.set_short_writes(true);
        let mut t = sim.open_preferred().unwrap();
        assert!(matches!(
            t.send(&encode_commit()),
            Err(TransportError::ShortWrite {
                expected: 65,
                written: 32
            })
        ));
    }
}
