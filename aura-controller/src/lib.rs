//! Session controller for ASUS Aura addressable LED controllers
//!
//! Sequences commands against the firmware's two-tier configuration model
//! (volatile runtime table, persisted committed table) on top of any
//! [`DeviceDiscovery`] implementation, and provides brick detection and
//! recovery.

pub mod brick;
pub mod error;
pub mod state;
pub mod topology;

pub use brick::{classify_brick, recovery_verified, BrickVerdict};
pub use error::{ConnectionError, ControllerError, StateError};
pub use state::{transition, Effect, Operation, SessionState, Transition};
pub use topology::{Topology, TopologyError};

pub use aura_transport::{ConfigSnapshot, EffectMode, Rgb};

use aura_transport::protocol::{channel, cmd, timing, Packet};
use aura_transport::{
    decode_config, encode_commit, encode_read_config, encode_set_direct_colors,
    encode_set_effect, encode_set_topology, BoxedTransport, DeviceDiscovery, TransportDeviceInfo,
    TransportError,
};
use tracing::{debug, info, warn};

/// One controller session
///
/// Owns the device handle exclusively. Not meant to be shared between
/// threads; every call blocks until the transport returns.
pub struct AuraController<D: DeviceDiscovery> {
    discovery: D,
    transport: Option<BoxedTransport>,
    state: SessionState,
    topology: Topology,
    read_timeout_ms: i32,
}

impl<D: DeviceDiscovery> AuraController<D> {
    /// Create a disconnected session
    ///
    /// # Arguments
    /// * `discovery` - Where the device handle comes from
    /// * `topology` - LED counts applied on every connect
    pub fn new(discovery: D, topology: Topology) -> Self {
        Self {
            discovery,
            transport: None,
            state: SessionState::Disconnected,
            topology,
            read_timeout_ms: timing::READ_TIMEOUT_MS,
        }
    }

    /// Override how long config reads wait for a response
    pub fn with_read_timeout(mut self, timeout_ms: i32) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    /// Information about the open device, if connected
    pub fn device_info(&self) -> Option<&TransportDeviceInfo> {
        self.transport.as_ref().map(|t| t.device_info())
    }

    // === Session ===

    /// Open the device and apply the topology
    ///
    /// Leaves the session in `Runtime`. If the topology cannot be applied the
    /// device is released again before the error is returned.
    pub fn connect(&mut self) -> Result<(), ControllerError> {
        let next = self.advance(Operation::Connect)?;
        self.set_state(next);

        if let Err(e) = self.init_topology() {
            warn!("Topology init failed after connect, releasing device: {e}");
            self.disconnect();
            return Err(e);
        }
        Ok(())
    }

    /// Release the device. Idempotent.
    pub fn disconnect(&mut self) {
        // Disconnect is accepted from every state
        if let Ok(next) = self.advance(Operation::Disconnect) {
            self.set_state(next);
        }
    }

    /// Send the configured topology, one channel at a time in ascending order
    pub fn init_topology(&mut self) -> Result<(), ControllerError> {
        let next = self.advance(Operation::InitTopology)?;
        let topology = self.topology.clone();
        self.send_topology(&topology)?;
        self.set_state(next);
        Ok(())
    }

    // === Lighting ===

    /// Set a single LED
    pub fn set_led(&mut self, channel: u8, index: u8, color: Rgb) -> Result<(), ControllerError> {
        let next = self.advance(Operation::Lighting)?;
        let count = self.declared_count(channel)?;
        if index >= count {
            return Err(ControllerError::InvalidParameter(format!(
                "LED {index} out of range for channel {channel} ({count} LEDs)"
            )));
        }
        self.send(&encode_set_direct_colors(channel, index, &[color]))?;
        self.set_state(next);
        Ok(())
    }

    /// Fill every LED declared on a channel with one color
    ///
    /// Always a single direct-color packet. A packet carries at most 20
    /// colors, so on longer channels only the first 20 LEDs change; use
    /// [`set_leds`](Self::set_leds) to cover the whole strip.
    pub fn set_all_leds(&mut self, channel: u8, color: Rgb) -> Result<(), ControllerError> {
        let next = self.advance(Operation::Lighting)?;
        let count = self.declared_count(channel)? as usize;
        if count > channel::MAX_DIRECT_COLORS {
            warn!(
                "Channel {channel} has {count} LEDs; only the first {} are set by one packet",
                channel::MAX_DIRECT_COLORS
            );
        }
        self.send(&encode_set_direct_colors(channel, 0, &vec![color; count]))?;
        self.set_state(next);
        Ok(())
    }

    /// Write a run of colors starting at `offset`
    ///
    /// Split into as many direct-color packets as needed.
    pub fn set_leds(
        &mut self,
        channel: u8,
        offset: u8,
        colors: &[Rgb],
    ) -> Result<(), ControllerError> {
        let next = self.advance(Operation::Lighting)?;
        let count = self.declared_count(channel)? as usize;
        if offset as usize + colors.len() > count {
            return Err(ControllerError::InvalidParameter(format!(
                "{} colors at offset {offset} overrun channel {channel} ({count} LEDs)",
                colors.len()
            )));
        }

        for (i, chunk) in colors.chunks(channel::MAX_DIRECT_COLORS).enumerate() {
            // Bounded by the declared count (<= 120), so the offset fits a u8
            let start = offset as usize + i * channel::MAX_DIRECT_COLORS;
            self.send(&encode_set_direct_colors(channel, start as u8, chunk))?;
        }
        self.set_state(next);
        Ok(())
    }

    /// Select a built-in effect
    pub fn set_effect(
        &mut self,
        channel: u8,
        mode: EffectMode,
        color: Rgb,
        brightness: u8,
    ) -> Result<(), ControllerError> {
        let next = self.advance(Operation::Lighting)?;
        check_channel(channel)?;
        self.send(&encode_set_effect(channel, mode, color, brightness))?;
        self.set_state(next);
        Ok(())
    }

    // === Persistence ===

    /// Persist the runtime configuration
    pub fn commit(&mut self) -> Result<(), ControllerError> {
        let next = self.advance(Operation::Commit)?;
        self.send(&encode_commit())?;
        self.set_state(next);
        Ok(())
    }

    /// Read and decode the configuration table
    pub fn get_config(&mut self) -> Result<ConfigSnapshot, ControllerError> {
        let next = self.advance(Operation::ReadConfig)?;
        let timeout = self.read_timeout_ms;
        let packet = encode_read_config();
        debug!("Sending {}", cmd::name(&packet[1..]));
        let response = self.transport_mut()?.query(&packet, timeout)?;
        let snapshot = decode_config(response.as_deref())?;
        self.set_state(next);
        Ok(snapshot)
    }

    // === Recovery ===

    /// Classify a fresh configuration read
    ///
    /// A failed read is reported as [`BrickVerdict::Unreadable`].
    pub fn brick_verdict(&mut self) -> BrickVerdict {
        let verdict = match self.get_config() {
            Ok(snapshot) => classify_brick(&snapshot),
            Err(e) => BrickVerdict::Unreadable(e.to_string()),
        };
        if verdict.is_bricked() {
            warn!("Brick check: {verdict}");
        } else {
            debug!("Brick check: {verdict}");
        }
        verdict
    }

    /// Best-effort brick heuristic; `true` if the configuration can't be read
    pub fn is_bricked(&mut self) -> bool {
        self.brick_verdict().is_bricked()
    }

    /// Rewrite the topology and commit it, whatever the tracked state
    ///
    /// Opens the device if needed. `target` replaces the session topology when
    /// given. The session ends up `Committed` once the commit packet is out;
    /// the return value says whether the reference channel reads back with
    /// its expected LED count, and must be checked.
    pub fn unbrick(&mut self, target: Option<&Topology>) -> Result<bool, ControllerError> {
        let opened_here = !self.state.is_connected();
        let next = self.advance(Operation::Unbrick)?;
        if let Some(target) = target {
            self.topology = target.clone();
        }

        let topology = self.topology.clone();
        if let Err(e) = self.write_recovery(&topology) {
            if opened_here {
                warn!("Unbrick failed, releasing device: {e}");
                self.disconnect();
            }
            return Err(e);
        }
        self.set_state(next);

        let verified = match self.get_config() {
            Ok(snapshot) => {
                info!("Unbrick: read back {:?}", snapshot.led_counts);
                recovery_verified(&snapshot)
            }
            Err(e) => {
                warn!("Unbrick: verification read failed: {e}");
                false
            }
        };
        if verified {
            info!("Unbrick: recovery verified");
        } else {
            warn!(
                "Unbrick: channel {} still below {} LEDs",
                brick::REFERENCE_CHANNEL,
                brick::REFERENCE_MIN_LEDS
            );
        }
        Ok(verified)
    }

    // === Internals ===

    fn write_recovery(&mut self, topology: &Topology) -> Result<(), ControllerError> {
        info!("Unbrick: writing topology {topology}");
        self.send_topology(topology)?;
        info!("Unbrick: committing");
        self.send(&encode_commit())
    }

    /// Look up `op` in the state table and perform its prerequisite effect
    ///
    /// Returns the state to enter once the operation itself has succeeded.
    fn advance(&mut self, op: Operation) -> Result<SessionState, ControllerError> {
        let Transition { next, effect } = transition(self.state, op)?;
        match effect {
            Effect::None => {}
            Effect::OpenDevice => {
                let transport = self
                    .discovery
                    .open_preferred()
                    .map_err(ConnectionError::from)?;
                info!("Connected to {}", transport.device_info());
                self.transport = Some(transport);
                self.set_state(SessionState::Locked);
            }
            Effect::InitTopologyFirst => {
                debug!("{} requested while Locked, applying topology first", op.name());
                self.init_topology()?;
            }
            Effect::CloseDevice => {
                if let Some(mut transport) = self.transport.take() {
                    if let Err(e) = transport.close() {
                        warn!("Error closing device: {e}");
                    }
                }
            }
        }
        Ok(next)
    }

    fn set_state(&mut self, next: SessionState) {
        if next != self.state {
            debug!("Session {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn transport_mut(&mut self) -> Result<&mut BoxedTransport, ControllerError> {
        self.transport
            .as_mut()
            .ok_or(ControllerError::Transport(TransportError::Disconnected))
    }

    fn send(&mut self, packet: &Packet) -> Result<(), ControllerError> {
        debug!("Sending {}", cmd::name(&packet[1..]));
        self.transport_mut()?.send(packet)?;
        Ok(())
    }

    fn send_topology(&mut self, topology: &Topology) -> Result<(), ControllerError> {
        for (ch, count) in topology.iter() {
            self.send(&encode_set_topology(ch, count))?;
        }
        Ok(())
    }

    /// LED count the topology declares for `channel`
    fn declared_count(&self, channel: u8) -> Result<u8, ControllerError> {
        self.topology.count(channel).ok_or_else(|| {
            ControllerError::InvalidParameter(format!(
                "channel {channel} is not part of the topology ({})",
                self.topology
            ))
        })
    }
}

impl<D: DeviceDiscovery> Drop for AuraController<D> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn check_channel(channel: u8) -> Result<(), ControllerError> {
    if channel as usize >= channel::COUNT {
        return Err(ControllerError::InvalidParameter(format!(
            "channel {channel} does not exist (controller has {} channels)",
            channel::COUNT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_transport::sim::SimulatedDevice;

    fn session(sim: &SimulatedDevice) -> AuraController<SimulatedDevice> {
        AuraController::new(sim.clone(), Topology::default())
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        let ctl = session(&sim);
        assert_eq!(ctl.state(), SessionState::Disconnected);
        assert!(ctl.device_info().is_none());
        assert_eq!(sim.opens(), 0);
    }

    #[test]
    fn test_connect_applies_topology_in_channel_order() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        let mut ctl = session(&sim);
        ctl.connect().unwrap();

        assert_eq!(ctl.state(), SessionState::Runtime);
        let written = sim.written();
        assert_eq!(written.len(), 3);
        for (ch, packet) in written.iter().enumerate() {
            assert_eq!(&packet[..4], &[0xEC, 0x52, 0x53, ch as u8]);
        }
    }

    #[test]
    fn test_set_led_checks_index() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        let mut ctl = session(&sim);
        ctl.connect().unwrap();

        assert!(ctl.set_led(2, 15, Rgb::RED).is_ok());
        assert!(matches!(
            ctl.set_led(2, 16, Rgb::RED),
            Err(ControllerError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_set_effect_rejects_unknown_channel() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        let mut ctl = session(&sim);
        ctl.connect().unwrap();
        assert!(matches!(
            ctl.set_effect(3, EffectMode::Static, Rgb::BLUE, 255),
            Err(ControllerError::InvalidParameter(_))
        ));
    }

    /// Open the device without applying the topology
    fn locked(sim: &SimulatedDevice) -> AuraController<SimulatedDevice> {
        let mut ctl = session(sim);
        let next = ctl.advance(Operation::Connect).unwrap();
        ctl.set_state(next);
        assert_eq!(ctl.state(), SessionState::Locked);
        ctl
    }

    #[test]
    fn test_lighting_from_locked_applies_topology_first() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        let mut ctl = locked(&sim);
        assert!(sim.written().is_empty());

        ctl.set_all_leds(1, Rgb::GREEN).unwrap();
        assert_eq!(ctl.state(), SessionState::Runtime);

        let commands: Vec<(u8, u8)> = sim.written().iter().map(|p| (p[1], p[2])).collect();
        assert_eq!(
            commands,
            vec![(0x52, 0x53), (0x52, 0x53), (0x52, 0x53), (0x40, 0x81)]
        );
    }

    #[test]
    fn test_commit_from_locked_rejected() {
        let sim = SimulatedDevice::bricked();
        let mut ctl = locked(&sim);

        match ctl.commit() {
            Err(ControllerError::State(e)) => assert_eq!(e.state, SessionState::Locked),
            other => panic!("expected StateError, got {other:?}"),
        }
        assert!(sim.written().is_empty());
        assert_eq!(sim.commits(), 0);
        assert_eq!(ctl.state(), SessionState::Locked);
    }

    #[test]
    fn test_drop_releases_device() {
        let sim = SimulatedDevice::new([15, 15, 16]);
        {
            let mut ctl = session(&sim);
            ctl.connect().unwrap();
            assert!(sim.is_open());
        }
        assert!(!sim.is_open());
    }

    #[test]
    fn test_unbrick_adopts_target_topology() {
        let sim = SimulatedDevice::bricked();
        let mut ctl = session(&sim);
        let target: Topology = "0=15,1=15,2=20".parse().unwrap();
        assert!(ctl.unbrick(Some(&target)).unwrap());
        assert_eq!(ctl.topology(), &target);
        assert_eq!(sim.committed_counts(), [15, 15, 20]);
    }
}
