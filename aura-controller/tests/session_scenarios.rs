//! Session behaviour against the simulated controller firmware.

use aura_controller::{
    AuraController, BrickVerdict, ConnectionError, ControllerError, EffectMode, Rgb,
    SessionState, Topology,
};
use aura_transport::sim::{SimOpenFailure, SimulatedDevice};
use aura_transport::Packet;

fn session(sim: &SimulatedDevice) -> AuraController<SimulatedDevice> {
    AuraController::new(sim.clone(), Topology::default())
}

fn connected(sim: &SimulatedDevice) -> AuraController<SimulatedDevice> {
    let mut ctl = session(sim);
    ctl.connect().unwrap();
    sim.clear_written();
    ctl
}

fn is_direct_color(packet: &Packet) -> bool {
    packet[0] == 0xEC && packet[1] == 0x40
}

// =============================================================================
// State machine
// =============================================================================

#[test]
fn disconnected_rejects_device_operations() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = session(&sim);

    let results = [
        ctl.set_led(0, 0, Rgb::RED).err(),
        ctl.set_all_leds(0, Rgb::RED).err(),
        ctl.set_leds(0, 0, &[Rgb::RED]).err(),
        ctl.set_effect(0, EffectMode::Static, Rgb::RED, 255).err(),
        ctl.commit().err(),
        ctl.get_config().err(),
        ctl.init_topology().err(),
    ];
    for err in results {
        match err {
            Some(ControllerError::State(e)) => assert_eq!(e.state, SessionState::Disconnected),
            other => panic!("expected StateError, got {other:?}"),
        }
    }
    assert_eq!(ctl.state(), SessionState::Disconnected);
    assert!(sim.written().is_empty());
    assert_eq!(sim.opens(), 0);
}

#[test]
fn connect_lands_in_runtime() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = session(&sim);
    ctl.connect().unwrap();
    assert_eq!(ctl.state(), SessionState::Runtime);
    assert!(ctl.device_info().is_some());
}

#[test]
fn connect_twice_is_rejected() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);
    assert!(matches!(ctl.connect(), Err(ControllerError::State(_))));
    assert_eq!(ctl.state(), SessionState::Runtime);
    assert_eq!(sim.opens(), 1);
}

#[test]
fn connect_distinguishes_not_found_from_permission() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = session(&sim);

    sim.fail_next_open(SimOpenFailure::NotFound);
    assert!(matches!(
        ctl.connect(),
        Err(ControllerError::Connection(ConnectionError::NotFound(_)))
    ));

    sim.fail_next_open(SimOpenFailure::PermissionDenied);
    let err = ctl.connect().unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Connection(ConnectionError::PermissionDenied(_))
    ));
    assert_eq!(err.kind(), "ConnectionError");
    assert!(err.hint().is_some());
    assert_eq!(ctl.state(), SessionState::Disconnected);
}

#[test]
fn failed_topology_init_releases_device() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    sim.set_short_writes(true);
    let mut ctl = session(&sim);

    assert!(matches!(ctl.connect(), Err(ControllerError::Transport(_))));
    assert_eq!(ctl.state(), SessionState::Disconnected);
    assert!(!sim.is_open());
}

#[test]
fn init_topology_is_idempotent() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);

    ctl.init_topology().unwrap();
    ctl.init_topology().unwrap();
    assert_eq!(ctl.state(), SessionState::Runtime);
    assert_eq!(ctl.topology(), &Topology::default());
    assert_eq!(sim.runtime_counts(), [15, 15, 16]);
    assert_eq!(sim.written().len(), 6);
}

#[test]
fn commit_moves_to_committed_and_persists() {
    let sim = SimulatedDevice::new([15, 15, 9]);
    let mut ctl = connected(&sim);

    ctl.commit().unwrap();
    assert_eq!(ctl.state(), SessionState::Committed);
    assert_eq!(sim.committed_counts(), [15, 15, 16]);

    // Still usable after commit
    ctl.commit().unwrap();
    assert_eq!(ctl.state(), SessionState::Committed);
    ctl.set_all_leds(1, Rgb::GREEN).unwrap();
    assert_eq!(ctl.state(), SessionState::Committed);
}

#[test]
fn disconnect_from_any_state_is_idempotent() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = session(&sim);

    ctl.disconnect();
    assert_eq!(ctl.state(), SessionState::Disconnected);

    ctl.connect().unwrap();
    ctl.disconnect();
    assert_eq!(ctl.state(), SessionState::Disconnected);
    assert!(!sim.is_open());

    ctl.connect().unwrap();
    ctl.commit().unwrap();
    ctl.disconnect();
    ctl.disconnect();
    assert_eq!(ctl.state(), SessionState::Disconnected);
    assert!(ctl.device_info().is_none());
}

// =============================================================================
// Lighting
// =============================================================================

#[test]
fn set_all_leds_sends_one_packet() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);
    let color = Rgb::new(0x12, 0x34, 0x56);

    ctl.set_all_leds(2, color).unwrap();

    let written = sim.written();
    assert_eq!(written.len(), 1);
    let packet = &written[0];
    assert!(is_direct_color(packet));
    assert_eq!(packet[2], 0x82);
    assert_eq!(packet[3], 0);
    assert_eq!(packet[4], 16);
    for i in 0..16 {
        assert_eq!(&packet[5 + i * 3..8 + i * 3], &[0x12, 0x34, 0x56]);
    }
    assert_eq!(&packet[5 + 16 * 3..8 + 16 * 3], &[0, 0, 0]);
}

#[test]
fn set_all_leds_truncates_long_channels() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let topology: Topology = "0=30".parse().unwrap();
    let mut ctl = AuraController::new(sim.clone(), topology);
    ctl.connect().unwrap();
    sim.clear_written();

    ctl.set_all_leds(0, Rgb::WHITE).unwrap();

    let written = sim.written();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0][4], 20);
    assert_eq!(&written[0][5 + 19 * 3..8 + 19 * 3], &[255, 255, 255]);
    assert_eq!(&written[0][5 + 20 * 3..8 + 20 * 3], &[0, 0, 0]);
}

#[test]
fn set_leds_splits_into_chunks() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let topology: Topology = "1=45".parse().unwrap();
    let mut ctl = AuraController::new(sim.clone(), topology);
    ctl.connect().unwrap();
    sim.clear_written();

    let colors = vec![Rgb::BLUE; 42];
    ctl.set_leds(1, 3, &colors).unwrap();

    let written = sim.written();
    let chunks: Vec<(u8, u8)> = written.iter().map(|p| (p[3], p[4])).collect();
    assert_eq!(chunks, vec![(3, 20), (23, 20), (43, 2)]);

    assert!(matches!(
        ctl.set_leds(1, 40, &colors[..6]),
        Err(ControllerError::InvalidParameter(_))
    ));
}

#[test]
fn set_all_leds_on_undeclared_channel_fails() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let topology: Topology = "0=15".parse().unwrap();
    let mut ctl = AuraController::new(sim.clone(), topology);
    ctl.connect().unwrap();
    assert!(matches!(
        ctl.set_all_leds(2, Rgb::RED),
        Err(ControllerError::InvalidParameter(_))
    ));
}

#[test]
fn set_effect_encodes_mode_and_color() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);

    ctl.set_effect(1, EffectMode::Breathing, Rgb::new(1, 2, 3), 200)
        .unwrap();
    let written = sim.written();
    assert_eq!(&written[0][..8], &[0xEC, 0x35, 1, 2, 1, 2, 3, 200]);
}

// =============================================================================
// Configuration and recovery
// =============================================================================

#[test]
fn get_config_keeps_state() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);

    let snapshot = ctl.get_config().unwrap();
    assert_eq!(snapshot.led_counts, [15, 15, 16]);
    assert_eq!(ctl.state(), SessionState::Runtime);
}

#[test]
fn get_config_without_answer_is_protocol_error() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);
    sim.set_drop_reads(true);

    assert!(matches!(
        ctl.get_config(),
        Err(ControllerError::Protocol(_))
    ));
}

#[test]
fn brick_heuristic_on_device() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);
    assert!(!ctl.is_bricked());

    let sim = SimulatedDevice::bricked();
    let mut ctl = connected(&sim);
    assert_eq!(ctl.brick_verdict(), BrickVerdict::UniformReset(5));
    assert!(ctl.is_bricked());

    let sim = SimulatedDevice::new([15, 0, 16]);
    let mut ctl = connected(&sim);
    assert!(ctl.is_bricked());
}

#[test]
fn degraded_reference_channel_is_not_flagged() {
    let sim = SimulatedDevice::new([15, 15, 9]);
    let mut ctl = connected(&sim);
    assert!(!ctl.is_bricked());
}

#[test]
fn unreadable_config_counts_as_bricked() {
    let sim = SimulatedDevice::new([15, 15, 16]);
    let mut ctl = connected(&sim);
    sim.set_drop_reads(true);
    assert!(matches!(ctl.brick_verdict(), BrickVerdict::Unreadable(_)));

    let mut idle = session(&sim);
    assert!(idle.is_bricked());
}

#[test]
fn unbrick_after_fresh_connect_recovers() {
    let sim = SimulatedDevice::bricked();
    let mut ctl = connected(&sim);

    let target: Topology = "0=15,1=15,2=16".parse().unwrap();
    assert!(ctl.unbrick(Some(&target)).unwrap());
    assert_eq!(ctl.state(), SessionState::Committed);

    let snapshot = ctl.get_config().unwrap();
    assert!(snapshot.led_count(2).unwrap() >= 16);
    assert!(!ctl.is_bricked());
}

#[test]
fn unbrick_from_disconnected_opens_device() {
    let sim = SimulatedDevice::bricked();
    let mut ctl = session(&sim);

    assert!(ctl.unbrick(None).unwrap());
    assert_eq!(ctl.state(), SessionState::Committed);
    assert_eq!(sim.opens(), 1);
    assert_eq!(sim.committed_counts(), [15, 15, 16]);
}

#[test]
fn unbrick_writes_topology_then_commit() {
    let sim = SimulatedDevice::bricked();
    let mut ctl = session(&sim);
    ctl.unbrick(None).unwrap();

    let commands: Vec<u8> = sim.written().iter().map(|p| p[1]).collect();
    assert_eq!(commands, vec![0x52, 0x52, 0x52, 0x3F, 0xB0]);
}

#[test]
fn unbrick_reports_failed_verification() {
    let sim = SimulatedDevice::bricked();
    let mut ctl = session(&sim);

    // Reference channel left short of its expected count
    let target: Topology = "0=15,1=15,2=12".parse().unwrap();
    assert!(!ctl.unbrick(Some(&target)).unwrap());
    assert_eq!(ctl.state(), SessionState::Committed);
}

#[test]
fn unbrick_with_silent_device_still_commits() {
    let sim = SimulatedDevice::bricked();
    sim.set_drop_reads(true);
    let mut ctl = session(&sim);

    assert!(!ctl.unbrick(None).unwrap());
    assert_eq!(ctl.state(), SessionState::Committed);
    assert_eq!(sim.commits(), 1);
}

#[test]
fn failed_unbrick_releases_device_it_opened() {
    let sim = SimulatedDevice::bricked();
    sim.set_short_writes(true);
    let mut ctl = session(&sim);

    assert!(matches!(ctl.unbrick(None), Err(ControllerError::Transport(_))));
    assert_eq!(ctl.state(), SessionState::Disconnected);
    assert!(!sim.is_open());
    assert_eq!(sim.commits(), 0);
}

#[test]
fn failed_unbrick_keeps_existing_session() {
    let sim = SimulatedDevice::bricked();
    let mut ctl = connected(&sim);
    sim.set_short_writes(true);

    assert!(ctl.unbrick(None).is_err());
    assert_eq!(ctl.state(), SessionState::Runtime);
    assert!(sim.is_open());
}
