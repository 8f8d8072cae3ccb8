//! Integration tests against a real controller.
//!
//! These tests require an Aura LED controller to be connected and writable.
//! Run with: cargo test -p aura-controller --test device_roundtrip -- --ignored --nocapture

use aura_controller::{AuraController, SessionState, Topology};
use aura_transport::{DeviceDiscovery, HidDiscovery};

fn open_controller() -> AuraController<HidDiscovery> {
    let mut ctl = AuraController::new(HidDiscovery::new(), Topology::default());
    ctl.connect()
        .expect("No controller found; plug in a supported device");
    ctl
}

#[test]
#[ignore] // requires hardware
fn lists_at_least_one_controller() {
    let devices = HidDiscovery::new().list_devices().unwrap();
    for d in &devices {
        println!("{}", d.info);
    }
    assert!(!devices.is_empty());
}

#[test]
#[ignore] // requires hardware
fn connect_and_read_config() {
    let mut ctl = open_controller();
    assert_eq!(ctl.state(), SessionState::Runtime);

    let snapshot = ctl.get_config().unwrap();
    println!("{snapshot}");
    assert_eq!(snapshot.raw[0], 0xEC);

    ctl.disconnect();
    assert_eq!(ctl.state(), SessionState::Disconnected);
}

/// Does not commit; the stored table is left untouched.
#[test]
#[ignore] // requires hardware
fn runtime_colors_without_commit() {
    let mut ctl = open_controller();
    for ch in 0..3 {
        ctl.set_all_leds(ch, aura_controller::Rgb::new(0, 0, 64))
            .unwrap();
    }
    assert_eq!(ctl.state(), SessionState::Runtime);
    println!("brick verdict: {}", ctl.brick_verdict());
}
