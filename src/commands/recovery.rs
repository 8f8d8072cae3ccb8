//! Recovery command handlers.

use std::process::ExitCode;

use aura_controller::{
    classify_brick, AuraController, BrickVerdict, ConfigSnapshot, ControllerError, Rgb,
    SessionState,
};
use aura_transport::DeviceDiscovery;

use super::{CommandResult, Context};

/// Rewrite topology, commit, verify
pub fn unbrick(ctx: &Context) -> CommandResult {
    let mut ctl = ctx.controller();
    println!("Writing topology {} and committing...", ctl.topology());

    let recovered = ctl.unbrick(None)?;
    if let Ok(snapshot) = ctl.get_config() {
        print!("{snapshot}");
    }

    if recovered {
        println!("Recovered.");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Commit sent but the controller did not report the expected LED count.");
        eprintln!("Power-cycle the machine (not just a reboot) and run unbrick again.");
        Ok(ExitCode::FAILURE)
    }
}

/// Read config and classify it
pub fn verify(ctx: &Context) -> CommandResult {
    let mut ctl = ctx.connect()?;
    let (snapshot, verdict) = read_and_classify(&mut ctl);
    if let Some(snapshot) = snapshot {
        print!("{snapshot}");
    }
    if verdict.is_bricked() {
        println!("BRICKED: {verdict}");
        println!("Run `aura-unbrick unbrick` to restore the topology.");
        Ok(ExitCode::FAILURE)
    } else {
        println!("OK: {verdict}");
        Ok(ExitCode::SUCCESS)
    }
}

/// Read the table once and classify that same read
///
/// A failed read yields no snapshot and [`BrickVerdict::Unreadable`].
fn read_and_classify<D: DeviceDiscovery>(
    ctl: &mut AuraController<D>,
) -> (Option<ConfigSnapshot>, BrickVerdict) {
    match ctl.get_config() {
        Ok(snapshot) => {
            let verdict = classify_brick(&snapshot);
            (Some(snapshot), verdict)
        }
        Err(e) => (None, BrickVerdict::Unreadable(e.to_string())),
    }
}

/// Step through the session states, reporting each check
pub fn test(ctx: &Context, commit: bool) -> CommandResult {
    let mut checks = Checklist::default();
    let mut ctl = ctx.controller();

    checks.expect("starts Disconnected", ctl.state() == SessionState::Disconnected);
    checks.expect(
        "commit rejected while Disconnected",
        matches!(ctl.commit(), Err(ControllerError::State(_))),
    );

    ctl.connect()?;
    checks.expect("connect lands in Runtime", ctl.state() == SessionState::Runtime);

    ctl.init_topology()?;
    checks.expect(
        "init_topology again stays in Runtime",
        ctl.state() == SessionState::Runtime,
    );

    let palette = [Rgb::RED, Rgb::GREEN, Rgb::BLUE];
    let channels: Vec<u8> = ctl.topology().iter().map(|(ch, _)| ch).collect();
    for (ch, color) in channels.into_iter().zip(palette.iter().cycle()) {
        ctl.set_all_leds(ch, *color)?;
        println!("  channel {ch} set to {color}");
    }
    checks.expect("colors keep Runtime", ctl.state() == SessionState::Runtime);

    let snapshot = ctl.get_config()?;
    print!("{snapshot}");
    checks.expect("config readable", true);

    if commit {
        ctl.commit()?;
        checks.expect("commit lands in Committed", ctl.state() == SessionState::Committed);
    }

    let verdict = ctl.brick_verdict();
    println!("  brick check: {verdict}");

    ctl.disconnect();
    ctl.disconnect();
    checks.expect(
        "disconnect twice ends Disconnected",
        ctl.state() == SessionState::Disconnected,
    );

    println!("{} passed, {} failed", checks.passed, checks.failed);
    if checks.failed == 0 && !verdict.is_bricked() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[derive(Default)]
struct Checklist {
    passed: usize,
    failed: usize,
}

impl Checklist {
    fn expect(&mut self, what: &str, ok: bool) {
        if ok {
            self.passed += 1;
            println!("[PASS] {what}");
        } else {
            self.failed += 1;
            println!("[FAIL] {what}");
        }
    }
}
