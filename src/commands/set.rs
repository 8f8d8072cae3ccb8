//! Lighting and persistence command handlers.

use std::process::ExitCode;

use aura_controller::{EffectMode, Rgb};

use super::{CommandResult, Context, Controller};

/// Channels a command applies to
fn channels(ctl: &Controller, channel: Option<u8>) -> Vec<u8> {
    match channel {
        Some(ch) => vec![ch],
        None => ctl.topology().iter().map(|(ch, _)| ch).collect(),
    }
}

fn finish(ctl: &mut Controller, commit: bool) -> CommandResult {
    if commit {
        ctl.commit()?;
        println!("Committed.");
    }
    Ok(ExitCode::SUCCESS)
}

/// Set direct colors on one LED or whole channels
pub fn set_color(
    ctx: &Context,
    color: Rgb,
    channel: Option<u8>,
    led: Option<u8>,
    commit: bool,
) -> CommandResult {
    let mut ctl = ctx.connect()?;

    match (channel, led) {
        (Some(ch), Some(index)) => {
            ctl.set_led(ch, index, color)?;
            println!("Channel {ch} LED {index} set to {color}");
        }
        _ => {
            for ch in channels(&ctl, channel) {
                let count = ctl.topology().count(ch).unwrap_or(0);
                let colors = vec![color; count as usize];
                ctl.set_leds(ch, 0, &colors)?;
                println!("Channel {ch} ({count} LEDs) set to {color}");
            }
        }
    }

    finish(&mut ctl, commit)
}

/// Select a built-in effect
pub fn set_effect(
    ctx: &Context,
    mode: EffectMode,
    color: Rgb,
    brightness: u8,
    channel: Option<u8>,
    commit: bool,
) -> CommandResult {
    let mut ctl = ctx.connect()?;
    for ch in channels(&ctl, channel) {
        ctl.set_effect(ch, mode, color, brightness)?;
        println!("Channel {ch}: {} ({color}, brightness {brightness})", mode.name());
    }
    finish(&mut ctl, commit)
}

/// Apply the topology and persist it
pub fn commit(ctx: &Context) -> CommandResult {
    let mut ctl = ctx.connect()?;
    println!("Topology {} applied", ctl.topology());
    finish(&mut ctl, true)
}
