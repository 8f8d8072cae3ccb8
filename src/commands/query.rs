//! Query (read-only) command handlers.

use std::process::ExitCode;

use aura_transport::DeviceDiscovery;

use super::{CommandResult, Context};

/// List supported controllers
pub fn list(ctx: &Context) -> CommandResult {
    let devices = ctx.discovery().list_devices()?;
    if devices.is_empty() {
        println!("No supported controllers found.");
        return Ok(ExitCode::FAILURE);
    }
    for d in &devices {
        println!("{}", d.info);
    }
    Ok(ExitCode::SUCCESS)
}

/// Device information and stored configuration
pub fn info(ctx: &Context) -> CommandResult {
    let mut ctl = ctx.connect()?;
    if let Some(dev) = ctl.device_info() {
        println!("Device:   {dev}");
    }
    println!("Topology: {}", ctl.topology());
    println!("State:    {}", ctl.state());
    println!();
    let snapshot = ctl.get_config()?;
    print!("{snapshot}");
    Ok(ExitCode::SUCCESS)
}
