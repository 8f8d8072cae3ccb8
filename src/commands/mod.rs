//! Command handlers for the CLI application.
//!
//! - `recovery`: unbrick, verify, test
//! - `query`: list, info
//! - `set`: set-color, set-effect, commit

pub mod query;
pub mod recovery;
pub mod set;

use std::process::ExitCode;

use aura_controller::AuraController;
use aura_transport::{DeviceDiscovery, HidDiscovery, MonitorConfig, Monitored};
use aura_unbrick::config::Config;
use tracing::info;

#[cfg(feature = "simulate")]
use crate::cli::SimulatedState;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<ExitCode>;

/// Controller over whichever discovery the flags selected
pub type Controller = AuraController<Box<dyn DeviceDiscovery>>;

/// Everything a handler needs to reach the device
pub struct Context {
    pub config: Config,
    pub monitor: Option<MonitorConfig>,
    #[cfg(feature = "simulate")]
    pub simulate: Option<SimulatedState>,
}

impl Context {
    /// Discovery for the selected backend, wrapped for monitoring if requested
    pub fn discovery(&self) -> Box<dyn DeviceDiscovery> {
        let base = self.backend();
        match &self.monitor {
            Some(cfg) => Box::new(Monitored::new(base, cfg.clone())),
            None => base,
        }
    }

    /// A disconnected controller
    pub fn controller(&self) -> Controller {
        AuraController::new(self.discovery(), self.config.topology.clone())
            .with_read_timeout(self.config.read_timeout_ms)
    }

    /// A controller that has completed `connect()`
    pub fn connect(&self) -> anyhow::Result<Controller> {
        let mut ctl = self.controller();
        ctl.connect()?;
        if let Some(dev) = ctl.device_info() {
            info!("Using {dev}");
        }
        Ok(ctl)
    }

    fn backend(&self) -> Box<dyn DeviceDiscovery> {
        #[cfg(feature = "simulate")]
        if let Some(state) = self.simulate {
            info!("Simulating a {state:?} controller");
            return Box::new(aura_transport::sim::SimulatedDevice::new(state.counts()));
        }

        match &self.config.device {
            Some(path) => Box::new(HidDiscovery::with_device_path(path.clone())),
            None => Box::new(HidDiscovery::new()),
        }
    }
}
