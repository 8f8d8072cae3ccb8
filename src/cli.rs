// CLI definitions using clap

use std::path::PathBuf;

use aura_controller::{EffectMode, Rgb, Topology};
use aura_transport::PacketFilter;
use clap::{Parser, Subcommand};
#[cfg(feature = "simulate")]
use clap::ValueEnum;

#[derive(Parser)]
#[command(name = "aura-unbrick")]
#[command(author, version, about = "Recovery and safe control for ASUS Aura LED controllers")]
#[command(propagate_version = true)]
pub struct Cli {
    /// hidraw node to open instead of the first supported controller
    #[arg(long, global = true, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Config file (default: ~/.config/aura-unbrick/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// LED count per channel, e.g. 0=15,1=15,2=16
    #[arg(long, global = true, value_name = "CH=COUNT,...")]
    pub topology: Option<Topology>,

    /// Log every packet sent and received
    #[arg(long, global = true)]
    pub monitor: bool,

    /// With --monitor: dump whole packets instead of the first 16 bytes
    #[arg(long, global = true)]
    pub hex: bool,

    /// With --monitor: only show matching packets (all, writes, reads, cmd=0xNN)
    #[arg(long, global = true, value_name = "FILTER")]
    pub filter: Option<PacketFilter>,

    /// Drive an in-memory controller instead of hardware
    #[cfg(feature = "simulate")]
    #[arg(
        long,
        global = true,
        value_name = "STATE",
        num_args = 0..=1,
        default_missing_value = "bricked"
    )]
    pub simulate: Option<SimulatedState>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    // === Recovery ===
    /// Rewrite the topology, commit it and verify the result
    #[command(visible_alias = "fix")]
    Unbrick,

    /// Read the configuration and check it for known brick patterns
    #[command(visible_alias = "check")]
    Verify,

    /// Walk the session through every state and report each step
    Test {
        /// Also commit (writes EEPROM)
        #[arg(long)]
        commit: bool,
    },

    // === Query ===
    /// List supported controllers
    #[command(visible_alias = "ls")]
    List,

    /// Show device information and the stored configuration table
    Info,

    // === Lighting ===
    /// Set LED colors directly
    SetColor {
        /// Color as #rrggbb or r,g,b
        color: Rgb,
        /// Channel (default: every channel in the topology)
        #[arg(short, long)]
        channel: Option<u8>,
        /// Single LED index (requires --channel)
        #[arg(short, long, requires = "channel")]
        led: Option<u8>,
        /// Persist the runtime configuration afterwards
        #[arg(long)]
        commit: bool,
    },

    /// Select a built-in effect
    SetEffect {
        /// Effect name or number (static, breathing, rainbow, ...)
        mode: EffectMode,
        /// Effect color
        #[arg(long, default_value = "#ffffff")]
        color: Rgb,
        /// Brightness (0-255)
        #[arg(short, long, default_value_t = 255)]
        brightness: u8,
        /// Channel (default: every channel in the topology)
        #[arg(short, long)]
        channel: Option<u8>,
        /// Persist the runtime configuration afterwards
        #[arg(long)]
        commit: bool,
    },

    /// Apply the topology and persist it
    Commit,
}

/// Stored table of the simulated controller
#[cfg(feature = "simulate")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SimulatedState {
    /// 15/15/16
    Healthy,
    /// Every channel reset to 5 LEDs
    Bricked,
    /// Channel 2 down to 9 LEDs
    Degraded,
}

#[cfg(feature = "simulate")]
impl SimulatedState {
    pub fn counts(self) -> [u8; 3] {
        match self {
            Self::Healthy => [15, 15, 16],
            Self::Bricked => [5, 5, 5],
            Self::Degraded => [15, 15, 9],
        }
    }
}
