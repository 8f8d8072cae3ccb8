//! Configuration file
//!
//! ```toml
//! device = "/dev/hidraw3"
//! read_timeout_ms = 1000
//!
//! [topology]
//! 0 = 15
//! 1 = 15
//! 2 = 16
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use aura_controller::Topology;
use aura_transport::protocol::timing;
use serde::{Deserialize, Serialize};

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Explicit hidraw node; otherwise the first supported controller is used
    #[serde(default)]
    pub device: Option<PathBuf>,
    /// How long config reads wait for an answer
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: i32,
    /// LED count per channel, applied on every connect
    #[serde(default)]
    pub topology: Topology,
}

fn default_read_timeout() -> i32 {
    timing::READ_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            read_timeout_ms: default_read_timeout(),
            topology: Topology::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aura-unbrick")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.read_timeout_ms <= 0 {
            anyhow::bail!("read_timeout_ms must be positive");
        }
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, device: Option<PathBuf>, topology: Option<Topology>) -> Self {
        if device.is_some() {
            self.device = device;
        }
        if let Some(topology) = topology {
            self.topology = topology;
        }
        self
    }
}
