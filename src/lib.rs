//! Recovery and safe-control tool for ASUS Aura LED controllers
//!
//! The session logic lives in `aura-controller`; this crate adds the
//! configuration file and the `aura-unbrick` command line.

pub mod config;

pub use config::Config;
