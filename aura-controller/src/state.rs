//! Session state machine
//!
//! The firmware keeps two tiers of configuration: a volatile runtime tier that
//! must be populated with the topology before anything else is accepted, and a
//! committed tier in EEPROM. The session tracks where it stands:
//!
//! ```text
//! Disconnected --connect--> Locked --init_topology--> Runtime --commit--> Committed
//!      ^                                                                      |
//!      +------------------------------ disconnect ---------------------------+
//! ```
//!
//! [`transition`] is the whole table. It is pure: given the current state and
//! an operation it returns the state after the operation succeeds, plus any
//! work that has to happen first.

use std::fmt;

use crate::error::StateError;

/// Where the session stands relative to the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No device handle
    #[default]
    Disconnected,
    /// Device open, topology not yet applied
    ///
    /// Transient: `connect` and `unbrick` leave it before returning, and on
    /// failure the device is released instead.
    Locked,
    /// Topology applied to volatile memory
    Runtime,
    /// Runtime configuration persisted to EEPROM
    Committed,
}

impl SessionState {
    /// Whether a device handle is held
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Locked => "Locked",
            Self::Runtime => "Runtime",
            Self::Committed => "Committed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operations that touch the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Connect,
    Disconnect,
    InitTopology,
    /// `set_led`, `set_all_leds`, `set_leds`, `set_effect`
    Lighting,
    Commit,
    ReadConfig,
    Unbrick,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::InitTopology => "init_topology",
            Self::Lighting => "lighting",
            Self::Commit => "commit",
            Self::ReadConfig => "get_config",
            Self::Unbrick => "unbrick",
        }
    }
}

/// Work the controller performs before the operation itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Open the transport
    OpenDevice,
    /// Apply the topology (Locked -> Runtime) before proceeding
    InitTopologyFirst,
    /// Release the transport
    CloseDevice,
}

/// Result of looking up an operation in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State once the operation has completed
    pub next: SessionState,
    /// Prerequisite work
    pub effect: Effect,
}

impl Transition {
    fn to(next: SessionState) -> Self {
        Self {
            next,
            effect: Effect::None,
        }
    }

    fn with(next: SessionState, effect: Effect) -> Self {
        Self { next, effect }
    }
}

/// The state table
pub fn transition(state: SessionState, op: Operation) -> Result<Transition, StateError> {
    use Operation as Op;
    use SessionState::*;

    let reject = || StateError {
        operation: op.name(),
        state,
    };

    match (op, state) {
        (Op::Connect, Disconnected) => Ok(Transition::with(Locked, Effect::OpenDevice)),
        (Op::Connect, _) => Err(reject()),

        (Op::Disconnect, Disconnected) => Ok(Transition::to(Disconnected)),
        (Op::Disconnect, _) => Ok(Transition::with(Disconnected, Effect::CloseDevice)),

        (Op::InitTopology, Disconnected) => Err(reject()),
        (Op::InitTopology, _) => Ok(Transition::to(Runtime)),

        (Op::Lighting, Disconnected) => Err(reject()),
        (Op::Lighting, Locked) => Ok(Transition::with(Runtime, Effect::InitTopologyFirst)),
        (Op::Lighting, s) => Ok(Transition::to(s)),

        // The firmware swallows a commit sent before the topology without
        // persisting anything
        (Op::Commit, Runtime | Committed) => Ok(Transition::to(Committed)),
        (Op::Commit, _) => Err(reject()),

        (Op::ReadConfig, Disconnected) => Err(reject()),
        (Op::ReadConfig, s) => Ok(Transition::to(s)),

        (Op::Unbrick, Disconnected) => Ok(Transition::with(Committed, Effect::OpenDevice)),
        (Op::Unbrick, _) => Ok(Transition::to(Committed)),
    }
}
