//! Controller error types

use aura_transport::{ProtocolError, TransportError};
use thiserror::Error;

use crate::state::SessionState;

/// Errors from controller operations
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Device could not be opened
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Device answered with something unexpected
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Operation not valid in the current session state
    #[error(transparent)]
    State(#[from] StateError),

    /// I/O failure on an open device
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ControllerError {
    /// Short category label for user-facing output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "ConnectionError",
            Self::Protocol(_) => "ProtocolError",
            Self::State(_) => "StateError",
            Self::Transport(_) => "TransportError",
            Self::InvalidParameter(_) => "InvalidParameter",
        }
    }

    /// One-line remediation hint, if there is an obvious fix
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Connection(e) => Some(e.hint()),
            Self::Protocol(_) => {
                Some("The controller did not answer as expected; replug it and retry")
            }
            Self::State(e) if e.state == SessionState::Disconnected => {
                Some("Connect to the device before sending commands")
            }
            Self::State(_) => Some("Apply the topology before committing"),
            Self::Transport(_) => Some("Check the USB connection and retry"),
            Self::InvalidParameter(_) => None,
        }
    }
}

/// Why a device could not be opened
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to open device: {0}")]
    Other(TransportError),
}

impl ConnectionError {
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NotFound(_) => {
                "Check that the controller is plugged in and listed by `aura-unbrick list`"
            }
            Self::PermissionDenied(_) => {
                "Install the udev rule or run `sudo chmod a+rw` on the hidraw node"
            }
            Self::Other(_) => "Replug the controller and retry",
        }
    }
}

impl From<TransportError> for ConnectionError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::DeviceNotFound(msg) => Self::NotFound(msg),
            TransportError::PermissionDenied(msg) => Self::PermissionDenied(msg),
            other => Self::Other(other),
        }
    }
}

/// Operation rejected by the session state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} is not allowed while {state}")]
pub struct StateError {
    /// Operation that was attempted
    pub operation: &'static str,
    /// State the session was in
    pub state: SessionState,
}
