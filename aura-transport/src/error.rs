//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Short write: expected {expected} bytes, wrote {written}")]
    ShortWrite { expected: usize, written: usize },

    #[error("HID error: {0}")]
    HidError(String),
}

impl TransportError {
    /// Classify an I/O error raised while opening a device node
    pub fn from_open_error(path: &str, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => TransportError::DeviceNotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                TransportError::PermissionDenied(path.to_string())
            }
            _ => TransportError::HidError(format!("{path}: {e}")),
        }
    }
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EACCES") || msg.contains("EPERM") {
            TransportError::PermissionDenied(msg)
        } else {
            TransportError::HidError(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_open_error_classification() {
        let e = TransportError::from_open_error("/dev/hidraw9", io::ErrorKind::NotFound.into());
        assert!(matches!(e, TransportError::DeviceNotFound(p) if p == "/dev/hidraw9"));

        let e = TransportError::from_open_error(
            "/dev/hidraw0",
            io::ErrorKind::PermissionDenied.into(),
        );
        assert!(matches!(e, TransportError::PermissionDenied(_)));

        let e = TransportError::from_open_error("/dev/hidraw0", io::ErrorKind::Other.into());
        assert!(matches!(e, TransportError::HidError(_)));
    }
}
