//! Device discovery for Aura LED controllers

use std::ffi::CString;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use hidapi::HidApi;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::hid_raw::HidRawTransport;
use crate::protocol::device;
use crate::types::{DiscoveredDevice, TransportDeviceInfo};
use crate::BoxedTransport;

/// Device discovery abstraction
pub trait DeviceDiscovery {
    /// List currently available devices
    fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError>;

    /// Open a specific device
    fn open_device(&self, device: &DiscoveredDevice) -> Result<BoxedTransport, TransportError>;

    /// Open the first supported device
    fn open_preferred(&self) -> Result<BoxedTransport, TransportError> {
        let devices = self.list_devices()?;
        let first = devices.first().ok_or_else(|| {
            TransportError::DeviceNotFound("No supported Aura controller found".into())
        })?;
        self.open_device(first)
    }
}

impl<D: DeviceDiscovery + ?Sized> DeviceDiscovery for Box<D> {
    fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        (**self).list_devices()
    }

    fn open_device(&self, device: &DiscoveredDevice) -> Result<BoxedTransport, TransportError> {
        (**self).open_device(device)
    }

    fn open_preferred(&self) -> Result<BoxedTransport, TransportError> {
        (**self).open_preferred()
    }
}

/// hidapi-backed discovery
pub struct HidDiscovery {
    /// Known VID/PID pairs to look for
    known_devices: Vec<(u16, u16)>,
    /// Skip enumeration and open this node
    device_path: Option<PathBuf>,
}

impl Default for HidDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl HidDiscovery {
    /// Create a new HID discovery instance
    pub fn new() -> Self {
        Self {
            known_devices: device::AURA_PIDS
                .iter()
                .map(|&pid| (device::VENDOR_ID, pid))
                .collect(),
            device_path: None,
        }
    }

    /// Always open `path` instead of enumerating
    pub fn with_device_path(path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: Some(path.into()),
            ..Self::new()
        }
    }

    /// Add a VID/PID pair to discover
    pub fn add_device(&mut self, vid: u16, pid: u16) {
        if !self.known_devices.contains(&(vid, pid)) {
            self.known_devices.push((vid, pid));
        }
    }

    /// Check if a device matches our known devices
    fn is_known_device(&self, vid: u16, pid: u16) -> bool {
        self.known_devices.contains(&(vid, pid))
    }

    fn api() -> Result<HidApi, TransportError> {
        HidApi::new().map_err(TransportError::from)
    }

    /// Open an explicit device node
    ///
    /// Missing nodes and permission problems are reported separately so the
    /// caller can tell the user which one to fix.
    pub fn open_path(&self, path: &Path) -> Result<BoxedTransport, TransportError> {
        let display = path.display().to_string();

        // hidapi folds every open failure into one message; probe first
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    warn!(
                        "Permission denied opening {}. Make sure udev rules are installed.",
                        path.display()
                    );
                }
                TransportError::from_open_error(&display, e)
            })?;

        let api = Self::api()?;
        let c_path = CString::new(display.as_bytes())
            .map_err(|_| TransportError::DeviceNotFound(display.clone()))?;
        let device = api.open_path(&c_path)?;

        let info = match api
            .device_list()
            .find(|d| d.path() == c_path.as_c_str())
        {
            Some(d) => Self::device_info(d),
            None => TransportDeviceInfo {
                vid: 0,
                pid: 0,
                device_path: display.clone(),
                product_name: device.get_product_string().ok().flatten(),
                serial: None,
            },
        };

        info!("Opened {}", info);
        Ok(Box::new(HidRawTransport::new(device, info)))
    }

    fn device_info(d: &hidapi::DeviceInfo) -> TransportDeviceInfo {
        TransportDeviceInfo {
            vid: d.vendor_id(),
            pid: d.product_id(),
            device_path: d.path().to_string_lossy().into_owned(),
            product_name: d.product_string().map(str::to_string),
            serial: d.serial_number().map(str::to_string),
        }
    }
}

impl DeviceDiscovery for HidDiscovery {
    fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        let api = Self::api()?;
        let mut devices: Vec<DiscoveredDevice> = api
            .device_list()
            .filter(|d| self.is_known_device(d.vendor_id(), d.product_id()))
            .map(|d| DiscoveredDevice {
                info: Self::device_info(d),
            })
            .collect();

        // One controller can expose several interfaces; keep one entry per node
        devices.sort_by(|a, b| a.info.device_path.cmp(&b.info.device_path));
        devices.dedup_by(|a, b| a.info.device_path == b.info.device_path);

        debug!("Found {} Aura controller(s)", devices.len());
        Ok(devices)
    }

    fn open_device(&self, device: &DiscoveredDevice) -> Result<BoxedTransport, TransportError> {
        self.open_path(Path::new(&device.info.device_path))
    }

    fn open_preferred(&self) -> Result<BoxedTransport, TransportError> {
        if let Some(ref path) = self.device_path {
            return self.open_path(path);
        }
        let devices = self.list_devices()?;
        let first = devices.first().ok_or_else(|| {
            TransportError::DeviceNotFound(format!(
                "No supported Aura controller found (vendor {:04X})",
                device::VENDOR_ID
            ))
        })?;
        self.open_device(first)
    }
}
