//! Protocol constants and utilities for ASUS Aura LED controller communication

/// Every packet, in both directions, starts with this report ID
pub const PREFIX: u8 = 0xEC;

/// HID report size (report ID + 64 payload bytes)
pub const REPORT_SIZE: usize = 65;

/// A complete outgoing packet
pub type Packet = [u8; REPORT_SIZE];

/// Command codes (bytes following the prefix)
pub mod cmd {
    /// Request the configuration table
    pub const READ_CONFIG: &[u8] = &[0xB0];
    /// Response code echoed after the prefix for READ_CONFIG
    pub const CONFIG_RESPONSE: u8 = 0x30;
    /// Set runtime LED count for a channel
    pub const SET_TOPOLOGY: &[u8] = &[0x52, 0x53];
    /// Persist runtime configuration to EEPROM
    pub const COMMIT: &[u8] = &[0x3F, 0x55];
    /// Select a built-in effect
    pub const SET_EFFECT: &[u8] = &[0x35];
    /// Write explicit per-LED colors
    pub const DIRECT_COLOR: &[u8] = &[0x40];

    /// Get human-readable name for a packet's command bytes (prefix excluded)
    pub fn name(bytes: &[u8]) -> &'static str {
        match bytes {
            [0xB0, ..] => "READ_CONFIG",
            [0x30, ..] => "CONFIG_RESPONSE",
            [0x52, 0x53, ..] => "SET_TOPOLOGY",
            [0x3F, 0x55, ..] => "COMMIT",
            [0x35, ..] => "SET_EFFECT",
            [0x40, ..] => "DIRECT_COLOR",
            _ => "UNKNOWN",
        }
    }
}

/// Channel layout of the observed controller
pub mod channel {
    /// Number of addressable headers
    pub const COUNT: usize = 3;
    /// Maximum LEDs the firmware accepts per channel
    pub const MAX_LEDS: u8 = 120;
    /// Bit OR-ed into the channel byte of DIRECT_COLOR packets
    pub const DIRECT_MODE_BIT: u8 = 0x80;
    /// Color triplets that fit in one DIRECT_COLOR packet
    pub const MAX_DIRECT_COLORS: usize = 20;
}

/// Byte offsets inside a READ_CONFIG response (prefix at 0, code at 1)
pub mod config_offsets {
    /// LED count per channel
    pub const LED_COUNT: [usize; super::channel::COUNT] = [0x0A, 0x10, 0x16];
    /// Status flag per channel, stored right after the count
    pub const STATUS: [usize; super::channel::COUNT] = [0x0B, 0x11, 0x17];
    /// Shortest response that still covers every field above
    pub const MIN_LEN: usize = 0x18;
}

/// HID communication timing constants
pub mod timing {
    /// Default timeout for a configuration read (ms)
    pub const READ_TIMEOUT_MS: i32 = 1000;
}

/// Device identification constants
pub mod device {
    /// ASUSTek vendor ID
    pub const VENDOR_ID: u16 = 0x0B05;

    /// Aura LED controller product IDs seen on mainboards
    pub const AURA_PIDS: &[u16] = &[0x1867, 0x1872, 0x18A3, 0x18A5, 0x1939, 0x19AF, 0x1AA6];

    /// Check if a VID/PID pair belongs to a supported controller
    pub fn is_supported(vid: u16, pid: u16) -> bool {
        vid == VENDOR_ID && AURA_PIDS.contains(&pid)
    }
}

/// Build a packet: `[0xEC] [cmd...] [data...]`, zero padded to 65 bytes
///
/// Anything that does not fit is dropped.
pub fn build_command(cmd: &[u8], data: &[u8]) -> Packet {
    let mut buf = [0u8; REPORT_SIZE];
    buf[0] = PREFIX;
    let cmd_len = cmd.len().min(REPORT_SIZE - 1);
    buf[1..1 + cmd_len].copy_from_slice(&cmd[..cmd_len]);
    let start = 1 + cmd_len;
    let len = data.len().min(REPORT_SIZE - start);
    buf[start..start + len].copy_from_slice(&data[..len]);
    buf
}

/// Format the first `n` bytes of a packet as space-separated hex
pub fn hex_prefix(buf: &[u8], n: usize) -> String {
    buf.iter()
        .take(n)
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_command_layout() {
        let buf = build_command(cmd::SET_TOPOLOGY, &[2, 16]);
        assert_eq!(buf.len(), REPORT_SIZE);
        assert_eq!(&buf[..5], &[0xEC, 0x52, 0x53, 2, 16]);
        assert!(buf[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_build_command_drops_overflow() {
        let data = [0xAA; 100];
        let buf = build_command(cmd::DIRECT_COLOR, &data);
        assert_eq!(buf[1], 0x40);
        assert!(buf[2..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_cmd_names() {
        assert_eq!(cmd::name(cmd::COMMIT), "COMMIT");
        assert_eq!(cmd::name(&[0x52, 0x53, 0, 15]), "SET_TOPOLOGY");
        assert_eq!(cmd::name(&[0x52, 0x00]), "UNKNOWN");
        assert_eq!(cmd::name(&[]), "UNKNOWN");
    }

    #[test]
    fn test_supported_ids() {
        assert!(device::is_supported(0x0B05, 0x19AF));
        assert!(!device::is_supported(0x0B05, 0x0001));
        assert!(!device::is_supported(0x3151, 0x19AF));
    }
}
