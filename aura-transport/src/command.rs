//! Type-safe packet builders and response parsers
//!
//! Every builder produces a full 65-byte packet with the 0xEC prefix and zero
//! padding. The firmware performs little validation of its own, so these
//! builders encode exactly what they are given; range checks belong to the
//! caller.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::protocol::{self, channel, cmd, config_offsets, Packet, PREFIX};

// =============================================================================
// Core Traits
// =============================================================================

/// A command that can be serialized to a packet
pub trait HidCommand: Sized {
    /// Command bytes written after the prefix
    const CMD: &'static [u8];

    /// Serialize the command-specific fields (excluding prefix and command bytes)
    fn to_data(&self) -> Vec<u8>;

    /// Build the complete 65-byte packet
    fn build(&self) -> Packet {
        protocol::build_command(Self::CMD, &self.to_data())
    }
}

/// A response that can be parsed from a raw report
pub trait HidResponse: Sized {
    /// Expected code following the prefix
    const CODE: u8;

    /// Minimum response length required
    const MIN_LEN: usize;

    /// Parse from response bytes (prefix and code already validated)
    fn from_data(data: &[u8]) -> Result<Self, ProtocolError>;

    /// Parse with validation
    fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < 2 {
            return Err(ProtocolError::TooShort {
                expected: Self::MIN_LEN,
                got: data.len(),
            });
        }
        if data[0] != PREFIX || data[1] != Self::CODE {
            return Err(ProtocolError::PrefixMismatch {
                expected: [PREFIX, Self::CODE],
                got: [data[0], data[1]],
            });
        }
        if data.len() < Self::MIN_LEN {
            return Err(ProtocolError::TooShort {
                expected: Self::MIN_LEN,
                got: data.len(),
            });
        }
        Self::from_data(data)
    }
}

/// Malformed or unexpected response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("No response from device")]
    NoResponse,

    #[error("Response too short: expected {expected} bytes, got {got}")]
    TooShort { expected: usize, got: usize },

    #[error(
        "Unexpected response header: expected {:02X} {:02X}, got {:02X} {:02X}",
        .expected[0], .expected[1], .got[0], .got[1]
    )]
    PrefixMismatch { expected: [u8; 2], got: [u8; 2] },
}

// =============================================================================
// Colors and Effects
// =============================================================================

/// RGB color, laid out exactly as the wire triplet
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, IntoBytes, FromBytes, KnownLayout, Immutable,
)]
#[repr(C)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parse `#rrggbb`, `rrggbb`, or `r,g,b`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((r, rest)) = s.split_once(',') {
            let (g, b) = rest
                .split_once(',')
                .ok_or_else(|| format!("invalid color \"{s}\": expected r,g,b"))?;
            let part = |v: &str| {
                v.trim()
                    .parse::<u8>()
                    .map_err(|e| format!("invalid color component \"{v}\": {e}"))
            };
            return Ok(Self::new(part(r)?, part(g)?, part(b)?));
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid color \"{s}\": expected #rrggbb"));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid color \"{s}\": {e}"))
        };
        Ok(Self::new(byte(0)?, byte(2)?, byte(4)?))
    }
}

/// Built-in effect modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EffectMode {
    Off = 0,
    Static = 1,
    Breathing = 2,
    Flashing = 3,
    SpectrumCycle = 4,
    Rainbow = 5,
    SpectrumCycleBreathing = 6,
    ChaseFade = 7,
    SpectrumCycleChaseFade = 8,
    Chase = 9,
    SpectrumCycleChase = 10,
    SpectrumCycleWave = 11,
    ChaseRainbowPulse = 12,
    RandomFlicker = 13,
    Music = 14,
}

impl EffectMode {
    pub const ALL: &'static [EffectMode] = &[
        Self::Off,
        Self::Static,
        Self::Breathing,
        Self::Flashing,
        Self::SpectrumCycle,
        Self::Rainbow,
        Self::SpectrumCycleBreathing,
        Self::ChaseFade,
        Self::SpectrumCycleChaseFade,
        Self::Chase,
        Self::SpectrumCycleChase,
        Self::SpectrumCycleWave,
        Self::ChaseRainbowPulse,
        Self::RandomFlicker,
        Self::Music,
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| *m as u8 == v)
    }

    /// Name as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Static => "static",
            Self::Breathing => "breathing",
            Self::Flashing => "flashing",
            Self::SpectrumCycle => "spectrum-cycle",
            Self::Rainbow => "rainbow",
            Self::SpectrumCycleBreathing => "spectrum-cycle-breathing",
            Self::ChaseFade => "chase-fade",
            Self::SpectrumCycleChaseFade => "spectrum-cycle-chase-fade",
            Self::Chase => "chase",
            Self::SpectrumCycleChase => "spectrum-cycle-chase",
            Self::SpectrumCycleWave => "spectrum-cycle-wave",
            Self::ChaseRainbowPulse => "chase-rainbow-pulse",
            Self::RandomFlicker => "random-flicker",
            Self::Music => "music",
        }
    }
}

impl FromStr for EffectMode {
    type Err = String;

    /// Accepts a mode number or its name (case-insensitive, `_` or `-`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(v) = s.parse::<u8>() {
            return Self::from_u8(v).ok_or_else(|| format!("unknown effect mode: {v}"));
        }
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| format!("unknown effect mode: \"{s}\""))
    }
}

// =============================================================================
// Commands
// =============================================================================

/// READ_CONFIG (EC B0)
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadConfig;

impl HidCommand for ReadConfig {
    const CMD: &'static [u8] = cmd::READ_CONFIG;

    fn to_data(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// SET_TOPOLOGY (EC 52 53): runtime LED count for one channel
///
/// Not range checked. Counts the firmware dislikes are silently ignored or,
/// after a commit, replaced by the device maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct SetTopology {
    pub channel: u8,
    pub count: u8,
}

impl SetTopology {
    pub fn new(channel: u8, count: u8) -> Self {
        Self { channel, count }
    }
}

impl HidCommand for SetTopology {
    const CMD: &'static [u8] = cmd::SET_TOPOLOGY;

    fn to_data(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// COMMIT (EC 3F 55): persist runtime configuration to EEPROM
#[derive(Debug, Clone, Copy, Default)]
pub struct Commit;

impl HidCommand for Commit {
    const CMD: &'static [u8] = cmd::COMMIT;

    fn to_data(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// SET_EFFECT (EC 35): `[channel] [mode] [r] [g] [b] [brightness]`
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct SetEffect {
    channel: u8,
    mode: u8,
    color: Rgb,
    brightness: u8,
}

impl SetEffect {
    pub fn new(channel: u8, mode: EffectMode, color: Rgb, brightness: u8) -> Self {
        Self::raw(channel, mode as u8, color, brightness)
    }

    /// Build with an arbitrary mode byte (firmware-specific modes)
    pub fn raw(channel: u8, mode: u8, color: Rgb, brightness: u8) -> Self {
        Self {
            channel,
            mode,
            color,
            brightness,
        }
    }
}

impl HidCommand for SetEffect {
    const CMD: &'static [u8] = cmd::SET_EFFECT;

    fn to_data(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// DIRECT_COLOR (EC 40) header: `[0x80 | channel] [offset] [count]`
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct DirectColorHeader {
    channel: u8,
    offset: u8,
    count: u8,
}

/// DIRECT_COLOR (EC 40): explicit per-LED colors
///
/// Holds at most [`channel::MAX_DIRECT_COLORS`] triplets; extra colors are
/// dropped at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDirectColors {
    pub channel: u8,
    pub offset: u8,
    colors: Vec<Rgb>,
}

impl SetDirectColors {
    pub fn new(channel: u8, offset: u8, colors: &[Rgb]) -> Self {
        let len = colors.len().min(channel::MAX_DIRECT_COLORS);
        Self {
            channel,
            offset,
            colors: colors[..len].to_vec(),
        }
    }

    /// Colors that will actually be sent
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

impl HidCommand for SetDirectColors {
    const CMD: &'static [u8] = cmd::DIRECT_COLOR;

    fn to_data(&self) -> Vec<u8> {
        let header = DirectColorHeader {
            channel: channel::DIRECT_MODE_BIT | self.channel,
            offset: self.offset,
            // bounded by MAX_DIRECT_COLORS
            count: self.colors.len() as u8,
        };
        let mut data = header.as_bytes().to_vec();
        data.extend_from_slice(self.colors.as_bytes());
        data
    }
}

// =============================================================================
// Configuration Response
// =============================================================================

/// Decoded READ_CONFIG response
///
/// Built fresh on every read; the firmware stays the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// LED count per channel
    pub led_counts: [u8; channel::COUNT],
    /// Status flag per channel
    pub status: [u8; channel::COUNT],
    /// Complete response, for fields not decoded yet
    pub raw: Vec<u8>,
}

impl ConfigSnapshot {
    /// LED count for a channel, if the channel exists
    pub fn led_count(&self, channel: u8) -> Option<u8> {
        self.led_counts.get(channel as usize).copied()
    }

    /// `(channel, count)` pairs in ascending channel order
    pub fn channels(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.led_counts
            .iter()
            .enumerate()
            .map(|(ch, &count)| (ch as u8, count))
    }
}

impl HidResponse for ConfigSnapshot {
    const CODE: u8 = cmd::CONFIG_RESPONSE;
    const MIN_LEN: usize = config_offsets::MIN_LEN;

    fn from_data(data: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self {
            led_counts: config_offsets::LED_COUNT.map(|off| data[off]),
            status: config_offsets::STATUS.map(|off| data[off]),
            raw: data.to_vec(),
        })
    }
}

impl fmt::Display for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Channel  LEDs  Status")?;
        for (ch, count) in self.channels() {
            writeln!(
                f,
                "{:>7}  {:>4}  0x{:02X}",
                ch, count, self.status[ch as usize]
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Codec entry points
// =============================================================================

/// Packet requesting the configuration table
pub fn encode_read_config() -> Packet {
    ReadConfig.build()
}

/// Decode a configuration response; `None` means the device never answered
pub fn decode_config(response: Option<&[u8]>) -> Result<ConfigSnapshot, ProtocolError> {
    ConfigSnapshot::parse(response.ok_or(ProtocolError::NoResponse)?)
}

/// Packet setting the runtime LED count of one channel
pub fn encode_set_topology(channel: u8, count: u8) -> Packet {
    SetTopology::new(channel, count).build()
}

/// Packet persisting the runtime configuration
pub fn encode_commit() -> Packet {
    Commit.build()
}

/// Packet selecting a built-in effect
pub fn encode_set_effect(channel: u8, mode: EffectMode, color: Rgb, brightness: u8) -> Packet {
    SetEffect::new(channel, mode, color, brightness).build()
}

/// Packet writing explicit colors starting at `offset`; at most 20 are kept
pub fn encode_set_direct_colors(channel: u8, offset: u8, colors: &[Rgb]) -> Packet {
    SetDirectColors::new(channel, offset, colors).build()
}
