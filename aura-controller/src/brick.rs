//! Brick detection heuristic
//!
//! Best effort only. The two patterns below are the ones seen after the
//! controller stopped driving its strips; a snapshot that matches neither can
//! still belong to a misbehaving device. In particular a single degraded
//! channel (e.g. `{15, 15, 9}`) is reported healthy.

use std::fmt;

use aura_transport::ConfigSnapshot;

use crate::topology::Topology;

/// Channel whose count drops first when the controller bricks
pub const REFERENCE_CHANNEL: u8 = 2;

/// Minimum LED count on [`REFERENCE_CHANNEL`] after a successful recovery
pub const REFERENCE_MIN_LEDS: u8 = 16;

/// Outcome of the heuristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrickVerdict {
    /// No known brick pattern
    Healthy,
    /// A channel reports zero LEDs
    ZeroChannel(u8),
    /// Every channel reports the same, non-default count
    UniformReset(u8),
    /// The configuration could not be read
    Unreadable(String),
}

impl BrickVerdict {
    pub fn is_bricked(&self) -> bool {
        !matches!(self, Self::Healthy)
    }
}

impl fmt::Display for BrickVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "no brick pattern detected"),
            Self::ZeroChannel(ch) => write!(f, "channel {ch} reports zero LEDs"),
            Self::UniformReset(n) => write!(
                f,
                "all channels report {n} LEDs (expected {}); looks like a whole-device reset",
                Topology::DEFAULT_CHANNEL_LEDS
            ),
            Self::Unreadable(e) => write!(f, "configuration unreadable ({e}); assuming bricked"),
        }
    }
}

/// Classify a configuration snapshot
pub fn classify_brick(snapshot: &ConfigSnapshot) -> BrickVerdict {
    if let Some((ch, _)) = snapshot.channels().find(|&(_, count)| count == 0) {
        return BrickVerdict::ZeroChannel(ch);
    }

    let first = snapshot.led_counts[0];
    if snapshot.led_counts.iter().all(|&c| c == first) && first != Topology::DEFAULT_CHANNEL_LEDS
    {
        return BrickVerdict::UniformReset(first);
    }

    BrickVerdict::Healthy
}

/// Whether a post-recovery snapshot shows the reference channel restored
pub fn recovery_verified(snapshot: &ConfigSnapshot) -> bool {
    snapshot
        .led_count(REFERENCE_CHANNEL)
        .is_some_and(|n| n >= REFERENCE_MIN_LEDS)
}
