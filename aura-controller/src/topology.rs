//! Per-channel LED count configuration

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use aura_transport::protocol::channel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected topology
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("topology must name at least one channel")]
    Empty,

    #[error("channel {0} does not exist (controller has {max} channels)", max = channel::COUNT)]
    UnknownChannel(u8),

    #[error("channel {channel}: LED count {count} out of range (1-{max})", max = channel::MAX_LEDS)]
    CountOutOfRange { channel: u8, count: u8 },

    #[error("channel {0} listed more than once")]
    DuplicateChannel(u8),

    #[error("every channel set to zero LEDs; this bricks the controller")]
    AllZero,

    #[error("invalid topology entry \"{0}\": expected channel=count")]
    Syntax(String),
}

/// Desired LED count per channel
///
/// Iterates in ascending channel order, which is also the order topology
/// packets go out in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u8>", into = "BTreeMap<String, u8>")]
pub struct Topology {
    counts: BTreeMap<u8, u8>,
}

impl Topology {
    /// LED count the firmware ships with on a single channel
    pub const DEFAULT_CHANNEL_LEDS: u8 = 15;

    /// Validate and build a topology
    pub fn new(counts: impl IntoIterator<Item = (u8, u8)>) -> Result<Self, TopologyError> {
        let mut map = BTreeMap::new();
        for (ch, count) in counts {
            if map.insert(ch, count).is_some() {
                return Err(TopologyError::DuplicateChannel(ch));
            }
        }
        let counts = map;
        if counts.is_empty() {
            return Err(TopologyError::Empty);
        }
        if counts.values().all(|&c| c == 0) {
            return Err(TopologyError::AllZero);
        }
        for (&ch, &count) in &counts {
            if ch as usize >= channel::COUNT {
                return Err(TopologyError::UnknownChannel(ch));
            }
            if count == 0 || count > channel::MAX_LEDS {
                return Err(TopologyError::CountOutOfRange { channel: ch, count });
            }
        }
        Ok(Self { counts })
    }

    /// `(channel, count)` pairs in ascending channel order
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.counts.iter().map(|(&ch, &count)| (ch, count))
    }

    /// LED count declared for a channel
    pub fn count(&self, channel: u8) -> Option<u8> {
        self.counts.get(&channel).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Default for Topology {
    /// Two stock 15-LED headers plus a 16-LED strip on channel 2
    fn default() -> Self {
        Self {
            counts: BTreeMap::from([(0, 15), (1, 15), (2, 16)]),
        }
    }
}

impl FromStr for Topology {
    type Err = TopologyError;

    /// Parse `0=15,1=15,2=16`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut counts = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (ch, count) = entry
                .split_once('=')
                .ok_or_else(|| TopologyError::Syntax(entry.to_string()))?;
            let ch = ch
                .trim()
                .parse::<u8>()
                .map_err(|_| TopologyError::Syntax(entry.to_string()))?;
            let count = count
                .trim()
                .parse::<u8>()
                .map_err(|_| TopologyError::Syntax(entry.to_string()))?;
            counts.push((ch, count));
        }
        Self::new(counts)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(ch, n)| format!("{ch}={n}")).collect();
        f.write_str(&parts.join(","))
    }
}

impl TryFrom<BTreeMap<String, u8>> for Topology {
    type Error = TopologyError;

    fn try_from(map: BTreeMap<String, u8>) -> Result<Self, Self::Error> {
        let counts = map
            .into_iter()
            .map(|(ch, count)| {
                ch.trim()
                    .parse::<u8>()
                    .map(|ch| (ch, count))
                    .map_err(|_| TopologyError::Syntax(format!("{ch}={count}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(counts)
    }
}

impl From<Topology> for BTreeMap<String, u8> {
    fn from(topology: Topology) -> Self {
        topology
            .counts
            .into_iter()
            .map(|(ch, count)| (ch.to_string(), count))
            .collect()
    }
}
