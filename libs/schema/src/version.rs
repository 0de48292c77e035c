//! Protocol versions known to the schema
//!
//! Validators are generated once per version because member offsets, and even
//! which members exist, change between OpenFlow revisions.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OpenFlow wire version, numbered by the header's version byte
#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProtocolVersion {
    Of10 = 0x01,
    Of11 = 0x02,
    Of12 = 0x03,
    Of13 = 0x04,
}

impl ProtocolVersion {
    /// Every known version in wire order
    pub const ALL: [ProtocolVersion; 4] = [
        ProtocolVersion::Of10,
        ProtocolVersion::Of11,
        ProtocolVersion::Of12,
        ProtocolVersion::Of13,
    ];

    /// Version byte as carried in the message header
    pub fn wire(self) -> u8 {
        self.into()
    }

    /// Dense index, usable for per-version tables
    pub fn index(self) -> usize {
        self.wire() as usize - 1
    }

    /// Human readable name ("1.0", "1.3", ...)
    pub fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Of10 => "1.0",
            ProtocolVersion::Of11 => "1.1",
            ProtocolVersion::Of12 => "1.2",
            ProtocolVersion::Of13 => "1.3",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OF{}", self.name())
    }
}
