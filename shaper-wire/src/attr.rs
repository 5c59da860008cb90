//! Attribute and command identifiers of the shaper family.
//!
//! Every attribute set reserves `0` as unspecified.

/// Commands, one per request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Get = 1,
    Set = 2,
    Delete = 3,
    CapGet = 4,
}

impl Command {
    /// Returns the command name, as used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Delete => "delete",
            Self::CapGet => "cap-get",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Get),
            2 => Ok(Self::Set),
            3 => Ok(Self::Delete),
            4 => Ok(Self::CapGet),
            other => Err(other),
        }
    }
}

/// Top-level shaper attributes.
pub mod shaper {
    /// Nested [`handle`] of the shaper.
    pub const HANDLE: u16 = 1;
    /// `u32`, one of [`metric`](super::metric).
    pub const METRIC: u16 = 2;
    /// `uint`, in units of `METRIC`.
    pub const BW_MIN: u16 = 3;
    /// `uint`, in units of `METRIC`.
    pub const BW_MAX: u16 = 4;
    /// `uint`, in bytes.
    pub const BURST: u16 = 5;
    /// `u32`.
    pub const PRIORITY: u16 = 6;
    /// `u32`.
    pub const WEIGHT: u16 = 7;
    /// `u32`, the target device.
    pub const IFINDEX: u16 = 8;
    /// Nested [`handle`] of the parent.
    pub const PARENT: u16 = 9;
    /// Nested shaper description, repeated once per node of a set batch.
    pub const SHAPERS: u16 = 10;
    /// Nested handle, repeated once per entry of a delete batch.
    pub const HANDLES: u16 = 11;
    /// `u32`, number of shapers touched by a set or delete.
    pub const MODIFIED: u16 = 12;
}

/// Attributes nested in `HANDLE`, `PARENT` and `HANDLES`.
pub mod handle {
    /// `u32`, one of [`scope`](super::scope).
    pub const SCOPE: u16 = 1;
    /// `u32`. Absent means `0`.
    pub const ID: u16 = 2;
}

/// Capability reply attributes.
pub mod caps {
    /// `u32`, the queried device.
    pub const IFINDEX: u16 = 1;
    /// `u32`, the scope the flags apply to.
    pub const SCOPE: u16 = 2;
    /// First `support-*` flag. Flags follow in [`::shaper::Capability::ALL`] order.
    pub const SUPPORT_METRIC_BPS: u16 = 3;
    pub const SUPPORT_METRIC_PPS: u16 = 4;
    pub const SUPPORT_NESTING: u16 = 5;
    pub const SUPPORT_BW_MIN: u16 = 6;
    pub const SUPPORT_BW_MAX: u16 = 7;
    pub const SUPPORT_BURST: u16 = 8;
    pub const SUPPORT_PRIORITY: u16 = 9;
    pub const SUPPORT_WEIGHT: u16 = 10;
}

/// Scope values carried by `handle::SCOPE` and `caps::SCOPE`.
pub mod scope {
    /// Never valid on the wire.
    pub const UNSPEC: u32 = 0;
    pub const PORT: u32 = 1;
    pub const NETDEV: u32 = 2;
    pub const DETACHED: u32 = 3;
    pub const QUEUE: u32 = 4;
}

/// Metric values carried by `shaper::METRIC`.
pub mod metric {
    /// Bits per second.
    pub const BPS: u32 = 0;
    /// Packets per second.
    pub const PPS: u32 = 1;
}
