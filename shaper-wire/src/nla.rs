//! Netlink attribute building and parsing.
//!
//! Netlink uses a TLV (Type-Length-Value) format for attributes:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Length (2 bytes) │  Type (2 bytes)     │  <- NLA header (4 bytes)
//! ├─────────────────────────────────────────┤
//! │  Value (variable length, padded to 4)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Integers are in native endianness. Nested attributes carry a sequence of attributes as their
//! value and have `NLA_F_NESTED` set in their type. Framing and parsing come from
//! `netlink-packet-core`; this module only adds the attribute shapes the shaper family uses.
//!
//! Reference: <linux/netlink.h>

use bytes::BytesMut;
use netlink_packet_core::{
    parse_u32, parse_u64, DecodeError, Emitable, Nla, NlaBuffer, NlasIterator,
};

use crate::{Error, Result};

/// A parsed attribute, borrowing its value from the message buffer.
pub type NlaRef<'a> = NlaBuffer<&'a [u8]>;

/// An attribute to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// A fixed-width `u32`.
    U32(u16, u32),
    /// A `uint`, emitted as 8 bytes.
    U64(u16, u64),
    /// No value: presence is the information.
    Flag(u16),
    /// A sequence of attributes, emitted with `NLA_F_NESTED` set.
    Nested(u16, Vec<Attribute>),
}

impl Nla for Attribute {
    fn value_len(&self) -> usize {
        match self {
            Self::U32(..) => 4,
            Self::U64(..) => 8,
            Self::Flag(_) => 0,
            Self::Nested(_, attrs) => attrs.iter().map(Emitable::buffer_len).sum(),
        }
    }

    fn kind(&self) -> u16 {
        match self {
            Self::U32(kind, _) | Self::U64(kind, _) | Self::Flag(kind) | Self::Nested(kind, _) => {
                *kind
            }
        }
    }

    fn emit_value(&self, buffer: &mut [u8]) {
        match self {
            Self::U32(_, value) => buffer[..4].copy_from_slice(&value.to_ne_bytes()),
            Self::U64(_, value) => buffer[..8].copy_from_slice(&value.to_ne_bytes()),
            Self::Flag(_) => {}
            Self::Nested(_, attrs) => emit_into(attrs, buffer),
        }
    }

    fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(..))
    }
}

/// Emit `attrs` back to back, each padded to 4 bytes.
pub fn emit(attrs: &[Attribute]) -> BytesMut {
    let len = attrs.iter().map(Emitable::buffer_len).sum();
    let mut buf = BytesMut::zeroed(len);
    emit_into(attrs, &mut buf);
    buf
}

fn emit_into(attrs: &[Attribute], buffer: &mut [u8]) {
    let mut offset = 0;
    for attr in attrs {
        let len = attr.buffer_len();
        attr.emit(&mut buffer[offset..offset + len]);
        offset += len;
    }
}

/// Iterate over the attributes of `buf`. Stops after the first malformed header.
pub fn parse(buf: &[u8]) -> impl Iterator<Item = Result<NlaRef<'_>>> {
    NlasIterator::new(buf).map(|nla| nla.map_err(Error::from))
}

/// A fixed-width `u32` value. `attr` names the attribute in errors.
pub fn u32_value(nla: &NlaRef<'_>, attr: &'static str) -> Result<u32> {
    parse_u32(nla.value()).map_err(|e| malformed(attr, e))
}

/// A variable-width unsigned integer, 4 or 8 bytes long.
pub fn uint_value(nla: &NlaRef<'_>, attr: &'static str) -> Result<u64> {
    match nla.value().len() {
        4 => u32_value(nla, attr).map(u64::from),
        _ => parse_u64(nla.value()).map_err(|e| malformed(attr, e)),
    }
}

fn malformed(attr: &'static str, e: DecodeError) -> Error {
    Error::Malformed { attr, reason: e.to_string() }
}
