//! Wire format of the shaper family: netlink-style TLV attributes carrying the typed requests
//! and replies of [`shaper`].
//!
//! [`dispatch`] ties the codec to a [`ShaperEngine`]: it decodes a [`Message`], runs it, and
//! encodes the reply payloads.

use bytes::Bytes;
use netlink_packet_core::DecodeError;
use thiserror::Error;

use shaper::ShaperEngine;

pub mod attr;
mod codec;
pub mod nla;

pub use attr::Command;
pub use codec::{
    Message, decode_capabilities, decode_modified, decode_request, decode_shaper, encode_request,
    encode_response,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An attribute header doesn't fit the buffer.
    #[error("malformed attribute: {0}")]
    Decode(String),
    /// An attribute value has the wrong size for its type.
    #[error("malformed {attr}: {reason}")]
    Malformed { attr: &'static str, reason: String },
    /// A required attribute is absent.
    #[error("missing attribute {0}")]
    Missing(&'static str),
    /// An enumerated attribute holds an unknown value.
    #[error("invalid {attr} value {value}")]
    Invalid { attr: &'static str, value: u64 },
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<Error> for shaper::Error {
    fn from(e: Error) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Decode `msg`, run it against `engine` and encode the reply.
///
/// Malformed messages are reported as [`shaper::Error::InvalidArgument`].
pub fn dispatch(engine: &ShaperEngine, msg: &Message) -> shaper::Result<Vec<Bytes>> {
    let request = decode_request(msg)
        .inspect_err(|e| tracing::debug!(?e, command = msg.command.as_str(), "malformed request"))?;

    let ifindex = request.ifindex();
    let response = engine.handle(request)?;

    Ok(encode_response(ifindex, &response))
}
