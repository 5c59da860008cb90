use thiserror::Error;

use crate::handle::Handle;

/// The errors returned by the shaper engine.
///
/// The set of variants is closed: callers branch on the kind. [`Error::Unsupported`] in
/// particular means "feature absent" rather than "request malformed", and callers may choose to
/// skip dependent behavior when they see it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The device, the scope or a requested attribute is not implemented by the data path.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// No shaper exists for the handle.
    #[error("shaper not found: {0}")]
    NotFound(Handle),
    /// Malformed request or hierarchy.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The shaper still has children that are not part of the same delete batch.
    #[error("shaper {handle} still has children: {children:?}")]
    HasChildren { handle: Handle, children: Vec<Handle> },
}

impl Error {
    /// An [`Error::Unsupported`] with the given reason.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// An [`Error::InvalidArgument`] with the given reason.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// The error for an ifindex with no attached device.
    pub(crate) fn unknown_device(ifindex: u32) -> Self {
        Self::invalid(format!("device {ifindex} not found"))
    }

    /// Returns `true` if the feature is absent rather than the request wrong.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Returns `true` if the shaper doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
