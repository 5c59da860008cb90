//! Shaper handles and the scope registry.
//!
//! Every shaper node on a device is addressed by a [`Handle`], a `(scope, id)` pair. Scopes form
//! a strict hierarchy:
//!
//! ```text
//!                 ┌──────────────┐
//!                 │   Port (0)   │
//!                 └──────┬───────┘
//!                        │
//!                 ┌──────▼───────┐
//!                 │  Netdev (0)  │
//!                 └──┬────────┬──┘
//!                    │        │
//!       ┌────────────▼──┐   ┌─▼──────────────┐
//!       │ DetachedGroup │   │   Queue (N)    │
//!       └───────┬───────┘   └────────────────┘
//!               │
//!       ┌───────▼───────┐
//!       │   Queue (N)   │  (requires `support-nesting`)
//!       └───────────────┘
//! ```
//!
//! The rules of this tree live in [`Scope::default_parent`] and [`Scope::is_valid_parent`]. They
//! are pure functions of the scopes involved and are consulted by the validator only.

use std::fmt;

/// The hierarchy level a shaper node lives at.
///
/// The declaration order is the canonical enumeration order: dumps of shapers and capabilities
/// are sorted by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// The root shaper for the whole hardware port. Singleton.
    Port,
    /// The main shaper of the network device. Singleton.
    Netdev,
    /// A dynamically created group regrouping a subset of queues.
    DetachedGroup,
    /// The shaper attached to a single transmit queue.
    Queue,
}

impl Scope {
    /// All scopes, in enumeration order.
    pub const ALL: [Self; 4] = [Self::Port, Self::Netdev, Self::DetachedGroup, Self::Queue];

    /// Returns the canonical lowercase name of the scope.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Port => "port",
            Self::Netdev => "netdev",
            Self::DetachedGroup => "detached",
            Self::Queue => "queue",
        }
    }

    /// Returns `true` for scopes that hold exactly one node, with id `0`.
    pub const fn is_singleton(self) -> bool {
        matches!(self, Self::Port | Self::Netdev)
    }

    /// The implicit parent of a node in this scope when the caller doesn't name one.
    ///
    /// `Port` is the root of the hierarchy and has no parent.
    pub const fn default_parent(self) -> Option<Handle> {
        match self {
            Self::Port => None,
            Self::Netdev => Some(Handle::PORT),
            Self::DetachedGroup | Self::Queue => Some(Handle::NETDEV),
        }
    }

    /// Whether a node in `parent` scope may directly parent a node in `child` scope.
    pub const fn is_valid_parent(parent: Self, child: Self) -> bool {
        matches!(
            (parent, child),
            (Self::Port, Self::Netdev) |
                (Self::Netdev, Self::Queue) |
                (Self::Netdev, Self::DetachedGroup) |
                (Self::DetachedGroup, Self::Queue)
        )
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniquely identifies a shaper node within a device.
///
/// Handles order by scope first, then by id, which is the order used by dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    /// The scope of the node.
    pub scope: Scope,
    /// The index of the node within its scope, e.g. the queue number.
    pub id: u32,
}

impl Handle {
    /// The port singleton.
    pub const PORT: Self = Self::new(Scope::Port, 0);
    /// The netdev singleton.
    pub const NETDEV: Self = Self::new(Scope::Netdev, 0);

    /// Create a new handle.
    pub const fn new(scope: Scope, id: u32) -> Self {
        Self { scope, id }
    }

    /// Shorthand for a queue handle.
    pub const fn queue(id: u32) -> Self {
        Self::new(Scope::Queue, id)
    }

    /// Shorthand for a detached group handle.
    pub const fn group(id: u32) -> Self {
        Self::new(Scope::DetachedGroup, id)
    }

    /// The implicit parent of this handle, see [`Scope::default_parent`].
    pub const fn default_parent(&self) -> Option<Self> {
        self.scope.default_parent()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.id)
    }
}
