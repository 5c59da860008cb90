//! The seam between the engine and the data path that enforces shaping.
//!
//! The engine never schedules packets itself. It asks the driver which attributes each scope
//! supports (once, at attach time), and hands every validated batch to the driver before
//! committing it. A driver error aborts the request and leaves the shaper tree untouched.

use crate::{
    caps::{CapabilitySet, CapabilityTable},
    error::Result,
    handle::{Handle, Scope},
    node::ShaperNode,
};

/// Operations implemented by a device's shaping data path.
pub trait ShaperOps: Send + Sync + 'static {
    /// The capabilities of `scope`, or `None` if the device doesn't shape at that level.
    fn capabilities(&self, scope: Scope) -> Option<CapabilitySet>;

    /// Apply a validated batch. Every node has its parent resolved.
    ///
    /// Returning an error rejects the whole batch.
    fn apply(&self, ifindex: u32, shapers: &[ShaperNode]) -> Result<()>;

    /// Remove the given shapers, children before parents.
    fn remove(&self, ifindex: u32, handles: &[Handle]) -> Result<()>;
}

/// A driver with a fixed capability table that acknowledges every request.
///
/// Useful for devices whose data path is programmed out of band, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDriver {
    caps: CapabilityTable,
}

impl StaticDriver {
    pub fn new(caps: CapabilityTable) -> Self {
        Self { caps }
    }

    /// A driver supporting every attribute on every scope.
    pub fn full() -> Self {
        Self::new(CapabilityTable::from_fn(|_| Some(CapabilitySet::all())))
    }
}

impl ShaperOps for StaticDriver {
    fn capabilities(&self, scope: Scope) -> Option<CapabilitySet> {
        self.caps.get(scope)
    }

    fn apply(&self, ifindex: u32, shapers: &[ShaperNode]) -> Result<()> {
        tracing::trace!(ifindex, count = shapers.len(), "static driver apply");
        Ok(())
    }

    fn remove(&self, ifindex: u32, handles: &[Handle]) -> Result<()> {
        tracing::trace!(ifindex, count = handles.len(), "static driver remove");
        Ok(())
    }
}
