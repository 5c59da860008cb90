//! Per-device shaping state.
//!
//! A [`Device`] is created when a device attaches shaping support and dropped on detach, taking
//! its whole shaper tree with it. The capability table is captured from the driver at creation
//! and never changes afterwards, so it is read without locking. The tree sits behind a single
//! read-write lock: mutations hold the write side across validate, driver apply and commit, so
//! that a validated batch can never be invalidated by a concurrent writer.
//!
//! A caller may still hold the device after it has been detached. The detached mark lives under
//! the same lock as the tree, so such a caller fails instead of writing into a dropped tree.

use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::{
    caps::CapabilityTable,
    driver::ShaperOps,
    error::{Error, Result},
    node::ShaperNode,
    options::EngineOptions,
    stats::DeviceStats,
    store::ShaperStore,
    validate::Validator,
};

#[derive(Debug, Default)]
struct Tree {
    shapers: ShaperStore,
    /// Set once by [`Device::flush`].
    detached: bool,
}

pub(crate) struct Device {
    pub(crate) ifindex: u32,
    pub(crate) queue_count: u32,
    pub(crate) caps: CapabilityTable,
    pub(crate) driver: Arc<dyn ShaperOps>,
    tree: RwLock<Tree>,
    pub(crate) stats: Arc<DeviceStats>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("ifindex", &self.ifindex)
            .field("queue_count", &self.queue_count)
            .field("caps", &self.caps)
            .field("shapers", &self.tree.read().shapers.len())
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Create the shaping state of a device, asking the driver for its capabilities.
    pub(crate) fn new(ifindex: u32, queue_count: u32, driver: Arc<dyn ShaperOps>) -> Self {
        let caps = CapabilityTable::from_fn(|scope| driver.capabilities(scope));

        Self {
            ifindex,
            queue_count,
            caps,
            driver,
            tree: RwLock::default(),
            stats: Arc::default(),
        }
    }

    /// Fails with [`Error::Unsupported`] if the device implements no shaping scope at all.
    pub(crate) fn ensure_supported(&self) -> Result<()> {
        if self.caps.supports_shaping() {
            Ok(())
        } else {
            Err(Error::unsupported(format!("device {} does not support shaping", self.ifindex)))
        }
    }

    /// Validate, apply and commit a batch of shapers. Returns the number of modified shapers.
    pub(crate) fn set(&self, shapers: &[ShaperNode], options: &EngineOptions) -> Result<usize> {
        self.ensure_supported()?;

        let mut tree = self.write_tree()?;

        let resolved = Validator {
            ifindex: self.ifindex,
            queue_count: self.queue_count,
            caps: &self.caps,
            store: &tree,
            options,
        }
        .validate(shapers)?;

        if resolved.is_empty() {
            return Ok(0);
        }

        self.driver
            .apply(self.ifindex, &resolved)
            .inspect_err(|e| tracing::debug!(?e, "driver rejected shapers"))?;

        for node in &resolved {
            tree.upsert(*node);
        }

        tracing::debug!(modified = resolved.len(), total = tree.len(), "shapers committed");
        Ok(resolved.len())
    }

    /// Read access to the tree, unless the device has been detached.
    pub(crate) fn read_tree(&self) -> Result<MappedRwLockReadGuard<'_, ShaperStore>> {
        let tree = self.tree.read();
        if tree.detached {
            return Err(Error::unknown_device(self.ifindex));
        }

        Ok(RwLockReadGuard::map(tree, |tree| &tree.shapers))
    }

    /// Write access to the tree, unless the device has been detached.
    pub(crate) fn write_tree(&self) -> Result<MappedRwLockWriteGuard<'_, ShaperStore>> {
        let tree = self.tree.write();
        if tree.detached {
            return Err(Error::unknown_device(self.ifindex));
        }

        Ok(RwLockWriteGuard::map(tree, |tree| &mut tree.shapers))
    }

    /// Drop every shaper and mark the device detached. Returns how many shapers there were.
    pub(crate) fn flush(&self) -> usize {
        let mut tree = self.tree.write();
        tree.detached = true;

        let count = tree.shapers.len();
        tree.shapers.clear();
        count
    }
}
