use std::sync::atomic::{AtomicUsize, Ordering};

/// Mutation statistics for a device. Shared between the engine and any observer.
#[derive(Debug, Default)]
pub struct DeviceStats {
    /// Successful `set` and `delete` calls.
    commits: AtomicUsize,
    /// `set` and `delete` calls rejected by validation or by the driver.
    rejections: AtomicUsize,
    /// Total shapers created or replaced.
    modified: AtomicUsize,
    /// Total shapers removed.
    removed: AtomicUsize,
}

impl DeviceStats {
    #[inline]
    pub(crate) fn record_set(&self, modified: usize) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.modified.fetch_add(modified, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delete(&self, removed: usize) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.removed.fetch_add(removed, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejections(&self) -> usize {
        self.rejections.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn modified(&self) -> usize {
        self.modified.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn removed(&self) -> usize {
        self.removed.load(Ordering::Relaxed)
    }
}
