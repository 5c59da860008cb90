use std::collections::BTreeSet;

use crate::{
    device::Device,
    error::{Error, Result},
    handle::Handle,
    options::EngineOptions,
};

impl Device {
    /// Remove a batch of shapers. Returns the number of shapers actually removed.
    ///
    /// Handles without a shaper are skipped: deleting something that doesn't exist is not an
    /// error. A shaper can only go away together with all of its children; if any child is left
    /// out of the batch, nothing is removed.
    pub(crate) fn delete(&self, handles: &[Handle], options: &EngineOptions) -> Result<usize> {
        self.ensure_supported()?;

        if handles.len() > options.max_batch_size {
            return Err(Error::invalid(format!(
                "batch of {} handles exceeds the limit of {}",
                handles.len(),
                options.max_batch_size
            )));
        }

        let mut tree = self.write_tree()?;

        // Ordered by (scope, id), which also collapses duplicates.
        let present = handles.iter().copied().filter(|h| tree.contains(h)).collect::<BTreeSet<_>>();
        tracing::debug!(requested = handles.len(), present = present.len(), "deleting shapers");

        for handle in &present {
            let orphans = tree
                .children_of(handle)
                .filter(|child| !present.contains(child))
                .collect::<Vec<_>>();
            if !orphans.is_empty() {
                return Err(Error::HasChildren { handle: *handle, children: orphans });
            }
        }

        if present.is_empty() {
            return Ok(0);
        }

        // Children always live in a deeper scope than their parent, so walking the set backwards
        // removes every child before its parent.
        let order = present.into_iter().rev().collect::<Vec<_>>();

        self.driver
            .remove(self.ifindex, &order)
            .inspect_err(|e| tracing::debug!(?e, "driver rejected removal"))?;

        for handle in &order {
            tree.remove(handle);
        }

        Ok(order.len())
    }
}
