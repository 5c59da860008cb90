//! Batch validation for `set` requests.
//!
//! Every check that can reject a mutation lives here, so that the apply path can assume a
//! consistent batch. Validation runs under the device's write lock against the committed tree,
//! and is all-or-nothing: the first failing node rejects the whole batch.

use std::collections::BTreeMap;

use crate::{
    caps::{Capability, CapabilitySet, CapabilityTable},
    error::{Error, Result},
    handle::{Handle, Scope},
    node::{Metric, ShaperNode},
    options::EngineOptions,
    store::ShaperStore,
};

/// Validates proposed batches for one device.
#[derive(Debug)]
pub(crate) struct Validator<'a> {
    pub(crate) ifindex: u32,
    pub(crate) queue_count: u32,
    pub(crate) caps: &'a CapabilityTable,
    pub(crate) store: &'a ShaperStore,
    pub(crate) options: &'a EngineOptions,
}

impl Validator<'_> {
    /// Validate `batch` and return it with every parent resolved, in batch order.
    pub(crate) fn validate(&self, batch: &[ShaperNode]) -> Result<Vec<ShaperNode>> {
        if batch.len() > self.options.max_batch_size {
            return Err(Error::invalid(format!(
                "batch of {} shapers exceeds the limit of {}",
                batch.len(),
                self.options.max_batch_size
            )));
        }

        // Nodes accepted so far. Later nodes may use them as parents.
        let mut staged = BTreeMap::new();
        let mut resolved = Vec::with_capacity(batch.len());

        for node in batch {
            if staged.contains_key(&node.handle) {
                return Err(Error::invalid(format!("duplicate shaper {} in batch", node.handle)));
            }

            let node = self.validate_one(node, &staged)?;
            staged.insert(node.handle, node);
            resolved.push(node);
        }

        let new_groups = staged
            .keys()
            .filter(|handle| handle.scope == Scope::DetachedGroup && !self.store.contains(handle))
            .count();
        let groups = self.store.count(Scope::DetachedGroup) + new_groups;
        if groups > self.options.max_detached_groups {
            return Err(Error::invalid(format!(
                "device {} would hold {groups} detached groups, limit is {}",
                self.ifindex, self.options.max_detached_groups
            )));
        }

        Ok(resolved)
    }

    fn validate_one(
        &self,
        node: &ShaperNode,
        staged: &BTreeMap<Handle, ShaperNode>,
    ) -> Result<ShaperNode> {
        self.check_handle(&node.handle)?;
        let caps = self.caps.capabilities(self.ifindex, node.scope())?;

        let parent = match (node.scope(), node.parent) {
            (Scope::Port, None) => None,
            (Scope::Port, Some(parent)) => {
                return Err(Error::invalid(format!("port shaper can't have parent {parent}")));
            }
            _ => {
                let parent = node.effective_parent();
                if let Some(parent) = parent {
                    self.check_parent(node.handle, parent, caps, staged)?;
                }
                parent
            }
        };

        self.check_attributes(node, caps)?;

        Ok(ShaperNode { parent, ..*node })
    }

    fn check_handle(&self, handle: &Handle) -> Result<()> {
        if handle.scope.is_singleton() && handle.id != 0 {
            return Err(Error::invalid(format!(
                "{} shaper must have id 0, got {}",
                handle.scope, handle.id
            )));
        }

        if handle.scope == Scope::Queue && handle.id >= self.queue_count {
            return Err(Error::invalid(format!(
                "queue {} out of range, device {} has {} queues",
                handle.id, self.ifindex, self.queue_count
            )));
        }

        Ok(())
    }

    fn check_parent(
        &self,
        child: Handle,
        parent: Handle,
        caps: CapabilitySet,
        staged: &BTreeMap<Handle, ShaperNode>,
    ) -> Result<()> {
        self.check_handle(&parent)?;

        if !Scope::is_valid_parent(parent.scope, child.scope) {
            return Err(Error::invalid(format!(
                "{} shaper can't be parent of {} shaper {child}",
                parent.scope, child.scope
            )));
        }

        if parent.scope == Scope::DetachedGroup && !caps.contains(Capability::Nesting) {
            return Err(Error::unsupported(format!(
                "{} shapers of device {} can't be nested under {parent}: missing {}",
                child.scope,
                self.ifindex,
                Capability::Nesting
            )));
        }

        let exists = child.default_parent() == Some(parent) ||
            self.store.contains(&parent) ||
            staged.contains_key(&parent);
        if !exists {
            return Err(Error::invalid(format!("parent {parent} of {child} does not exist")));
        }

        Ok(())
    }

    fn check_attributes(&self, node: &ShaperNode, caps: CapabilitySet) -> Result<()> {
        let missing = required_capabilities(node).find(|cap| !caps.contains(*cap));

        match missing {
            Some(cap) => Err(Error::unsupported(format!(
                "{} shaper {} of device {}: missing {cap}",
                node.scope(),
                node.handle,
                self.ifindex
            ))),
            None => Ok(()),
        }
    }
}

/// The capabilities needed by the attributes `node` sets.
fn required_capabilities(node: &ShaperNode) -> impl Iterator<Item = Capability> {
    [
        (node.bw_min != 0, Capability::BwMin),
        (node.bw_max != 0, Capability::BwMax),
        (node.burst != 0, Capability::Burst),
        (node.priority != 0, Capability::Priority),
        (node.weight != 0, Capability::Weight),
        (node.metric != Metric::default(), Capability::MetricPps),
    ]
    .into_iter()
    .filter_map(|(set, cap)| set.then_some(cap))
}
