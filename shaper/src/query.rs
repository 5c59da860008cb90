use crate::{
    caps::CapabilitySet,
    device::Device,
    error::Result,
    handle::{Handle, Scope},
    node::ShaperNode,
};

impl Device {
    /// Look up a single shaper.
    ///
    /// A scope the device doesn't implement fails with `Unsupported` before the store is
    /// consulted, so an absent handle in such a scope is never reported as `NotFound`.
    pub(crate) fn get(&self, handle: &Handle) -> Result<ShaperNode> {
        self.caps.capabilities(self.ifindex, handle.scope)?;
        self.read_tree()?.get(handle)
    }

    /// All shapers of the device, ordered by `(scope, id)`.
    pub(crate) fn dump(&self) -> Result<Vec<ShaperNode>> {
        self.ensure_supported()?;
        Ok(self.read_tree()?.dump())
    }

    pub(crate) fn cap_get(&self, scope: Scope) -> Result<CapabilitySet> {
        self.ensure_supported()?;
        self.caps.capabilities(self.ifindex, scope)
    }

    pub(crate) fn cap_dump(&self) -> Result<Vec<(Scope, CapabilitySet)>> {
        self.caps.dump(self.ifindex)
    }
}
