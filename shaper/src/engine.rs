use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{
    caps::CapabilitySet,
    device::Device,
    driver::ShaperOps,
    error::{Error, Result},
    handle::{Handle, Scope},
    node::ShaperNode,
    options::EngineOptions,
    request::{CapGetRequest, DeleteRequest, GetRequest, Request, Response, SetRequest},
    stats::DeviceStats,
};

/// The shaper control plane.
///
/// The engine owns the shaping state of every attached device. Devices are fully independent:
/// each one has its own shaper tree behind its own lock, and the registry lock is only held long
/// enough to find the device.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use shaper::{Handle, ShaperEngine, ShaperNode, StaticDriver};
///
/// let engine = ShaperEngine::default();
/// engine.attach(3, 4, Arc::new(StaticDriver::full())).unwrap();
///
/// engine.set(3, &[ShaperNode::new(Handle::queue(1)).with_bw_min(10_000)]).unwrap();
///
/// let node = engine.get(3, Handle::queue(1)).unwrap();
/// assert_eq!(node.parent, Some(Handle::NETDEV));
/// ```
#[derive(Debug, Default)]
pub struct ShaperEngine {
    devices: RwLock<FxHashMap<u32, Arc<Device>>>,
    options: EngineOptions,
}

impl ShaperEngine {
    /// An engine with no attached devices.
    pub fn new(options: EngineOptions) -> Self {
        Self { devices: RwLock::default(), options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Attach shaping support for a device with `queue_count` transmit queues.
    ///
    /// The driver's capabilities are read once, here. Attaching an `ifindex` twice fails.
    pub fn attach(&self, ifindex: u32, queue_count: u32, driver: Arc<dyn ShaperOps>) -> Result<()> {
        let mut devices = self.devices.write();
        if devices.contains_key(&ifindex) {
            return Err(Error::invalid(format!("device {ifindex} already attached")));
        }

        let device = Device::new(ifindex, queue_count, driver);
        tracing::debug!(ifindex, queue_count, caps = ?device.caps, "device attached");

        devices.insert(ifindex, Arc::new(device));
        Ok(())
    }

    /// Detach a device, destroying its whole shaper tree. Returns the number of dropped shapers.
    pub fn detach(&self, ifindex: u32) -> Result<usize> {
        let device =
            self.devices.write().remove(&ifindex).ok_or_else(|| Error::unknown_device(ifindex))?;
        let flushed = device.flush();

        tracing::debug!(ifindex, flushed, "device detached");
        Ok(flushed)
    }

    /// Whether `ifindex` is currently attached.
    pub fn is_attached(&self, ifindex: u32) -> bool {
        self.devices.read().contains_key(&ifindex)
    }

    fn device(&self, ifindex: u32) -> Result<Arc<Device>> {
        self.devices.read().get(&ifindex).cloned().ok_or_else(|| Error::unknown_device(ifindex))
    }

    /// Look up the shaper for `handle`.
    pub fn get(&self, ifindex: u32, handle: Handle) -> Result<ShaperNode> {
        self.device(ifindex)?.get(&handle)
    }

    /// All shapers of the device, ordered by `(scope, id)`.
    pub fn dump(&self, ifindex: u32) -> Result<Vec<ShaperNode>> {
        self.device(ifindex)?.dump()
    }

    /// Create or replace `shapers` atomically. Returns the number of modified shapers.
    pub fn set(&self, ifindex: u32, shapers: &[ShaperNode]) -> Result<usize> {
        let device = self.device(ifindex)?;
        let _span = tracing::debug_span!("set", ifindex, count = shapers.len()).entered();

        match device.set(shapers, &self.options) {
            Ok(modified) => {
                device.stats.record_set(modified);
                Ok(modified)
            }
            Err(e) => {
                tracing::debug!(?e, "set rejected");
                device.stats.record_rejection();
                Err(e)
            }
        }
    }

    /// Remove `handles` atomically. Absent handles are ignored. Returns the number of removed
    /// shapers.
    pub fn delete(&self, ifindex: u32, handles: &[Handle]) -> Result<usize> {
        let device = self.device(ifindex)?;
        let _span = tracing::debug_span!("delete", ifindex, count = handles.len()).entered();

        match device.delete(handles, &self.options) {
            Ok(removed) => {
                device.stats.record_delete(removed);
                Ok(removed)
            }
            Err(e) => {
                tracing::debug!(?e, "delete rejected");
                device.stats.record_rejection();
                Err(e)
            }
        }
    }

    /// The capabilities of `scope` on the device.
    pub fn cap_get(&self, ifindex: u32, scope: Scope) -> Result<CapabilitySet> {
        self.device(ifindex)?.cap_get(scope)
    }

    /// The capabilities of every implemented scope, in scope order.
    pub fn cap_dump(&self, ifindex: u32) -> Result<Vec<(Scope, CapabilitySet)>> {
        self.device(ifindex)?.cap_dump()
    }

    /// Counters of the device. They are shared, so the handle stays live across requests.
    pub fn stats(&self, ifindex: u32) -> Result<Arc<DeviceStats>> {
        Ok(Arc::clone(&self.device(ifindex)?.stats))
    }

    /// Dispatch a typed request.
    pub fn handle(&self, request: Request) -> Result<Response> {
        match request {
            Request::Get(GetRequest { ifindex, dump: true, .. }) => {
                self.dump(ifindex).map(Response::Shapers)
            }
            Request::Get(GetRequest { ifindex, handle, dump: false }) => {
                let handle = handle.ok_or_else(|| Error::invalid("missing handle"))?;
                self.get(ifindex, handle).map(Response::Shaper)
            }
            Request::Set(SetRequest { ifindex, shapers }) => {
                self.set(ifindex, &shapers).map(Response::Modified)
            }
            Request::Delete(DeleteRequest { ifindex, handles }) => {
                self.delete(ifindex, &handles).map(Response::Modified)
            }
            Request::CapGet(CapGetRequest { ifindex, dump: true, .. }) => {
                self.cap_dump(ifindex).map(Response::CapabilityDump)
            }
            Request::CapGet(CapGetRequest { ifindex, scope, dump: false }) => {
                let scope = scope.ok_or_else(|| Error::invalid("missing scope"))?;
                self.cap_get(ifindex, scope).map(Response::Capabilities)
            }
        }
    }
}
