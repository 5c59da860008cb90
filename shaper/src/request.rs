//! Typed requests and responses, one per operation of the shaper family.

use crate::{
    caps::CapabilitySet,
    handle::{Handle, Scope},
    node::ShaperNode,
};

/// Look up one shaper, or dump all of them.
///
/// When `dump` is set, `handle` is ignored. Otherwise `handle` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub ifindex: u32,
    pub handle: Option<Handle>,
    pub dump: bool,
}

impl GetRequest {
    /// Look up the shaper for `handle`.
    pub fn one(ifindex: u32, handle: Handle) -> Self {
        Self { ifindex, handle: Some(handle), dump: false }
    }

    /// Ask for every entry of the device.
    pub fn dump(ifindex: u32) -> Self {
        Self { ifindex, handle: None, dump: true }
    }
}

/// Create or replace a batch of shapers atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRequest {
    pub ifindex: u32,
    pub shapers: Vec<ShaperNode>,
}

impl SetRequest {
    pub fn new(ifindex: u32, shapers: impl IntoIterator<Item = ShaperNode>) -> Self {
        Self { ifindex, shapers: shapers.into_iter().collect() }
    }
}

/// Remove a batch of shapers atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub ifindex: u32,
    pub handles: Vec<Handle>,
}

impl DeleteRequest {
    pub fn new(ifindex: u32, handles: impl IntoIterator<Item = Handle>) -> Self {
        Self { ifindex, handles: handles.into_iter().collect() }
    }
}

/// Query the capabilities of one scope, or of every implemented scope.
///
/// When `dump` is set, `scope` is ignored. Otherwise `scope` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapGetRequest {
    pub ifindex: u32,
    pub scope: Option<Scope>,
    pub dump: bool,
}

impl CapGetRequest {
    /// Query the capabilities of `scope`.
    pub fn one(ifindex: u32, scope: Scope) -> Self {
        Self { ifindex, scope: Some(scope), dump: false }
    }

    /// Ask for every entry of the device.
    pub fn dump(ifindex: u32) -> Self {
        Self { ifindex, scope: None, dump: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get(GetRequest),
    Set(SetRequest),
    Delete(DeleteRequest),
    CapGet(CapGetRequest),
}

impl Request {
    /// The device the request targets.
    pub fn ifindex(&self) -> u32 {
        match self {
            Self::Get(req) => req.ifindex,
            Self::Set(req) => req.ifindex,
            Self::Delete(req) => req.ifindex,
            Self::CapGet(req) => req.ifindex,
        }
    }
}

impl From<GetRequest> for Request {
    fn from(req: GetRequest) -> Self {
        Self::Get(req)
    }
}

impl From<SetRequest> for Request {
    fn from(req: SetRequest) -> Self {
        Self::Set(req)
    }
}

impl From<DeleteRequest> for Request {
    fn from(req: DeleteRequest) -> Self {
        Self::Delete(req)
    }
}

impl From<CapGetRequest> for Request {
    fn from(req: CapGetRequest) -> Self {
        Self::CapGet(req)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A single shaper, parent resolved.
    Shaper(ShaperNode),
    /// Every shaper of the device, ordered by `(scope, id)`.
    Shapers(Vec<ShaperNode>),
    /// The number of shapers created, replaced or removed.
    Modified(usize),
    Capabilities(CapabilitySet),
    /// Capabilities of every implemented scope, in scope order.
    CapabilityDump(Vec<(Scope, CapabilitySet)>),
}
