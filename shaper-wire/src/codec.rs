//! Request and reply encoding.
//!
//! A request travels as a [`Message`]: the command, the dump flag and the attribute payload.
//! Replies are plain attribute payloads, one per reply message: a dump produces one payload per
//! shaper (or per scope), every other reply produces exactly one.
//!
//! Integer attributes equal to zero are left out on encode, and absent integer attributes decode
//! as zero, so both directions agree on the default node.

use bytes::Bytes;
use tracing::trace;

use shaper::{
    CapGetRequest, Capability, CapabilitySet, DeleteRequest, GetRequest, Handle, Metric, Request,
    Response, Scope, SetRequest, ShaperNode,
};

use crate::{
    Error, Result,
    attr::{self, Command},
    nla::{self, Attribute, NlaRef},
};

/// A request as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub command: Command,
    /// Requests every object instead of a single one. Only meaningful for `Get` and `CapGet`.
    pub dump: bool,
    pub payload: Bytes,
}

impl Message {
    pub fn new(command: Command, payload: impl Into<Bytes>) -> Self {
        Self { command, dump: false, payload: payload.into() }
    }

    pub fn with_dump(mut self, dump: bool) -> Self {
        self.dump = dump;
        self
    }
}

pub fn encode_request(request: &Request) -> Message {
    match request {
        Request::Get(req) => {
            let mut attrs = vec![Attribute::U32(attr::shaper::IFINDEX, req.ifindex)];
            attrs.extend(req.handle.map(|handle| handle_attr(attr::shaper::HANDLE, handle)));
            Message::new(Command::Get, nla::emit(&attrs)).with_dump(req.dump)
        }
        Request::Set(req) => {
            let mut attrs = vec![Attribute::U32(attr::shaper::IFINDEX, req.ifindex)];
            attrs.extend(
                req.shapers
                    .iter()
                    .map(|node| Attribute::Nested(attr::shaper::SHAPERS, node_attrs(node))),
            );
            Message::new(Command::Set, nla::emit(&attrs))
        }
        Request::Delete(req) => {
            let mut attrs = vec![Attribute::U32(attr::shaper::IFINDEX, req.ifindex)];
            attrs.extend(req.handles.iter().map(|h| handle_attr(attr::shaper::HANDLES, *h)));
            Message::new(Command::Delete, nla::emit(&attrs))
        }
        Request::CapGet(req) => {
            let mut attrs = vec![Attribute::U32(attr::caps::IFINDEX, req.ifindex)];
            attrs.extend(
                req.scope.map(|scope| Attribute::U32(attr::caps::SCOPE, scope_to_wire(scope))),
            );
            Message::new(Command::CapGet, nla::emit(&attrs)).with_dump(req.dump)
        }
    }
}

pub fn decode_request(msg: &Message) -> Result<Request> {
    trace!(command = msg.command.as_str(), dump = msg.dump, len = msg.payload.len(), "decoding");

    match msg.command {
        Command::Get => {
            let mut ifindex = None;
            let mut handle = None;
            for entry in nla::parse(&msg.payload) {
                let entry = entry?;
                match entry.kind() {
                    attr::shaper::IFINDEX => ifindex = Some(nla::u32_value(&entry, "ifindex")?),
                    attr::shaper::HANDLE => handle = Some(decode_handle(&entry)?),
                    kind => skip(kind),
                }
            }

            let ifindex = ifindex.ok_or(Error::Missing("ifindex"))?;
            let req = if msg.dump {
                GetRequest::dump(ifindex)
            } else {
                GetRequest { ifindex, handle, dump: false }
            };
            Ok(req.into())
        }
        Command::Set => {
            let mut ifindex = None;
            let mut shapers = Vec::new();
            for entry in nla::parse(&msg.payload) {
                let entry = entry?;
                match entry.kind() {
                    attr::shaper::IFINDEX => ifindex = Some(nla::u32_value(&entry, "ifindex")?),
                    attr::shaper::SHAPERS => shapers.push(decode_node(entry.value())?.1),
                    kind => skip(kind),
                }
            }

            let ifindex = ifindex.ok_or(Error::Missing("ifindex"))?;
            Ok(SetRequest::new(ifindex, shapers).into())
        }
        Command::Delete => {
            let mut ifindex = None;
            let mut handles = Vec::new();
            for entry in nla::parse(&msg.payload) {
                let entry = entry?;
                match entry.kind() {
                    attr::shaper::IFINDEX => ifindex = Some(nla::u32_value(&entry, "ifindex")?),
                    attr::shaper::HANDLES => handles.push(decode_handle(&entry)?),
                    kind => skip(kind),
                }
            }

            let ifindex = ifindex.ok_or(Error::Missing("ifindex"))?;
            Ok(DeleteRequest::new(ifindex, handles).into())
        }
        Command::CapGet => {
            let mut ifindex = None;
            let mut scope = None;
            for entry in nla::parse(&msg.payload) {
                let entry = entry?;
                match entry.kind() {
                    attr::caps::IFINDEX => ifindex = Some(nla::u32_value(&entry, "ifindex")?),
                    attr::caps::SCOPE => scope = Some(decode_scope(&entry)?),
                    kind => skip(kind),
                }
            }

            let ifindex = ifindex.ok_or(Error::Missing("ifindex"))?;
            let req = if msg.dump {
                CapGetRequest::dump(ifindex)
            } else {
                CapGetRequest { ifindex, scope, dump: false }
            };
            Ok(req.into())
        }
    }
}

/// Encode a reply for device `ifindex`, one payload per reply message.
pub fn encode_response(ifindex: u32, response: &Response) -> Vec<Bytes> {
    match response {
        Response::Shaper(node) => vec![encode_shaper(ifindex, node)],
        Response::Shapers(nodes) => nodes.iter().map(|node| encode_shaper(ifindex, node)).collect(),
        Response::Modified(modified) => {
            let attrs = [Attribute::U32(attr::shaper::MODIFIED, *modified as u32)];
            vec![nla::emit(&attrs).freeze()]
        }
        Response::Capabilities(caps) => {
            // Single-scope replies omit the scope.
            vec![encode_capabilities(ifindex, None, *caps)]
        }
        Response::CapabilityDump(dump) => dump
            .iter()
            .map(|(scope, caps)| encode_capabilities(ifindex, Some(*scope), *caps))
            .collect(),
    }
}

/// Decode a shaper reply, returning the device it belongs to and the node.
pub fn decode_shaper(payload: &[u8]) -> Result<(u32, ShaperNode)> {
    let (ifindex, node) = decode_node(payload)?;
    Ok((ifindex.ok_or(Error::Missing("ifindex"))?, node))
}

/// Decode a capability reply. The scope is absent from single-scope replies.
pub fn decode_capabilities(payload: &[u8]) -> Result<(u32, Option<Scope>, CapabilitySet)> {
    let mut ifindex = None;
    let mut scope = None;
    let mut caps = CapabilitySet::empty();

    for entry in nla::parse(payload) {
        let entry = entry?;
        match entry.kind() {
            attr::caps::IFINDEX => ifindex = Some(nla::u32_value(&entry, "ifindex")?),
            attr::caps::SCOPE => scope = Some(decode_scope(&entry)?),
            kind => match capability_from_wire(kind) {
                Some(cap) => caps.insert(cap),
                None => skip(kind),
            },
        }
    }

    Ok((ifindex.ok_or(Error::Missing("ifindex"))?, scope, caps))
}

pub fn decode_modified(payload: &[u8]) -> Result<usize> {
    for entry in nla::parse(payload) {
        let entry = entry?;
        if entry.kind() == attr::shaper::MODIFIED {
            return Ok(nla::u32_value(&entry, "modified")? as usize);
        }
    }

    Err(Error::Missing("modified"))
}

fn encode_shaper(ifindex: u32, node: &ShaperNode) -> Bytes {
    let mut attrs = vec![Attribute::U32(attr::shaper::IFINDEX, ifindex)];
    attrs.extend(node_attrs(node));
    nla::emit(&attrs).freeze()
}

fn encode_capabilities(ifindex: u32, scope: Option<Scope>, caps: CapabilitySet) -> Bytes {
    let mut attrs = vec![Attribute::U32(attr::caps::IFINDEX, ifindex)];
    attrs.extend(scope.map(|scope| Attribute::U32(attr::caps::SCOPE, scope_to_wire(scope))));
    attrs.extend(caps.iter().map(|cap| Attribute::Flag(capability_to_wire(cap))));
    nla::emit(&attrs).freeze()
}

fn handle_attr(kind: u16, handle: Handle) -> Attribute {
    let mut inner = vec![Attribute::U32(attr::handle::SCOPE, scope_to_wire(handle.scope))];
    if handle.id != 0 {
        inner.push(Attribute::U32(attr::handle::ID, handle.id));
    }
    Attribute::Nested(kind, inner)
}

fn node_attrs(node: &ShaperNode) -> Vec<Attribute> {
    let mut attrs = vec![handle_attr(attr::shaper::HANDLE, node.handle)];
    attrs.extend(node.parent.map(|parent| handle_attr(attr::shaper::PARENT, parent)));
    if node.metric != Metric::Bps {
        attrs.push(Attribute::U32(attr::shaper::METRIC, metric_to_wire(node.metric)));
    }

    let rates = [
        (attr::shaper::BW_MIN, node.bw_min),
        (attr::shaper::BW_MAX, node.bw_max),
        (attr::shaper::BURST, node.burst),
    ];
    for (kind, value) in rates {
        if value != 0 {
            attrs.push(Attribute::U64(kind, value));
        }
    }

    let weights = [(attr::shaper::PRIORITY, node.priority), (attr::shaper::WEIGHT, node.weight)];
    for (kind, value) in weights {
        if value != 0 {
            attrs.push(Attribute::U32(kind, value));
        }
    }

    attrs
}

fn decode_handle(entry: &NlaRef<'_>) -> Result<Handle> {
    let mut scope = None;
    let mut id = 0;
    for inner in nla::parse(entry.value()) {
        let inner = inner?;
        match inner.kind() {
            attr::handle::SCOPE => scope = Some(decode_scope(&inner)?),
            attr::handle::ID => id = nla::u32_value(&inner, "id")?,
            kind => skip(kind),
        }
    }

    let scope = scope.ok_or(Error::Missing("scope"))?;
    Ok(Handle::new(scope, id))
}

/// Decode a shaper description, along with the device index when present.
fn decode_node(payload: &[u8]) -> Result<(Option<u32>, ShaperNode)> {
    let mut ifindex = None;
    let mut handle = None;
    let mut parent = None;
    let mut metric = Metric::Bps;
    let (mut bw_min, mut bw_max, mut burst) = (0, 0, 0);
    let (mut priority, mut weight) = (0, 0);

    for entry in nla::parse(payload) {
        let entry = entry?;
        match entry.kind() {
            attr::shaper::IFINDEX => ifindex = Some(nla::u32_value(&entry, "ifindex")?),
            attr::shaper::HANDLE => handle = Some(decode_handle(&entry)?),
            attr::shaper::PARENT => parent = Some(decode_handle(&entry)?),
            attr::shaper::METRIC => metric = metric_from_wire(nla::u32_value(&entry, "metric")?)?,
            attr::shaper::BW_MIN => bw_min = nla::uint_value(&entry, "bw-min")?,
            attr::shaper::BW_MAX => bw_max = nla::uint_value(&entry, "bw-max")?,
            attr::shaper::BURST => burst = nla::uint_value(&entry, "burst")?,
            attr::shaper::PRIORITY => priority = nla::u32_value(&entry, "priority")?,
            attr::shaper::WEIGHT => weight = nla::u32_value(&entry, "weight")?,
            kind => skip(kind),
        }
    }

    let handle = handle.ok_or(Error::Missing("handle"))?;
    Ok((ifindex, ShaperNode { handle, parent, metric, bw_min, bw_max, burst, priority, weight }))
}

fn decode_scope(entry: &NlaRef<'_>) -> Result<Scope> {
    scope_from_wire(nla::u32_value(entry, "scope")?)
}

fn skip(kind: u16) {
    trace!(kind, "skipping unknown attribute");
}

fn scope_to_wire(scope: Scope) -> u32 {
    match scope {
        Scope::Port => attr::scope::PORT,
        Scope::Netdev => attr::scope::NETDEV,
        Scope::DetachedGroup => attr::scope::DETACHED,
        Scope::Queue => attr::scope::QUEUE,
    }
}

fn scope_from_wire(value: u32) -> Result<Scope> {
    match value {
        attr::scope::PORT => Ok(Scope::Port),
        attr::scope::NETDEV => Ok(Scope::Netdev),
        attr::scope::DETACHED => Ok(Scope::DetachedGroup),
        attr::scope::QUEUE => Ok(Scope::Queue),
        value => Err(Error::Invalid { attr: "scope", value: value.into() }),
    }
}

fn metric_to_wire(metric: Metric) -> u32 {
    match metric {
        Metric::Bps => attr::metric::BPS,
        Metric::Pps => attr::metric::PPS,
    }
}

fn metric_from_wire(value: u32) -> Result<Metric> {
    match value {
        attr::metric::BPS => Ok(Metric::Bps),
        attr::metric::PPS => Ok(Metric::Pps),
        value => Err(Error::Invalid { attr: "metric", value: value.into() }),
    }
}

fn capability_to_wire(cap: Capability) -> u16 {
    match cap {
        Capability::MetricBps => attr::caps::SUPPORT_METRIC_BPS,
        Capability::MetricPps => attr::caps::SUPPORT_METRIC_PPS,
        Capability::Nesting => attr::caps::SUPPORT_NESTING,
        Capability::BwMin => attr::caps::SUPPORT_BW_MIN,
        Capability::BwMax => attr::caps::SUPPORT_BW_MAX,
        Capability::Burst => attr::caps::SUPPORT_BURST,
        Capability::Priority => attr::caps::SUPPORT_PRIORITY,
        Capability::Weight => attr::caps::SUPPORT_WEIGHT,
    }
}

fn capability_from_wire(kind: u16) -> Option<Capability> {
    Capability::ALL.into_iter().find(|cap| capability_to_wire(*cap) == kind)
}
