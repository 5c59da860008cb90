use crate::handle::{Handle, Scope};

/// The unit a bandwidth value is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Bits per second.
    #[default]
    Bps,
    /// Packets per second.
    Pps,
}

impl Metric {
    /// Returns the canonical lowercase name of the metric.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bps => "bps",
            Self::Pps => "pps",
        }
    }
}

/// A shaper node: the shaping parameters attached to a [`Handle`].
///
/// The same type is used for requests and for stored nodes. In a request `parent` is optional
/// and falls back to [`Scope::default_parent`]. Once committed, `parent` is always resolved, so
/// it is `None` only for the port shaper.
///
/// Numeric fields default to `0`, which means "unset". A `set` replaces every field of an
/// existing node: fields not given in the request revert to their default.
///
/// # Example
///
/// ```
/// use shaper::{Handle, ShaperNode};
///
/// let node = ShaperNode::new(Handle::queue(1)).with_bw_min(10_000).with_weight(3);
/// assert_eq!(node.bw_max, 0);
/// assert_eq!(node.parent, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaperNode {
    /// The node's own handle.
    pub handle: Handle,
    /// Where this node attaches in the hierarchy.
    pub parent: Option<Handle>,
    /// The unit of `bw_min` and `bw_max`.
    pub metric: Metric,
    /// Minimum guaranteed bandwidth.
    pub bw_min: u64,
    /// Maximum allowed bandwidth.
    pub bw_max: u64,
    /// Maximum burst for `bw_max`, in bytes.
    pub burst: u64,
    /// Strict scheduling priority.
    pub priority: u32,
    /// Weight for proportional sharing among siblings.
    pub weight: u32,
}

impl ShaperNode {
    /// Create a node for the given handle with every attribute unset.
    pub const fn new(handle: Handle) -> Self {
        Self {
            handle,
            parent: None,
            metric: Metric::Bps,
            bw_min: 0,
            bw_max: 0,
            burst: 0,
            priority: 0,
            weight: 0,
        }
    }

    /// Set an explicit parent.
    pub const fn with_parent(mut self, parent: Handle) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the unit of the bandwidth fields.
    pub const fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the guaranteed bandwidth.
    pub const fn with_bw_min(mut self, bw_min: u64) -> Self {
        self.bw_min = bw_min;
        self
    }

    /// Set the bandwidth cap.
    pub const fn with_bw_max(mut self, bw_max: u64) -> Self {
        self.bw_max = bw_max;
        self
    }

    /// Set the burst size, in bytes.
    pub const fn with_burst(mut self, burst: u64) -> Self {
        self.burst = burst;
        self
    }

    /// Set the strict priority.
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the sharing weight.
    pub const fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    #[inline]
    /// The scope of the node's handle.
    pub const fn scope(&self) -> Scope {
        self.handle.scope
    }

    /// The explicit parent if any, the scope's default parent otherwise.
    pub const fn effective_parent(&self) -> Option<Handle> {
        match self.parent {
            Some(parent) => Some(parent),
            None => self.handle.default_parent(),
        }
    }
}
