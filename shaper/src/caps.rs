//! Per-device, per-scope capability declarations.
//!
//! A driver declares, for each [`Scope`] it implements, which optional shaper attributes its data
//! path actually enforces. The engine snapshots these declarations into a [`CapabilityTable`]
//! when the device is attached; the table is immutable afterwards.

use std::fmt;

use crate::{
    error::{Error, Result},
    handle::Scope,
};

/// A single capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// A non-zero `bw_min` is enforced.
    BwMin,
    /// A non-zero `bw_max` is enforced.
    BwMax,
    /// A non-zero `burst` is enforced.
    Burst,
    /// Strict priority scheduling among siblings.
    Priority,
    /// Weighted round robin among siblings.
    Weight,
    /// Rates may be expressed in bits per second.
    MetricBps,
    /// Rates may be expressed in packets per second.
    MetricPps,
    /// Queues may be nested under a detached group.
    Nesting,
}

impl Capability {
    /// All flags, in wire order.
    pub const ALL: [Self; 8] = [
        Self::MetricBps,
        Self::MetricPps,
        Self::Nesting,
        Self::BwMin,
        Self::BwMax,
        Self::Burst,
        Self::Priority,
        Self::Weight,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }

    /// Returns the name of the flag, e.g. `support-bw-max`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BwMin => "support-bw-min",
            Self::BwMax => "support-bw-max",
            Self::Burst => "support-burst",
            Self::Priority => "support-priority",
            Self::Weight => "support-weight",
            Self::MetricBps => "support-metric-bps",
            Self::MetricPps => "support-metric-pps",
            Self::Nesting => "support-nesting",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`Capability`] flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every flag set.
    pub const fn all() -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < Capability::ALL.len() {
            bits |= Capability::ALL[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Returns a copy of the set with `cap` added.
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Returns a copy of the set with `cap` removed.
    pub const fn without(self, cap: Capability) -> Self {
        Self(self.0 & !cap.bit())
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub const fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the flags in the set, in wire order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> {
        let set = *self;
        Capability::ALL.into_iter().filter(move |cap| set.contains(*cap))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Capability::as_str)).finish()
    }
}

/// The capabilities of one device, indexed by scope.
///
/// `None` for a scope means the device doesn't implement shaping at that level. A table with no
/// scope at all describes a device without shaping support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityTable {
    scopes: [Option<CapabilitySet>; Scope::ALL.len()],
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the capabilities of `scope`.
    pub fn with_scope(mut self, scope: Scope, caps: CapabilitySet) -> Self {
        self.scopes[scope as usize] = Some(caps);
        self
    }

    /// Build a table by asking `f` about every scope.
    pub fn from_fn(mut f: impl FnMut(Scope) -> Option<CapabilitySet>) -> Self {
        let mut table = Self::default();
        for scope in Scope::ALL {
            table.scopes[scope as usize] = f(scope);
        }
        table
    }

    /// Returns `true` if the device implements at least one scope.
    pub fn supports_shaping(&self) -> bool {
        self.scopes.iter().any(Option::is_some)
    }

    /// The capabilities of `scope`, if implemented.
    pub fn get(&self, scope: Scope) -> Option<CapabilitySet> {
        self.scopes[scope as usize]
    }

    /// The capabilities of `scope`, failing with [`Error::Unsupported`] when the scope isn't
    /// implemented.
    pub fn capabilities(&self, ifindex: u32, scope: Scope) -> Result<CapabilitySet> {
        self.scopes[scope as usize]
            .ok_or_else(|| Error::unsupported(format!("device {ifindex} has no {scope} shaper")))
    }

    /// All implemented scopes with their capabilities, in scope enumeration order.
    pub fn dump(&self, ifindex: u32) -> Result<Vec<(Scope, CapabilitySet)>> {
        if !self.supports_shaping() {
            return Err(Error::unsupported(format!("device {ifindex} does not support shaping")));
        }

        Ok(Scope::ALL
            .into_iter()
            .filter_map(|scope| self.scopes[scope as usize].map(|caps| (scope, caps)))
            .collect())
    }
}
