//! The per-device shaper tree.
//!
//! [`ShaperStore`] holds the committed shaper nodes of one device, keyed by [`Handle`]. It keeps a
//! reverse index from each parent handle to its children so that deletions can enforce that no
//! node is orphaned. The store itself performs no validation: it trusts its callers (the
//! validator for inserts, the deletion path for removals) to uphold the hierarchy rules.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::{
    error::{Error, Result},
    handle::{Handle, Scope},
    node::ShaperNode,
};

#[derive(Debug, Default, Clone)]
pub struct ShaperStore {
    /// Committed nodes, ordered by `(scope, id)`.
    nodes: BTreeMap<Handle, ShaperNode>,
    /// Parent handle -> handles of the nodes attached to it.
    ///
    /// A parent may be an implicit default (e.g. `netdev:0`) with no node of its own.
    children: FxHashMap<Handle, BTreeSet<Handle>>,
}

impl ShaperStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the node for `handle`, or [`Error::NotFound`].
    pub fn get(&self, handle: &Handle) -> Result<ShaperNode> {
        self.nodes.get(handle).copied().ok_or(Error::NotFound(*handle))
    }

    /// Whether a node exists for `handle`.
    pub fn contains(&self, handle: &Handle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// All nodes, ascending by `(scope, id)`.
    pub fn dump(&self) -> Vec<ShaperNode> {
        self.nodes.values().copied().collect()
    }

    /// Insert `node`, or replace every attribute of the existing node with the same handle.
    ///
    /// `node.parent` must already be resolved. Returns the previous node, if any.
    pub fn upsert(&mut self, node: ShaperNode) -> Option<ShaperNode> {
        debug_assert!(
            node.parent.is_some() || node.scope() == Scope::Port,
            "unresolved parent for {}",
            node.handle
        );

        let previous = self.nodes.insert(node.handle, node);

        if let Some(old_parent) = previous.and_then(|prev| prev.parent) {
            if Some(old_parent) != node.parent {
                self.unlink(old_parent, node.handle);
            }
        }

        if let Some(parent) = node.parent {
            self.children.entry(parent).or_default().insert(node.handle);
        }

        tracing::trace!(
            handle = %node.handle,
            parent = ?node.parent,
            replaced = previous.is_some(),
            "upsert"
        );

        previous
    }

    /// The handles of the nodes whose parent is `handle`, in `(scope, id)` order.
    pub fn children_of(&self, handle: &Handle) -> impl Iterator<Item = Handle> + '_ {
        self.children.get(handle).into_iter().flat_map(|set| set.iter().copied())
    }

    /// Whether any node has `handle` as its parent.
    pub fn has_children(&self, handle: &Handle) -> bool {
        self.children.get(handle).is_some_and(|set| !set.is_empty())
    }

    /// Remove the node for `handle` unconditionally.
    ///
    /// Callers must have checked that the node has no children left.
    pub fn remove(&mut self, handle: &Handle) -> Option<ShaperNode> {
        let node = self.nodes.remove(handle)?;
        if let Some(parent) = node.parent {
            self.unlink(parent, *handle);
        }

        tracing::trace!(%handle, "removed");
        Some(node)
    }

    /// Number of nodes in `scope`.
    pub fn count(&self, scope: Scope) -> usize {
        self.nodes.keys().filter(|handle| handle.scope == scope).count()
    }

    /// Number of nodes across all scopes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.children.clear();
    }

    fn unlink(&mut self, parent: Handle, child: Handle) {
        if let Some(set) = self.children.get_mut(&parent) {
            set.remove(&child);
            if set.is_empty() {
                self.children.remove(&parent);
            }
        }
    }
}
