use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    ref_id_allocator::RefIdAllocator,
    types::RefId,
    world::{
        error::{DesyncError, ReplicationError},
        node::{
            node_ref::{ErasedNode, NodeRef},
            replicate::Replicate,
        },
        registry::release_channel::{ReleaseChannel, ReleaseReceiver},
    },
};

/// Maps [`RefId`]s to live nodes for one side of a session.
///
/// Nodes report when their last incoming reference goes away. Those reports
/// queue up and are applied on the next [`sweep`](Self::sweep), which every
/// public query performs first, so callers never observe a node whose
/// reference count has already reached zero. A decode pass looks nodes up
/// without sweeping and sweeps once when it finishes, which lets a node that
/// is detached and reattached within one pass survive it.
pub struct ObjectRegistry {
    nodes: HashMap<RefId, ErasedNode>,
    releases: ReleaseReceiver,
    ids: RefIdAllocator,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        let (_, releases) = ReleaseChannel::new_channel();
        Self {
            nodes: HashMap::new(),
            releases,
            ids: RefIdAllocator::new(),
        }
    }

    /// Register a node, subscribing to its release notifications
    pub fn add<T: Replicate>(&mut self, node: &NodeRef<T>) -> Result<(), ReplicationError> {
        self.add_erased(node.erase())
    }

    /// Register a node of any type
    pub fn add_erased(&mut self, node: ErasedNode) -> Result<(), ReplicationError> {
        self.sweep();
        self.insert(node)
    }

    /// Unregister a node, returning it
    pub fn remove(&mut self, ref_id: RefId) -> Result<ErasedNode, ReplicationError> {
        self.sweep();
        let node = self
            .nodes
            .remove(&ref_id)
            .ok_or(ReplicationError::NotFound {
                ref_id,
                operation: "remove it",
            })?;
        node.unsubscribe(&self.releases);
        debug!("Removed node {} ({})", ref_id, node.type_name());
        Ok(node)
    }

    pub fn try_get(&mut self, ref_id: RefId) -> Option<ErasedNode> {
        self.sweep();
        self.lookup(ref_id)
    }

    /// The node registered under `ref_id`, if there is one and it holds a `T`
    pub fn get<T: Replicate>(&mut self, ref_id: RefId) -> Option<NodeRef<T>> {
        self.try_get(ref_id)?.downcast::<T>()
    }

    pub fn contains(&mut self, ref_id: RefId) -> bool {
        self.sweep();
        self.nodes.contains_key(&ref_id)
    }

    pub fn len(&mut self) -> usize {
        self.sweep();
        self.nodes.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Ids of every registered node, ascending
    pub fn ref_ids(&mut self) -> Vec<RefId> {
        self.sweep();
        let mut ref_ids: Vec<RefId> = self.nodes.keys().copied().collect();
        ref_ids.sort();
        ref_ids
    }

    /// The allocator for nodes created on this side of the session
    pub fn allocator(&mut self) -> &mut RefIdAllocator {
        &mut self.ids
    }

    /// Evict every node whose reference count is still zero since it last
    /// reported a release. An evicted node lets go of the nodes it
    /// references, even if a handle to it is still held elsewhere, and those
    /// that drop to zero are evicted in the same sweep. Returns how many
    /// nodes were evicted.
    pub fn sweep(&mut self) -> usize {
        let mut evicted = 0;
        while let Some(ref_id) = self.releases.try_recv() {
            let Some(node) = self.nodes.get(&ref_id) else {
                continue;
            };
            if node.ref_count() != 0 {
                continue;
            }
            if let Some(node) = self.nodes.remove(&ref_id) {
                node.unsubscribe(&self.releases);
                node.detach_references();
                debug!("Evicted node {} ({})", ref_id, node.type_name());
                evicted += 1;
            }
        }
        evicted
    }

    /// Unregister everything
    pub fn clear(&mut self) {
        for node in self.nodes.values() {
            node.unsubscribe(&self.releases);
        }
        self.nodes.clear();
        while self.releases.try_recv().is_some() {}
    }

    // Lookups used within a single decode pass

    pub(crate) fn insert(&mut self, node: ErasedNode) -> Result<(), ReplicationError> {
        let ref_id = node.ref_id();
        if self.nodes.contains_key(&ref_id) {
            return Err(ReplicationError::DuplicateRegistration { ref_id });
        }
        self.ids.adopt(ref_id);
        node.subscribe(self.releases.new_sender());
        debug!("Registered node {} ({})", ref_id, node.type_name());
        self.nodes.insert(ref_id, node);
        Ok(())
    }

    pub(crate) fn lookup(&self, ref_id: RefId) -> Option<ErasedNode> {
        self.nodes.get(&ref_id).cloned()
    }

    pub(crate) fn is_registered(&self, ref_id: RefId) -> bool {
        self.nodes.contains_key(&ref_id)
    }

    /// Typed lookup that reports why it failed
    pub(crate) fn resolve<T: Replicate>(
        &self,
        ref_id: RefId,
        operation: &'static str,
    ) -> Result<NodeRef<T>, ReplicationError> {
        let node = self
            .lookup(ref_id)
            .ok_or(ReplicationError::NotFound { ref_id, operation })?;
        trace!("Resolved node {} ({})", ref_id, node.type_name());
        node.downcast::<T>().ok_or_else(|| {
            DesyncError::TypeMismatch {
                ref_id,
                expected: T::type_name(),
                actual: node.type_name(),
            }
            .into()
        })
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ObjectRegistry {
    fn drop(&mut self) {
        for node in self.nodes.values() {
            node.unsubscribe(&self.releases);
        }
    }
}
