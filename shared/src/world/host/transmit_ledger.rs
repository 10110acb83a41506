use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, trace};

use crate::types::{PropertyIndex, RefId};

/// The sender's picture of the receiver's registry.
///
/// Local `ref_count`s also count edges held by nodes that are no longer
/// reachable from any root, which the receiver never hears about. The ledger
/// instead replays every edge operation as it is written to the stream, and
/// evicts at the end of each pass exactly as the receiving registry will, so
/// a node is only ever sent by reference while the receiver still holds it.
#[derive(Debug, Default)]
pub struct TransmitLedger {
    counts: HashMap<RefId, u32>,
    edges: HashMap<RefId, BTreeMap<PropertyIndex, RefId>>,
    roots: HashSet<RefId>,
    released: Vec<RefId>,
}

impl TransmitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the receiver holds this node after the last completed pass
    pub fn is_known(&self, ref_id: RefId) -> bool {
        self.counts.contains_key(&ref_id)
    }

    /// How many transmitted edges point at the node
    pub fn ref_count(&self, ref_id: RefId) -> Option<u32> {
        self.counts.get(&ref_id).copied()
    }

    /// The node the receiver has at `holder`'s property `index`
    pub fn target(&self, holder: RefId, index: PropertyIndex) -> Option<RefId> {
        self.edges.get(&holder)?.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Ids of every node the receiver holds, ascending
    pub fn ref_ids(&self) -> Vec<RefId> {
        let mut ref_ids: Vec<RefId> = self.counts.keys().copied().collect();
        ref_ids.sort();
        ref_ids
    }

    /// Records a root, which is never evicted
    pub(crate) fn insert_root(&mut self, ref_id: RefId) {
        self.roots.insert(ref_id);
        self.insert(ref_id);
    }

    /// Records a node whose full frame is being sent
    pub(crate) fn insert(&mut self, ref_id: RefId) {
        self.counts.entry(ref_id).or_insert(0);
    }

    /// Records `holder.index = target`, as the receiver will apply it
    pub(crate) fn attach(&mut self, holder: RefId, index: PropertyIndex, target: RefId) {
        let slots = self.edges.entry(holder).or_default();
        if slots.get(&index) == Some(&target) {
            return;
        }
        let previous = slots.insert(index, target);
        *self.counts.entry(target).or_insert(0) += 1;
        if let Some(previous) = previous {
            self.release(previous);
        }
    }

    /// Records `holder.index = None`
    pub(crate) fn detach(&mut self, holder: RefId, index: PropertyIndex) {
        let previous = self
            .edges
            .get_mut(&holder)
            .and_then(|slots| slots.remove(&index));
        if let Some(previous) = previous {
            self.release(previous);
        }
    }

    fn release(&mut self, ref_id: RefId) {
        let Some(count) = self.counts.get_mut(&ref_id) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.released.push(ref_id);
        }
    }

    /// Evicts nodes left without edges by the pass just written, and the
    /// nodes that only they referenced. Returns how many were evicted.
    pub(crate) fn sweep(&mut self) -> usize {
        let mut evicted = 0;
        while let Some(ref_id) = self.released.pop() {
            if self.roots.contains(&ref_id) || self.counts.get(&ref_id) != Some(&0) {
                continue;
            }
            self.counts.remove(&ref_id);
            evicted += 1;
            trace!("Receiver will evict node {}", ref_id);
            for (_, target) in self.edges.remove(&ref_id).unwrap_or_default() {
                self.release(target);
            }
        }
        if evicted > 0 {
            debug!("Ledger evicted {} nodes", evicted);
        }
        evicted
    }
}
