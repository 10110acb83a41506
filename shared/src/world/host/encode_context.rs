use std::collections::HashSet;

use diffgraph_serde::{ByteWrite, ByteWriter};

use crate::{
    types::{PropertyIndex, RefId},
    world::{host::transmit_ledger::TransmitLedger, node::node_ref::ErasedNode},
};

/// State carried through one encode pass: the output buffer, the ledger of
/// what the receiver holds, and which nodes this pass has already written
pub struct EncodeContext<'a> {
    writer: ByteWriter,
    ledger: &'a mut TransmitLedger,
    visited: HashSet<RefId>,
    clean: HashSet<RefId>,
}

impl<'a> EncodeContext<'a> {
    pub fn new(ledger: &'a mut TransmitLedger, initial_capacity: usize) -> Self {
        Self {
            writer: ByteWriter::with_capacity(initial_capacity),
            ledger,
            visited: HashSet::new(),
            clean: HashSet::new(),
        }
    }

    pub fn writer(&mut self) -> &mut dyn ByteWrite {
        &mut self.writer
    }

    pub fn bytes_written(&self) -> usize {
        self.writer.bytes_written()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.to_bytes()
    }

    /// Whether the receiver holds this node already
    pub fn is_known(&self, ref_id: RefId) -> bool {
        self.ledger.is_known(ref_id)
    }

    pub(crate) fn ledger(&mut self) -> &mut TransmitLedger {
        self.ledger
    }

    pub(crate) fn attach(&mut self, holder: RefId, index: PropertyIndex, target: RefId) {
        self.ledger.attach(holder, index, target);
    }

    pub(crate) fn detach(&mut self, holder: RefId, index: PropertyIndex) {
        self.ledger.detach(holder, index);
    }

    pub fn is_visited(&self, ref_id: RefId) -> bool {
        self.visited.contains(&ref_id)
    }

    /// Marks a node as written, returning false if it already was
    pub(crate) fn visit(&mut self, ref_id: RefId) -> bool {
        self.visited.insert(ref_id)
    }

    /// Whether this node or anything reachable from it has changes this pass
    /// has not written yet
    pub fn needs_encode(&mut self, node: &ErasedNode) -> bool {
        let ref_id = node.ref_id();
        if self.visited.contains(&ref_id) || self.clean.contains(&ref_id) {
            return false;
        }
        if !node.is_tracker_clear() {
            return true;
        }
        // provisionally clean, so a cycle back to this node ends the search
        self.clean.insert(ref_id);
        for child in node.children() {
            if self.needs_encode(&child) {
                self.clean.remove(&ref_id);
                return true;
            }
        }
        false
    }

    /// Like [`needs_encode`](Self::needs_encode), but changes on nodes in
    /// `excluded` do not count. Nothing learned here is cached.
    pub(crate) fn needs_encode_outside(
        &self,
        node: &ErasedNode,
        excluded: &HashSet<RefId>,
    ) -> bool {
        let mut seen = HashSet::new();
        self.has_changes_outside(node, excluded, &mut seen)
    }

    fn has_changes_outside(
        &self,
        node: &ErasedNode,
        excluded: &HashSet<RefId>,
        seen: &mut HashSet<RefId>,
    ) -> bool {
        let ref_id = node.ref_id();
        if excluded.contains(&ref_id)
            || self.visited.contains(&ref_id)
            || self.clean.contains(&ref_id)
            || !seen.insert(ref_id)
        {
            return false;
        }
        if !node.is_tracker_clear() {
            return true;
        }
        node.children()
            .iter()
            .any(|child| self.has_changes_outside(child, excluded, seen))
    }
}
