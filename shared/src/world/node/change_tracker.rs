use std::fmt;

use crate::{
    types::{PropertyIndex, MAX_PROPERTIES},
    world::node::{operation::OperationCode, property_mutate::PropertyMutate},
};

/// Records which properties of a node changed since its last encode, and
/// what the receiver must do with each of them.
///
/// A bit is set in the dirty mask exactly when its slot in the pending
/// operations holds something other than [`OperationCode::None`]. Both are
/// reset together, and only by a completed encode of the node.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ChangeTracker {
    dirty_bitmask: u32,
    pending_ops: [OperationCode; MAX_PROPERTIES],
    flushed: bool,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirty_bitmask(&self) -> u32 {
        self.dirty_bitmask
    }

    pub fn is_clear(&self) -> bool {
        self.dirty_bitmask == 0
    }

    pub fn is_dirty(&self, index: PropertyIndex) -> bool {
        usize::from(index) < MAX_PROPERTIES && self.dirty_bitmask & (1 << index) != 0
    }

    /// The operation recorded for a property, if it is dirty
    pub fn pending_op(&self, index: PropertyIndex) -> Option<OperationCode> {
        if !self.is_dirty(index) {
            return None;
        }
        Some(self.pending_ops[usize::from(index)])
    }

    /// Iterates dirty properties in declaration order
    pub fn pending(&self) -> impl Iterator<Item = (PropertyIndex, OperationCode)> + '_ {
        (0..MAX_PROPERTIES as PropertyIndex).filter_map(move |index| {
            self.pending_op(index).map(|operation| (index, operation))
        })
    }

    /// Marks a property dirty, replacing whatever operation it had pending.
    /// Out-of-range indices and `None` are ignored.
    pub fn mark(&mut self, index: PropertyIndex, operation: OperationCode) {
        if usize::from(index) >= MAX_PROPERTIES || operation == OperationCode::None {
            return;
        }
        self.dirty_bitmask |= 1 << index;
        self.pending_ops[usize::from(index)] = operation;
    }

    /// Whether this node has completed at least one encode
    pub fn has_been_flushed(&self) -> bool {
        self.flushed
    }

    /// Resets the mask and all pending operations after an encode
    pub fn flush(&mut self) {
        self.dirty_bitmask = 0;
        self.pending_ops = [OperationCode::None; MAX_PROPERTIES];
        self.flushed = true;
    }
}

impl PropertyMutate for ChangeTracker {
    fn mutate(&mut self, property_index: PropertyIndex, operation: OperationCode) -> bool {
        self.mark(property_index, operation);
        true
    }
}

impl fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("dirty_bitmask", &format_args!("{:#034b}", self.dirty_bitmask))
            .field("pending", &self.pending().collect::<Vec<_>>())
            .field("flushed", &self.flushed)
            .finish()
    }
}
