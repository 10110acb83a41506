use std::collections::HashSet;

use diffgraph_serde::Serde;
use log::trace;

use crate::{
    types::{PropertyIndex, RefId},
    world::{
        error::{DesyncError, ReplicationError},
        host::encode_context::EncodeContext,
        node::{
            node_ref::{ErasedNode, NodeRef},
            operation::OperationCode,
            replicate::Replicate,
        },
    },
};

/// How much of a node a frame carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// Only properties with pending operations, plus references whose
    /// targets have unsent changes
    Delta,
    /// Every property, for a receiver that has never seen the node
    Snapshot,
}

pub struct NodeWriter;

impl NodeWriter {
    /// Writes the frame for a root node, registering it with the sender's
    /// registry the first time it is sent
    pub fn write_root<T: Replicate>(
        root: &NodeRef<T>,
        context: &mut EncodeContext,
    ) -> Result<(), ReplicationError> {
        let mode = if context.is_known(root.ref_id()) {
            FrameMode::Delta
        } else {
            context.ledger().insert_root(root.ref_id());
            if root.has_been_flushed() {
                FrameMode::Snapshot
            } else {
                FrameMode::Delta
            }
        };
        Self::write_frame(root, context, mode)
    }

    /// Writes `ref_id · dirty_bitmask` followed by one operation per set bit,
    /// then clears the node's tracker.
    ///
    /// A node already written in this pass gets an empty frame, so a node
    /// reachable along several paths carries its changes exactly once.
    pub fn write_frame<T: Replicate>(
        node: &NodeRef<T>,
        context: &mut EncodeContext,
        mode: FrameMode,
    ) -> Result<(), ReplicationError> {
        let ref_id = node.ref_id();
        if !context.visit(ref_id) {
            trace!("Node {} already written this pass", ref_id);
            ref_id.ser(context.writer());
            0_u32.ser(context.writer());
            return Ok(());
        }

        let Some(value) = node.try_borrow() else {
            return Err(DesyncError::ReentrantFrame { ref_id }.into());
        };
        let tracker = node.tracker();
        let properties = value.properties();

        let mut operations: Vec<(usize, OperationCode)> = Vec::new();
        let mut claimed = ClaimedChildren::default();
        let mut dirty_bitmask: u32 = 0;
        for (position, property) in properties.iter().enumerate() {
            let index: PropertyIndex = property.index();
            let child = property.child();
            let operation = if let Some(pending) = tracker.pending_op(index) {
                pending
            } else if mode == FrameMode::Snapshot {
                property.snapshot_op()
            } else if let Some(child) = &child {
                // changes reachable through an earlier property of this frame
                // are written there
                if !claimed.leaves_changes(child, context) {
                    continue;
                }
                OperationCode::Update
            } else {
                continue;
            };
            if let Some(child) = child {
                claimed.push(child);
            }
            dirty_bitmask |= 1 << index;
            operations.push((position, operation));
        }

        trace!(
            "Writing {} {} mask {:#034b} ({:?})",
            T::type_name(),
            ref_id,
            dirty_bitmask,
            mode
        );
        ref_id.ser(context.writer());
        dirty_bitmask.ser(context.writer());
        for (position, operation) in operations {
            properties[position].write(operation, context, ref_id)?;
        }

        node.flush();
        Ok(())
    }
}

/// Children already selected by earlier properties of the frame being
/// planned. Everything reachable from them is written before any later
/// property, so it cannot be a reason to select one.
#[derive(Default)]
struct ClaimedChildren {
    children: Vec<ErasedNode>,
    reachable: HashSet<RefId>,
    walked: usize,
}

impl ClaimedChildren {
    fn push(&mut self, child: ErasedNode) {
        self.children.push(child);
    }

    /// Whether `child` reaches unsent changes the claimed children do not
    fn leaves_changes(&mut self, child: &ErasedNode, context: &mut EncodeContext) -> bool {
        if self.children.is_empty() {
            return context.needs_encode(child);
        }
        while let Some(claimed) = self.children.get(self.walked) {
            Self::walk(claimed, &mut self.reachable);
            self.walked += 1;
        }
        context.needs_encode_outside(child, &self.reachable)
    }

    fn walk(node: &ErasedNode, reachable: &mut HashSet<RefId>) {
        if !reachable.insert(node.ref_id()) {
            return;
        }
        for child in node.children() {
            Self::walk(&child, reachable);
        }
    }
}
