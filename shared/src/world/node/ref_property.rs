use std::fmt;

use diffgraph_serde::Serde;
use log::trace;

use crate::{
    types::{PropertyIndex, RefId},
    world::{
        error::{DesyncError, ReplicationError},
        host::{
            encode_context::EncodeContext,
            node_writer::{FrameMode, NodeWriter},
        },
        node::{
            node_ref::{ErasedNode, NodeRef},
            operation::OperationCode,
            property_mutate::PropertyMutator,
            replicate::{PropertyCodec, PropertySite, Replicate, ReplicatedProperty},
            schema::WireType,
        },
        remote::{decode_context::DecodeContext, node_reader::NodeReader},
    },
};

/// A field of a replicated node that holds an optional reference to another
/// node.
///
/// Each held reference counts toward the target's `ref_count`, so assigning,
/// clearing and dropping a `RefProperty` keep those counts in step with the
/// edges that actually exist in the graph.
pub struct RefProperty<T: Replicate> {
    inner: Option<NodeRef<T>>,
    index: PropertyIndex,
    mutator: Option<PropertyMutator>,
}

impl<T: Replicate> RefProperty<T> {
    /// Create an empty reference at the given index
    pub fn new(index: PropertyIndex) -> Self {
        Self {
            inner: None,
            index,
            mutator: None,
        }
    }

    /// A handle to the referenced node, if any
    pub fn get(&self) -> Option<NodeRef<T>> {
        self.inner.clone()
    }

    pub fn as_ref(&self) -> Option<&NodeRef<T>> {
        self.inner.as_ref()
    }

    pub fn ref_id(&self) -> Option<RefId> {
        self.inner.as_ref().map(NodeRef::ref_id)
    }

    pub fn is_some(&self) -> bool {
        self.inner.is_some()
    }

    pub fn is_none(&self) -> bool {
        self.inner.is_none()
    }

    /// Point this property at `value`, or clear it with `None`.
    ///
    /// Adjusts reference counts on both the previous and the new target and
    /// records the matching operation with the owning node's tracker:
    ///
    /// * `Add` when the new target had no references before this assignment
    /// * `AddByRef` when the property was empty and the target is already held elsewhere
    /// * `Replace` when the property swaps one held target for another
    /// * `Delete` when the property is cleared
    ///
    /// Assigning the node already held, or `None` to an empty property,
    /// changes nothing. Returns the recorded operation.
    pub fn set(&mut self, value: Option<&NodeRef<T>>) -> Option<OperationCode> {
        let operation = match (self.inner.as_ref(), value) {
            (None, None) => return None,
            (Some(current), Some(next)) if current.ptr_eq(next) => return None,
            (_, None) => OperationCode::Delete,
            (current, Some(next)) => {
                if next.acquire() == 0 {
                    OperationCode::Add
                } else if current.is_some() {
                    OperationCode::Replace
                } else {
                    OperationCode::AddByRef
                }
            }
        };

        if let Some(previous) = self.inner.take() {
            previous.release();
        }
        self.inner = value.cloned();

        if let Some(mutator) = &self.mutator {
            mutator.mutate(self.index, operation);
        }
        Some(operation)
    }

    /// Shorthand for `set(None)`
    pub fn clear(&mut self) -> Option<OperationCode> {
        self.set(None)
    }

    // Remote writes, which bypass the mutator

    fn attach_remote(&mut self, node: NodeRef<T>) {
        if let Some(current) = &self.inner {
            if current.ptr_eq(&node) {
                return;
            }
        }
        node.acquire();
        if let Some(previous) = self.inner.replace(node) {
            previous.release();
        }
    }

    fn write_reference(
        &self,
        operation: OperationCode,
        node: &NodeRef<T>,
        context: &mut EncodeContext,
        holder: RefId,
    ) -> Result<(), ReplicationError> {
        let ref_id = node.ref_id();
        let known = context.is_known(ref_id);
        let carried = context.is_visited(ref_id) || !context.needs_encode(&node.erase());

        if known && carried {
            let wire_op = if operation == OperationCode::Replace {
                OperationCode::Replace
            } else {
                OperationCode::AddByRef
            };
            trace!("{:?} {} at {}.{}", wire_op, ref_id, holder, self.index);
            wire_op.ser(context.writer());
            ref_id.ser(context.writer());
            context.attach(holder, self.index, ref_id);
            return Ok(());
        }

        // the receiver either lacks the node or lacks some of its changes,
        // so its frame goes inline
        let mode = if !known && node.has_been_flushed() {
            FrameMode::Snapshot
        } else {
            FrameMode::Delta
        };
        trace!("Add {} at {}.{} ({:?})", ref_id, holder, self.index, mode);
        context.ledger().insert(ref_id);
        OperationCode::Add.ser(context.writer());
        NodeWriter::write_frame(node, context, mode)?;
        context.attach(holder, self.index, ref_id);
        Ok(())
    }
}

impl<T: Replicate> Drop for RefProperty<T> {
    fn drop(&mut self) {
        if let Some(previous) = self.inner.take() {
            previous.release();
        }
    }
}

impl<T: Replicate> fmt::Debug for RefProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(node) => write!(f, "Some({})", node.ref_id()),
            None => f.write_str("None"),
        }
    }
}

impl<T: Replicate> PropertyCodec for RefProperty<T> {
    fn index(&self) -> PropertyIndex {
        self.index
    }

    fn set_mutator(&mut self, mutator: &PropertyMutator) {
        if let Some(node) = &self.inner {
            let operation = if node.ref_count() > 1 {
                OperationCode::AddByRef
            } else {
                OperationCode::Add
            };
            mutator.mutate(self.index, operation);
        }
        self.mutator = Some(mutator.clone());
    }

    fn child(&self) -> Option<ErasedNode> {
        self.inner.as_ref().map(NodeRef::erase)
    }

    fn snapshot_op(&self) -> OperationCode {
        if self.inner.is_some() {
            OperationCode::AddByRef
        } else {
            OperationCode::Delete
        }
    }

    fn write(
        &self,
        operation: OperationCode,
        context: &mut EncodeContext,
        holder: RefId,
    ) -> Result<(), ReplicationError> {
        let node = match (&self.inner, operation) {
            (Some(node), OperationCode::Update) => {
                OperationCode::Update.ser(context.writer());
                return NodeWriter::write_frame(node, context, FrameMode::Delta);
            }
            (Some(node), _) if operation != OperationCode::Delete => node,
            _ => {
                OperationCode::Delete.ser(context.writer());
                context.detach(holder, self.index);
                return Ok(());
            }
        };
        self.write_reference(operation, node, context, holder)
    }

    fn read(
        &mut self,
        operation: OperationCode,
        context: &mut DecodeContext,
        site: PropertySite,
    ) -> Result<(), ReplicationError> {
        match operation {
            OperationCode::Add => {
                let node = NodeReader::read_added::<T>(context)?;
                self.attach_remote(node);
            }
            OperationCode::AddByRef | OperationCode::Replace => {
                let ref_id = RefId::de(context.reader())?;
                let node = context.resolve::<T>(ref_id, "attach it by reference")?;
                self.attach_remote(node);
            }
            OperationCode::Update => {
                let Some(node) = self.inner.clone() else {
                    return Err(DesyncError::MissingReference {
                        type_name: site.type_name,
                        property: site.property,
                    }
                    .into());
                };
                NodeReader::read_update(&node, context)?;
            }
            OperationCode::Delete => self.detach_remote(),
            OperationCode::None => {
                return Err(DesyncError::UnexpectedOperation {
                    type_name: site.type_name,
                    property: site.property,
                    operation,
                }
                .into());
            }
        }
        Ok(())
    }

    fn detach_remote(&mut self) {
        if let Some(previous) = self.inner.take() {
            previous.release();
        }
    }
}

impl<T: Replicate> ReplicatedProperty for RefProperty<T> {
    const WIRE_TYPE: WireType = WireType::Reference;

    fn new_indexed(index: PropertyIndex) -> Self {
        Self::new(index)
    }
}
