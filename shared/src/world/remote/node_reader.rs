use diffgraph_serde::Serde;
use log::{debug, trace};

use crate::{
    types::RefId,
    world::{
        error::{DesyncError, ReplicationError},
        node::{
            node_ref::NodeRef,
            operation::OperationCode,
            replicate::{PropertySite, Replicate},
        },
        remote::decode_context::DecodeContext,
    },
};

pub struct NodeReader;

impl NodeReader {
    /// Reads a root frame, creating and registering the root the first time
    /// it arrives
    pub fn read_root<T: Replicate>(
        context: &mut DecodeContext,
    ) -> Result<NodeRef<T>, ReplicationError> {
        let node = Self::read_header::<T>(context)?;
        Self::read_body(&node, context)?;
        Ok(node)
    }

    /// Reads the frame that follows an `Add`. The node is reused if this
    /// registry already holds it, otherwise it is created blank and
    /// registered before its properties are applied.
    pub(crate) fn read_added<T: Replicate>(
        context: &mut DecodeContext,
    ) -> Result<NodeRef<T>, ReplicationError> {
        Self::read_root(context)
    }

    /// Reads the frame that follows an `Update`, which must be for `node`
    pub(crate) fn read_update<T: Replicate>(
        node: &NodeRef<T>,
        context: &mut DecodeContext,
    ) -> Result<(), ReplicationError> {
        let ref_id = RefId::de(context.reader())?;
        if ref_id != node.ref_id() {
            return Err(DesyncError::RefIdMismatch {
                expected: node.ref_id(),
                actual: ref_id,
            }
            .into());
        }
        Self::read_body(node, context)
    }

    fn read_header<T: Replicate>(
        context: &mut DecodeContext,
    ) -> Result<NodeRef<T>, ReplicationError> {
        let ref_id = RefId::de(context.reader())?;
        if context.registry().is_registered(ref_id) {
            return context.resolve::<T>(ref_id, "decode into it");
        }
        let node = NodeRef::with_ref_id(ref_id, T::new_blank());
        context.registry().insert(node.erase())?;
        debug!("Created {} {} from stream", T::type_name(), ref_id);
        Ok(node)
    }

    /// Reads `dirty_bitmask` and one operation per set bit into `node`
    fn read_body<T: Replicate>(
        node: &NodeRef<T>,
        context: &mut DecodeContext,
    ) -> Result<(), ReplicationError> {
        let ref_id = node.ref_id();
        let schema = T::schema();
        let dirty_bitmask = u32::de(context.reader())?;
        if dirty_bitmask & !schema.full_mask() != 0 {
            return Err(DesyncError::UnknownPropertyBits {
                type_name: schema.type_name(),
                mask: dirty_bitmask,
            }
            .into());
        }
        if dirty_bitmask == 0 {
            return Ok(());
        }

        context.enter_frame()?;
        let Ok(mut value) = node.try_borrow_mut() else {
            return Err(DesyncError::ReentrantFrame { ref_id }.into());
        };
        trace!(
            "Reading {} {} mask {:#034b}",
            schema.type_name(),
            ref_id,
            dirty_bitmask
        );
        for property in value.properties_mut() {
            let index = property.index();
            if dirty_bitmask & (1 << index) == 0 {
                continue;
            }
            let operation = OperationCode::read(context.reader())?;
            let site = PropertySite {
                type_name: schema.type_name(),
                property: schema.property_name(index),
            };
            if let Some(descriptor) = schema.property(index) {
                trace!(
                    "{:?} {}.{} ({:?})",
                    operation,
                    ref_id,
                    descriptor.name(),
                    descriptor.wire_type()
                );
            }
            property.read(operation, context, site)?;
        }
        context.exit_frame();
        Ok(())
    }
}
