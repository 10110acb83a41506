use std::{fmt, ops::Deref};

use diffgraph_serde::Serde;

use crate::{
    types::{PropertyIndex, RefId},
    world::{
        error::{DesyncError, ReplicationError},
        host::encode_context::EncodeContext,
        node::{
            node_ref::ErasedNode,
            operation::OperationCode,
            property_mutate::PropertyMutator,
            replicate::{PropertyCodec, PropertySite, ReplicatedProperty},
            schema::{Scalar, WireType},
        },
        remote::decode_context::DecodeContext,
    },
};

/// A scalar field of a replicated node. Assigning a different value through
/// [`Property::set`] records an `Update` with the owning node's tracker.
#[derive(Clone)]
pub struct Property<T: Scalar> {
    inner: T,
    index: PropertyIndex,
    mutator: Option<PropertyMutator>,
}

impl<T: Scalar> Property<T> {
    /// Create a new Property at the given index, holding `value`
    pub fn new(value: T, index: PropertyIndex) -> Self {
        Self {
            inner: value,
            index,
            mutator: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Set the value, queueing an update if it differs from the current one.
    /// Returns whether anything changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.inner == value {
            return false;
        }
        self.inner = value;
        if let Some(mutator) = &self.mutator {
            mutator.mutate(self.index, OperationCode::Update);
        }
        true
    }
}

impl<T: Scalar> Deref for Property<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Scalar + PartialEq> PartialEq<T> for Property<T> {
    fn eq(&self, other: &T) -> bool {
        self.inner == *other
    }
}

impl<T: Scalar + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: Scalar> PropertyCodec for Property<T> {
    fn index(&self) -> PropertyIndex {
        self.index
    }

    fn set_mutator(&mut self, mutator: &PropertyMutator) {
        if self.inner != T::default() {
            mutator.mutate(self.index, OperationCode::Update);
        }
        self.mutator = Some(mutator.clone());
    }

    fn child(&self) -> Option<ErasedNode> {
        None
    }

    fn snapshot_op(&self) -> OperationCode {
        OperationCode::Update
    }

    fn write(
        &self,
        _operation: OperationCode,
        context: &mut EncodeContext,
        _holder: RefId,
    ) -> Result<(), ReplicationError> {
        // scalars only ever carry their value
        let writer = context.writer();
        OperationCode::Update.ser(writer);
        self.inner.try_ser(writer)?;
        Ok(())
    }

    fn read(
        &mut self,
        operation: OperationCode,
        context: &mut DecodeContext,
        site: PropertySite,
    ) -> Result<(), ReplicationError> {
        if operation != OperationCode::Update {
            return Err(DesyncError::UnexpectedOperation {
                type_name: site.type_name,
                property: site.property,
                operation,
            }
            .into());
        }
        // mirrored straight into the field, the mutator never sees remote writes
        self.inner = T::de(context.reader())?;
        Ok(())
    }
}

impl<T: Scalar> ReplicatedProperty for Property<T> {
    const WIRE_TYPE: WireType = T::WIRE_TYPE;

    fn new_indexed(index: PropertyIndex) -> Self {
        Self::new(T::default(), index)
    }
}
