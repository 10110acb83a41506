use std::any::Any;

use crate::{
    types::{PropertyIndex, RefId},
    world::{
        error::ReplicationError,
        host::encode_context::EncodeContext,
        node::{
            node_ref::ErasedNode, operation::OperationCode, property_mutate::PropertyMutator,
            schema::{Schema, WireType},
        },
        remote::decode_context::DecodeContext,
    },
};

/// A type whose values can live inside a [`NodeRef`](crate::NodeRef) and be
/// replicated property by property.
///
/// Usually implemented with the [`replicate!`](crate::replicate) macro rather
/// than by hand.
pub trait Replicate: Any + Sized {
    /// A value with every property at its default, used when the decoder
    /// meets a node it has never seen
    fn new_blank() -> Self;

    fn schema() -> &'static Schema;

    /// Properties in declaration order
    fn properties(&self) -> Vec<&dyn PropertyCodec>;

    /// Properties in declaration order
    fn properties_mut(&mut self) -> Vec<&mut dyn PropertyCodec>;

    /// Connect every property to the tracker of the node that now owns this
    /// value. Properties already holding non-default values mark themselves
    /// dirty.
    fn set_mutator(&mut self, mutator: &PropertyMutator) {
        for property in self.properties_mut() {
            property.set_mutator(mutator);
        }
    }

    fn type_name() -> &'static str {
        Self::schema().type_name()
    }
}

/// Where a property lives, for error reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertySite {
    pub type_name: &'static str,
    pub property: &'static str,
}

/// The object-safe face of a property, through which the encoder and decoder
/// walk a node without knowing its concrete type
pub trait PropertyCodec {
    fn index(&self) -> PropertyIndex;

    fn set_mutator(&mut self, mutator: &PropertyMutator);

    /// The referenced node, for reference properties that hold one
    fn child(&self) -> Option<ErasedNode>;

    /// Operation that reproduces the current value on a receiver that has
    /// never seen this node
    fn snapshot_op(&self) -> OperationCode;

    /// Writes the operation byte and payload for this property of `holder`
    fn write(
        &self,
        operation: OperationCode,
        context: &mut EncodeContext<'_>,
        holder: RefId,
    ) -> Result<(), ReplicationError>;

    /// Applies an incoming operation, whose byte has already been consumed
    fn read(
        &mut self,
        operation: OperationCode,
        context: &mut DecodeContext<'_>,
        site: PropertySite,
    ) -> Result<(), ReplicationError>;

    /// Lets go of the referenced node, if any, without recording a change.
    /// A receiving registry calls this on every property of a node it evicts.
    fn detach_remote(&mut self) {}
}

/// A property type that can be declared inside [`replicate!`](crate::replicate)
pub trait ReplicatedProperty: PropertyCodec + Sized {
    const WIRE_TYPE: WireType;

    fn new_indexed(index: PropertyIndex) -> Self;
}

/// Hands out property indices in declaration order
#[derive(Debug, Default)]
pub struct PropertyIndexer {
    next: PropertyIndex,
}

impl PropertyIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_index(&mut self) -> PropertyIndex {
        let index = self.next;
        self.next = self.next.saturating_add(1);
        index
    }
}

/// Declares a replicated struct.
///
/// Every field must be a [`Property`](crate::Property) or a
/// [`RefProperty`](crate::RefProperty). Field order fixes each property's
/// bit index, so both peers must compile the same declaration.
///
/// ```
/// use diffgraph_shared::{replicate, Property, RefProperty};
///
/// replicate! {
///     pub struct Item {
///         pub id: Property<String>,
///         pub cost: Property<i32>,
///     }
/// }
///
/// replicate! {
///     pub struct Entity {
///         pub id: Property<String>,
///         pub health: Property<i32>,
///         pub item: RefProperty<Item>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! replicate {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $name {
            /// Create a value with every property at its default
            #[allow(unused_mut, unused_variables)]
            pub fn new() -> Self {
                let mut indexer = $crate::PropertyIndexer::new();
                Self {
                    $(
                        $field: <$ty as $crate::ReplicatedProperty>::new_indexed(
                            indexer.next_index(),
                        ),
                    )*
                }
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::Replicate for $name {
            fn new_blank() -> Self {
                Self::new()
            }

            fn schema() -> &'static $crate::Schema {
                static SCHEMA: $crate::Schema = $crate::Schema::new(
                    ::std::stringify!($name),
                    &[
                        $(
                            $crate::PropertyDescriptor::new(
                                ::std::stringify!($field),
                                <$ty as $crate::ReplicatedProperty>::WIRE_TYPE,
                            ),
                        )*
                    ],
                );
                &SCHEMA
            }

            fn properties(&self) -> ::std::vec::Vec<&dyn $crate::PropertyCodec> {
                ::std::vec![$(&self.$field as &dyn $crate::PropertyCodec),*]
            }

            fn properties_mut(&mut self) -> ::std::vec::Vec<&mut dyn $crate::PropertyCodec> {
                ::std::vec![$(&mut self.$field as &mut dyn $crate::PropertyCodec),*]
            }
        }

        const _: () = ::std::assert!(
            <[&str]>::len(&[$(::std::stringify!($field)),*]) <= $crate::MAX_PROPERTIES,
            ::std::concat!(
                ::std::stringify!($name),
                " declares more properties than fit in a dirty mask"
            ),
        );
    };
}
