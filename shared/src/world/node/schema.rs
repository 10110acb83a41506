use diffgraph_serde::Serde;

use crate::types::{PropertyIndex, MAX_PROPERTIES};

/// How a property is carried on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    String,
    /// A reference to another replicated node
    Reference,
}

/// A value type that can back a scalar [`Property`](crate::Property)
pub trait Scalar: Serde + Clone + PartialEq + Default + 'static {
    const WIRE_TYPE: WireType;
}

macro_rules! impl_scalar {
    ($($ty:ty => $wire:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIRE_TYPE: WireType = WireType::$wire;
            }
        )*
    };
}

impl_scalar!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => String,
);

/// Name and wire type of one declared property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: &'static str,
    wire_type: WireType,
}

impl PropertyDescriptor {
    pub const fn new(name: &'static str, wire_type: WireType) -> Self {
        Self { name, wire_type }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn wire_type(&self) -> WireType {
        self.wire_type
    }
}

/// The static description of a replicated type: its name and its properties
/// in declaration order. A property's position is its bit index for the
/// lifetime of the type.
#[derive(Debug)]
pub struct Schema {
    type_name: &'static str,
    properties: &'static [PropertyDescriptor],
}

impl Schema {
    pub const fn new(type_name: &'static str, properties: &'static [PropertyDescriptor]) -> Self {
        Self {
            type_name,
            properties,
        }
    }

    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn property(&self, index: PropertyIndex) -> Option<&'static PropertyDescriptor> {
        self.properties.get(usize::from(index))
    }

    /// Name of a property, or `"<unknown>"` for an index the type does not declare
    pub fn property_name(&self, index: PropertyIndex) -> &'static str {
        self.property(index).map_or("<unknown>", |property| property.name())
    }

    /// A mask with one bit set per declared property
    pub fn full_mask(&self) -> u32 {
        let count = self.properties.len().min(MAX_PROPERTIES);
        if count == MAX_PROPERTIES {
            u32::MAX
        } else {
            (1_u32 << count) - 1
        }
    }
}
