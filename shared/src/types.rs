use std::fmt;

use diffgraph_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

/// Index of a property within its type, which is also its bit in the dirty mask
pub type PropertyIndex = u8;

/// A dirty mask has one bit per property, so a type can declare at most this many
pub const MAX_PROPERTIES: usize = 32;

/// Process-unique identifier of a replicated node, stable across encode/decode
/// passes
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct RefId(u32);

impl RefId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for RefId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serde for RefId {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u32::de(reader)?))
    }
}
