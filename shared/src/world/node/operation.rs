use diffgraph_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

use crate::world::error::{DesyncError, ReplicationError};

// Enum used as a shared network protocol, describing how the receiver should
// apply a changed property
#[derive(Copy, PartialEq, Eq, Clone, Debug, Hash, Default)]
#[repr(u8)]
pub enum OperationCode {
    // No pending operation
    #[default]
    None = 0,
    // A scalar changed, or a referenced node's own contents changed
    Update = 1,
    // A reference was set to a node the receiver has never seen
    Add = 2,
    // A reference was set to a node the receiver already holds
    AddByRef = 3,
    // A reference was cleared
    Delete = 4,
    // An existing reference was swapped for a different, known node
    Replace = 5,
}

impl OperationCode {
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Reads an operation byte, rejecting anything outside the protocol
    pub fn read(reader: &mut ByteReader) -> Result<Self, ReplicationError> {
        let byte = reader.read_byte()?;
        Ok(Self::try_from(byte)?)
    }
}

impl TryFrom<u8> for OperationCode {
    type Error = DesyncError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Self::None),
            1 => Ok(Self::Update),
            2 => Ok(Self::Add),
            3 => Ok(Self::AddByRef),
            4 => Ok(Self::Delete),
            5 => Ok(Self::Replace),
            byte => Err(DesyncError::UnknownOperation { byte }),
        }
    }
}

impl Serde for OperationCode {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(self.to_byte());
    }

    /// Unknown bytes are reported as a malformed stream here; decoders use
    /// [`OperationCode::read`] to classify them as a desync instead.
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let byte = reader.read_byte()?;
        Self::try_from(byte).map_err(|_| SerdeErr::InvalidDiscriminant {
            type_name: "OperationCode",
            byte,
        })
    }
}
