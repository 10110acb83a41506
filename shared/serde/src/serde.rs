use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr};

/// A type that can be written to and read from the wire
pub trait Serde: Sized {
    /// Writes the value into the outgoing byte stream
    fn ser(&self, writer: &mut dyn ByteWrite);

    /// Writes the value, failing instead of writing a corrupt encoding when
    /// the value cannot be represented on the wire
    fn try_ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        self.ser(writer);
        Ok(())
    }

    /// Reads a value out of the incoming byte stream
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}
