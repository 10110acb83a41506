use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

// Strings are a u32 byte length followed by the UTF-8 bytes, no terminator.
impl Serde for String {
    /// # Panics
    ///
    /// Panics if the string is longer than `u32::MAX` bytes.
    /// Consider using `try_ser` for non-panicking error handling.
    fn ser(&self, writer: &mut dyn ByteWrite) {
        if let Err(error) = self.try_ser(writer) {
            panic!("{}", error);
        }
    }

    fn try_ser(&self, writer: &mut dyn ByteWrite) -> Result<(), SerdeErr> {
        length_prefix(self.len())?.ser(writer);
        writer.write_bytes(self.as_bytes());
        Ok(())
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = u32::de(reader)?;
        let length = usize::try_from(length).map_err(|_| SerdeErr::LengthOverflow {
            length: u64::from(length),
        })?;
        let bytes = reader.read_bytes(length)?;
        let value = std::str::from_utf8(bytes).map_err(|_| SerdeErr::InvalidUtf8)?;
        Ok(value.to_owned())
    }
}

fn length_prefix(length: usize) -> Result<u32, SerdeErr> {
    u32::try_from(length).map_err(|_| SerdeErr::LengthOverflow {
        length: length as u64,
    })
}
