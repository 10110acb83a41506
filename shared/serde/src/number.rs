use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

// Floats

impl Serde for f32 {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_bytes(&self.to_bits().to_le_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(f32::from_bits(u32::from_le_bytes(reader.read_array()?)))
    }
}

impl Serde for f64 {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_bytes(&self.to_bits().to_le_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(f64::from_bits(u64::from_le_bytes(reader.read_array()?)))
    }
}

// Booleans

impl Serde for bool {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(SerdeErr::InvalidBool { byte }),
        }
    }
}
