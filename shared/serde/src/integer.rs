use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

// Integers are written in their natural width, little-endian.
macro_rules! impl_serde_integer {
    ($($int:ty),*) => {
        $(
            impl Serde for $int {
                fn ser(&self, writer: &mut dyn ByteWrite) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    Ok(<$int>::from_le_bytes(reader.read_array()?))
                }
            }
        )*
    };
}

impl_serde_integer!(u8, u16, u32, u64, i8, i16, i32, i64);
