use crate::error::SerdeErr;

/// A cursor over an incoming byte stream
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let byte = *self
            .buffer
            .get(self.cursor)
            .ok_or(SerdeErr::UnexpectedEof {
                needed: 1,
                remaining: 0,
            })?;
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'b [u8], SerdeErr> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(SerdeErr::UnexpectedEof {
                needed: count,
                remaining,
            });
        }
        let bytes = &self.buffer[self.cursor..self.cursor + count];
        self.cursor += count;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let mut output = [0_u8; N];
        output.copy_from_slice(self.read_bytes(N)?);
        Ok(output)
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn bytes_read(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
