use thiserror::Error;

/// Errors that can occur while reading wire primitives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran out of bytes before the value was complete
    #[error("Unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A boolean was encoded with a byte other than 0 or 1
    #[error("Invalid boolean byte {byte:#04x}, expected 0x00 or 0x01")]
    InvalidBool { byte: u8 },

    /// An enum was encoded with a discriminant it does not have
    #[error("Invalid {type_name} discriminant {byte:#04x}")]
    InvalidDiscriminant { type_name: &'static str, byte: u8 },

    /// A string payload was not valid UTF-8
    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    /// A length does not fit its `u32` prefix on the way out, or the
    /// platform's address space on the way in
    #[error("Length {length} does not fit its length prefix")]
    LengthOverflow { length: u64 },
}
