use std::default::Default;

/// Contains Config properties which will be used by a Serializer or Deserializer
#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    /// Maximum nesting of node frames the decoder will follow before giving
    /// up on the stream
    pub max_depth: u16,
    /// Whether `deserialize` should fail if bytes remain after the root frame
    pub reject_trailing_bytes: bool,
    /// Starting capacity of the encoder's output buffer, in bytes
    pub initial_buffer_capacity: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            reject_trailing_bytes: true,
            initial_buffer_capacity: 256,
        }
    }
}
