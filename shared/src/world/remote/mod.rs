pub mod decode_context;
pub mod deserializer;
pub mod node_reader;
