pub mod encode_context;
pub mod node_writer;
pub mod serializer;
pub mod transmit_ledger;
