//! # Diffgraph Serde
//! Byte-level wire primitives used by the replication core. All multi-byte
//! values are written little-endian.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod error;
mod integer;
mod number;
mod serde;
mod string;

pub use byte_reader::ByteReader;
pub use byte_writer::{ByteWrite, ByteWriter};
pub use error::SerdeErr;
pub use serde::Serde;
