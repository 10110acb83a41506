use thiserror::Error;

use diffgraph_serde::SerdeErr;

use crate::{types::RefId, world::node::operation::OperationCode};

/// Errors that can occur while registering, encoding or decoding nodes
///
/// Every variant is fatal to the encode/decode call that produced it. The
/// channel is assumed reliable and ordered, so a mismatch means the two
/// registries have diverged and the session must be rebuilt from a fresh
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// A registry already holds a node with this id
    #[error("Node {ref_id} is already registered")]
    DuplicateRegistration { ref_id: RefId },

    /// A registry holds no node with this id
    #[error("Node {ref_id} not found in registry, cannot {operation}")]
    NotFound {
        ref_id: RefId,
        operation: &'static str,
    },

    /// The incoming stream does not agree with local state
    #[error("Protocol desync: {0}")]
    ProtocolDesync(#[from] DesyncError),

    /// A scalar payload or frame header could not be read
    #[error("Malformed stream: {0}")]
    Serde(#[from] SerdeErr),

    /// The identifier allocator has issued every `u32`
    #[error("RefId space exhausted, no further nodes can be created")]
    IdSpaceExhausted,
}

/// Ways an incoming stream can disagree with the receiver's state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesyncError {
    /// Operation byte outside the known set
    #[error("unknown operation byte {byte:#04x}")]
    UnknownOperation { byte: u8 },

    /// A valid operation that makes no sense for this property
    #[error("operation {operation:?} is not valid for {type_name}.{property}")]
    UnexpectedOperation {
        type_name: &'static str,
        property: &'static str,
        operation: OperationCode,
    },

    /// `Update` arrived for a reference property that currently holds nothing
    #[error("{type_name}.{property} holds no reference to update")]
    MissingReference {
        type_name: &'static str,
        property: &'static str,
    },

    /// A nested frame names a different node than the one the property holds
    #[error("expected frame for node {expected}, found {actual}")]
    RefIdMismatch { expected: RefId, actual: RefId },

    /// A registered node has a different type than the property expects
    #[error("node {ref_id} is a {actual}, expected a {expected}")]
    TypeMismatch {
        ref_id: RefId,
        expected: &'static str,
        actual: &'static str,
    },

    /// The dirty mask names properties the type does not declare
    #[error("dirty mask {mask:#010x} names properties {type_name} does not declare")]
    UnknownPropertyBits { type_name: &'static str, mask: u32 },

    /// A frame refers back to a node that is already being decoded
    #[error("node {ref_id} is referenced from inside its own frame")]
    ReentrantFrame { ref_id: RefId },

    /// Frames nested deeper than the configured limit
    #[error("frames nested deeper than {limit}")]
    DepthLimitExceeded { limit: u16 },

    /// Bytes left over after the root frame
    #[error("{remaining} bytes remain after the root frame")]
    TrailingBytes { remaining: usize },
}
