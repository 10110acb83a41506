//! # Diffgraph Shared
//! Delta replication of a mutable object graph: nodes track which of their
//! properties changed, a serializer encodes only those changes, and a
//! deserializer applies them to a mirrored graph on the other side.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use diffgraph_serde::{ByteReader, ByteWrite, ByteWriter, Serde, SerdeErr};

mod ref_id_allocator;
mod replication_config;
mod types;
mod world;

pub use ref_id_allocator::RefIdAllocator;
pub use replication_config::ReplicationConfig;
pub use types::{PropertyIndex, RefId, MAX_PROPERTIES};
pub use world::{
    error::{DesyncError, ReplicationError},
    host::{
        encode_context::EncodeContext,
        node_writer::{FrameMode, NodeWriter},
        serializer::Serializer,
        transmit_ledger::TransmitLedger,
    },
    node::{
        change_tracker::ChangeTracker,
        node_ref::{ErasedNode, NodeRef},
        operation::OperationCode,
        property::Property,
        property_mutate::{PropertyMutate, PropertyMutator},
        ref_property::RefProperty,
        replicate::{PropertyCodec, PropertyIndexer, PropertySite, Replicate, ReplicatedProperty},
        schema::{PropertyDescriptor, Scalar, Schema, WireType},
    },
    registry::object_registry::ObjectRegistry,
    remote::{
        decode_context::DecodeContext, deserializer::Deserializer, node_reader::NodeReader,
    },
};
