use diffgraph_serde::ByteReader;

use crate::{
    replication_config::ReplicationConfig,
    types::RefId,
    world::{
        error::{DesyncError, ReplicationError},
        node::{node_ref::NodeRef, replicate::Replicate},
        registry::object_registry::ObjectRegistry,
    },
};

/// State carried through one decode pass
pub struct DecodeContext<'a> {
    reader: ByteReader<'a>,
    registry: &'a mut ObjectRegistry,
    config: &'a ReplicationConfig,
    depth: u16,
}

impl<'a> DecodeContext<'a> {
    pub fn new(
        bytes: &'a [u8],
        registry: &'a mut ObjectRegistry,
        config: &'a ReplicationConfig,
    ) -> Self {
        Self {
            reader: ByteReader::new(bytes),
            registry,
            config,
            depth: 0,
        }
    }

    pub fn reader(&mut self) -> &mut ByteReader<'a> {
        &mut self.reader
    }

    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    pub fn config(&self) -> &ReplicationConfig {
        self.config
    }

    pub(crate) fn registry(&mut self) -> &mut ObjectRegistry {
        self.registry
    }

    /// Typed lookup of a node the stream refers to by id
    pub(crate) fn resolve<T: Replicate>(
        &self,
        ref_id: RefId,
        operation: &'static str,
    ) -> Result<NodeRef<T>, ReplicationError> {
        self.registry.resolve::<T>(ref_id, operation)
    }

    pub(crate) fn enter_frame(&mut self) -> Result<(), ReplicationError> {
        if self.depth >= self.config.max_depth {
            return Err(DesyncError::DepthLimitExceeded {
                limit: self.config.max_depth,
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_frame(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
