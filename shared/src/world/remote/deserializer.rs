use log::{debug, warn};

use crate::{
    replication_config::ReplicationConfig,
    world::{
        error::{DesyncError, ReplicationError},
        node::{node_ref::NodeRef, replicate::Replicate},
        registry::object_registry::ObjectRegistry,
        remote::{decode_context::DecodeContext, node_reader::NodeReader},
    },
};

/// The receiving side of a session. Owns the registry that mirrors the
/// sender's graph.
pub struct Deserializer {
    registry: ObjectRegistry,
    config: ReplicationConfig,
}

impl Deserializer {
    pub fn new(config: ReplicationConfig) -> Self {
        Self {
            registry: ObjectRegistry::new(),
            config,
        }
    }

    /// Apply one encoded pass, returning the root it describes. The first
    /// call for a root creates it, later calls update it in place.
    ///
    /// An error leaves the registry partially updated; the session should be
    /// rebuilt from a fresh serializer and deserializer pair.
    pub fn deserialize<T: Replicate>(
        &mut self,
        bytes: &[u8],
    ) -> Result<NodeRef<T>, ReplicationError> {
        let mut context = DecodeContext::new(bytes, &mut self.registry, &self.config);
        let result = NodeReader::read_root::<T>(&mut context).and_then(|root| {
            let remaining = context.remaining();
            if remaining > 0 && context.config().reject_trailing_bytes {
                return Err(DesyncError::TrailingBytes { remaining }.into());
            }
            Ok(root)
        });

        let evicted = self.registry.sweep();
        match &result {
            Ok(root) => debug!(
                "Decoded node {} from {} bytes, evicted {} nodes",
                root.ref_id(),
                bytes.len(),
                evicted
            ),
            Err(error) => warn!("Failed to decode {} bytes: {}", bytes.len(), error),
        }
        result
    }

    pub fn registry(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }
}

impl Default for Deserializer {
    fn default() -> Self {
        Self::new(ReplicationConfig::default())
    }
}
