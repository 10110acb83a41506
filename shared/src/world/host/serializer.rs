use log::{debug, warn};

use crate::{
    replication_config::ReplicationConfig,
    world::{
        error::ReplicationError,
        host::{
            encode_context::EncodeContext, node_writer::NodeWriter,
            transmit_ledger::TransmitLedger,
        },
        node::{node_ref::NodeRef, replicate::Replicate},
    },
};

/// The sending side of a session. Keeps the ledger of which nodes the
/// receiver holds, so each pass can send known nodes by id.
pub struct Serializer {
    ledger: TransmitLedger,
    config: ReplicationConfig,
}

impl Serializer {
    pub fn new(config: ReplicationConfig) -> Self {
        Self {
            ledger: TransmitLedger::new(),
            config,
        }
    }

    /// Encode everything that changed under `root` since the last call, and
    /// clear the trackers of every node written.
    ///
    /// An error leaves the ledger and some trackers partially updated; the
    /// session should be rebuilt from a fresh serializer and deserializer
    /// pair.
    pub fn serialize<T: Replicate>(
        &mut self,
        root: &NodeRef<T>,
    ) -> Result<Vec<u8>, ReplicationError> {
        let mut context =
            EncodeContext::new(&mut self.ledger, self.config.initial_buffer_capacity);
        let result = NodeWriter::write_root(root, &mut context);
        let bytes = context.into_bytes();

        let evicted = self.ledger.sweep();
        if let Err(error) = result {
            warn!("Failed to encode node {}: {}", root.ref_id(), error);
            return Err(error);
        }
        debug!(
            "Encoded node {} into {} bytes, receiver evicts {} nodes",
            root.ref_id(),
            bytes.len(),
            evicted
        );
        Ok(bytes)
    }

    pub fn ledger(&self) -> &TransmitLedger {
        &self.ledger
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(ReplicationConfig::default())
    }
}
