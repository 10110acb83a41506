use diffgraph_shared::{
    Deserializer, NodeRef, RefIdAllocator, Replicate, ReplicationConfig, Serializer,
};

/// A serializer and deserializer pair standing in for two peers on a
/// reliable, ordered channel
pub struct TestSession {
    pub ids: RefIdAllocator,
    pub sender: Serializer,
    pub receiver: Deserializer,
}

impl TestSession {
    pub fn new() -> Self {
        Self::with_config(ReplicationConfig::default())
    }

    pub fn with_config(config: ReplicationConfig) -> Self {
        Self {
            ids: RefIdAllocator::new(),
            sender: Serializer::new(config.clone()),
            receiver: Deserializer::new(config),
        }
    }

    /// Wrap a value in a new sender-side node
    pub fn node<T: Replicate>(&mut self, value: T) -> NodeRef<T> {
        NodeRef::new(&mut self.ids, value)
    }

    pub fn send<T: Replicate>(&mut self, root: &NodeRef<T>) -> Vec<u8> {
        self.sender
            .serialize(root)
            .expect("encoding should succeed")
    }

    pub fn receive<T: Replicate>(&mut self, bytes: &[u8]) -> NodeRef<T> {
        self.receiver
            .deserialize(bytes)
            .expect("decoding should succeed")
    }

    /// Send one pass and apply it, returning the receiver's root
    pub fn sync<T: Replicate>(&mut self, root: &NodeRef<T>) -> NodeRef<T> {
        let bytes = self.send(root);
        self.receive(&bytes)
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}
