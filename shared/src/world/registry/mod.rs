pub mod object_registry;
pub(crate) mod release_channel;
