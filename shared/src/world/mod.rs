pub mod error;
pub mod host;
pub mod node;
pub mod registry;
pub mod remote;
