
pub use helpers::*;
pub use test_protocol::{describe, Describe, Entity, GameState, Item, PrimitiveTypes};
