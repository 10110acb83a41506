pub mod change_tracker;
pub mod node_ref;
pub mod operation;
pub mod property;
pub mod property_mutate;
pub mod ref_property;
pub mod replicate;
pub mod schema;
