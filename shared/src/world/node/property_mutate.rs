use std::{cell::RefCell, rc::Rc};

use crate::{types::PropertyIndex, world::node::operation::OperationCode};

/// Receives notice of property mutations
pub trait PropertyMutate {
    /// Returns false if the mutation could not be recorded
    fn mutate(&mut self, property_index: PropertyIndex, operation: OperationCode) -> bool;
}

/// Shared handle through which a property reports changes to the tracker of
/// the node that owns it
#[derive(Clone)]
pub struct PropertyMutator {
    inner: Rc<RefCell<dyn PropertyMutate>>,
}

impl PropertyMutator {
    pub fn new(mutator: Rc<RefCell<dyn PropertyMutate>>) -> Self {
        Self { inner: mutator }
    }

    pub fn mutate(&self, property_index: PropertyIndex, operation: OperationCode) -> bool {
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            return false;
        };
        inner.mutate(property_index, operation)
    }
}
