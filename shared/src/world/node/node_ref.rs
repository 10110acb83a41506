use std::{
    any::Any,
    cell::{BorrowMutError, Cell, Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

use log::warn;

use crate::{
    ref_id_allocator::RefIdAllocator,
    types::{PropertyIndex, RefId},
    world::{
        error::ReplicationError,
        node::{
            change_tracker::ChangeTracker, operation::OperationCode,
            property_mutate::PropertyMutator, replicate::Replicate,
        },
        registry::release_channel::{ReleaseReceiver, ReleaseSender},
    },
};

struct NodeCell<T: Replicate> {
    ref_id: RefId,
    ref_count: Cell<u32>,
    tracker: Rc<RefCell<ChangeTracker>>,
    subscribers: RefCell<Vec<ReleaseSender>>,
    value: RefCell<T>,
}

impl<T: Replicate> NodeCell<T> {
    fn notify_released(&self) {
        let Ok(subscribers) = self.subscribers.try_borrow() else {
            warn!("Node {} released while its subscribers were busy", self.ref_id);
            return;
        };
        for subscriber in subscribers.iter() {
            subscriber.send(self.ref_id);
        }
    }
}

/// A shared handle to a replicated node.
///
/// Cloning a `NodeRef` clones the handle, not the node: every clone sees the
/// same value, id and tracker. Handles do not count toward `ref_count`, only
/// [`RefProperty`](crate::RefProperty) edges do.
pub struct NodeRef<T: Replicate> {
    cell: Rc<NodeCell<T>>,
}

impl<T: Replicate> NodeRef<T> {
    /// Wrap `value` in a new node with a freshly allocated id
    ///
    /// # Panics
    ///
    /// Panics if the allocator has run out of ids.
    /// Consider using `try_new` for non-panicking error handling.
    pub fn new(ids: &mut RefIdAllocator, value: T) -> Self {
        Self::with_ref_id(ids.allocate(), value)
    }

    /// Try to wrap `value` in a new node with a freshly allocated id
    pub fn try_new(ids: &mut RefIdAllocator, value: T) -> Result<Self, ReplicationError> {
        Ok(Self::with_ref_id(ids.try_allocate()?, value))
    }

    /// Builds a node around an id that was issued elsewhere
    pub(crate) fn with_ref_id(ref_id: RefId, mut value: T) -> Self {
        let tracker = Rc::new(RefCell::new(ChangeTracker::new()));
        value.set_mutator(&PropertyMutator::new(tracker.clone()));
        Self {
            cell: Rc::new(NodeCell {
                ref_id,
                ref_count: Cell::new(0),
                tracker,
                subscribers: RefCell::new(Vec::new()),
                value: RefCell::new(value),
            }),
        }
    }

    pub fn ref_id(&self) -> RefId {
        self.cell.ref_id
    }

    /// Number of reference properties currently pointing at this node
    pub fn ref_count(&self) -> u32 {
        self.cell.ref_count.get()
    }

    /// # Panics
    ///
    /// Panics if the value is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.value.borrow()
    }

    /// # Panics
    ///
    /// Panics if the value is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.value.borrow_mut()
    }

    pub(crate) fn try_borrow(&self) -> Option<Ref<'_, T>> {
        self.cell.value.try_borrow().ok()
    }

    pub(crate) fn try_borrow_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.cell.value.try_borrow_mut()
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    pub fn dirty_bitmask(&self) -> u32 {
        self.cell.tracker.borrow().dirty_bitmask()
    }

    pub fn pending_op(&self, index: PropertyIndex) -> Option<OperationCode> {
        self.cell.tracker.borrow().pending_op(index)
    }

    /// Whether any property of this node itself has changed since its last
    /// encode. Changes inside referenced nodes are not counted.
    pub fn is_dirty(&self) -> bool {
        !self.cell.tracker.borrow().is_clear()
    }

    /// A copy of the node's current change record
    pub fn tracker(&self) -> ChangeTracker {
        self.cell.tracker.borrow().clone()
    }

    pub(crate) fn has_been_flushed(&self) -> bool {
        self.cell.tracker.borrow().has_been_flushed()
    }

    pub(crate) fn flush(&self) {
        self.cell.tracker.borrow_mut().flush();
    }

    /// A type-erased handle to the same node
    pub fn erase(&self) -> ErasedNode {
        ErasedNode {
            inner: self.cell.clone(),
        }
    }

    /// Counts one more edge into this node, returning the count before it
    pub(crate) fn acquire(&self) -> u32 {
        let prior = self.cell.ref_count.get();
        self.cell.ref_count.set(prior.saturating_add(1));
        prior
    }

    /// Counts one edge less, notifying subscribed registries when the last
    /// one goes
    pub(crate) fn release(&self) {
        let prior = self.cell.ref_count.get();
        if prior == 0 {
            warn!("Node {} released with no references held", self.cell.ref_id);
            return;
        }
        self.cell.ref_count.set(prior - 1);
        if prior == 1 {
            self.cell.notify_released();
        }
    }
}

impl<T: Replicate> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Replicate> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("type", &T::type_name())
            .field("ref_id", &self.ref_id())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

/// What a registry needs from a node without knowing its type
trait NodeDyn {
    fn ref_id(&self) -> RefId;
    fn ref_count(&self) -> u32;
    fn type_name(&self) -> &'static str;
    fn is_tracker_clear(&self) -> bool;
    fn children(&self) -> Vec<ErasedNode>;
    fn detach_references(&self);
    fn subscribe(&self, sender: ReleaseSender);
    fn unsubscribe(&self, receiver: &ReleaseReceiver);
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Replicate> NodeDyn for NodeCell<T> {
    fn ref_id(&self) -> RefId {
        self.ref_id
    }

    fn ref_count(&self) -> u32 {
        self.ref_count.get()
    }

    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn is_tracker_clear(&self) -> bool {
        self.tracker
            .try_borrow()
            .map_or(false, |tracker| tracker.is_clear())
    }

    fn children(&self) -> Vec<ErasedNode> {
        let Ok(value) = self.value.try_borrow() else {
            return Vec::new();
        };
        let children = value
            .properties()
            .into_iter()
            .filter_map(|property| property.child())
            .collect();
        children
    }

    fn detach_references(&self) {
        let Ok(mut value) = self.value.try_borrow_mut() else {
            warn!(
                "Node {} evicted while borrowed, its references stay counted",
                self.ref_id
            );
            return;
        };
        value
            .properties_mut()
            .into_iter()
            .for_each(|property| property.detach_remote());
    }

    fn subscribe(&self, sender: ReleaseSender) {
        self.subscribers.borrow_mut().push(sender);
    }

    fn unsubscribe(&self, receiver: &ReleaseReceiver) {
        self.subscribers
            .borrow_mut()
            .retain(|sender| !sender.is_connected_to(receiver));
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A type-erased [`NodeRef`], as held by an [`ObjectRegistry`](crate::ObjectRegistry)
#[derive(Clone)]
pub struct ErasedNode {
    inner: Rc<dyn NodeDyn>,
}

impl ErasedNode {
    pub fn ref_id(&self) -> RefId {
        self.inner.ref_id()
    }

    pub fn ref_count(&self) -> u32 {
        self.inner.ref_count()
    }

    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    pub fn is<T: Replicate>(&self) -> bool {
        self.downcast::<T>().is_some()
    }

    /// Recover the typed handle, if the node holds a `T`
    pub fn downcast<T: Replicate>(&self) -> Option<NodeRef<T>> {
        let cell = self.inner.clone().into_any().downcast::<NodeCell<T>>().ok()?;
        Some(NodeRef { cell })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the node's own tracker has nothing pending
    pub(crate) fn is_tracker_clear(&self) -> bool {
        self.inner.is_tracker_clear()
    }

    /// Nodes referenced by this node's properties, in declaration order
    pub(crate) fn children(&self) -> Vec<ErasedNode> {
        self.inner.children()
    }

    /// Releases every node this node references. Handles to the node stay
    /// valid but no longer count toward anything.
    pub(crate) fn detach_references(&self) {
        self.inner.detach_references();
    }

    pub(crate) fn subscribe(&self, sender: ReleaseSender) {
        self.inner.subscribe(sender);
    }

    pub(crate) fn unsubscribe(&self, receiver: &ReleaseReceiver) {
        self.inner.unsubscribe(receiver);
    }
}

impl fmt::Debug for ErasedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedNode")
            .field("type", &self.type_name())
            .field("ref_id", &self.ref_id())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}
