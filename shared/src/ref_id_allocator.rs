use crate::{types::RefId, world::error::ReplicationError};

/// Issues monotonically increasing [`RefId`]s, starting at 1.
///
/// Ids are never recycled. When a decoder learns of an id allocated by the
/// other side it calls [`RefIdAllocator::adopt`], so ids issued locally
/// afterwards cannot collide with it.
#[derive(Debug, Clone)]
pub struct RefIdAllocator {
    next: Option<u32>,
}

impl RefIdAllocator {
    pub fn new() -> Self {
        Self { next: Some(1) }
    }

    /// Try to issue the next id, failing once the `u32` space is used up
    pub fn try_allocate(&mut self) -> Result<RefId, ReplicationError> {
        let value = self.next.ok_or(ReplicationError::IdSpaceExhausted)?;
        self.next = value.checked_add(1);
        Ok(RefId::new(value))
    }

    /// Issue the next id
    ///
    /// # Panics
    ///
    /// Panics if every `u32` id has already been issued.
    /// Consider using `try_allocate` for non-panicking error handling.
    pub fn allocate(&mut self) -> RefId {
        self.try_allocate()
            .expect("RefIdAllocator has no ids left to issue")
    }

    /// Advance past an externally supplied id
    pub fn adopt(&mut self, ref_id: RefId) {
        let Some(next) = self.next else {
            return;
        };
        if ref_id.value() >= next {
            self.next = ref_id.value().checked_add(1);
        }
    }

    /// The id the next call to `allocate` will return, if any
    pub fn peek(&self) -> Option<RefId> {
        self.next.map(RefId::new)
    }
}

impl Default for RefIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
