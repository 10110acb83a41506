use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::types::RefId;

type ReleaseQueue = Rc<RefCell<VecDeque<RefId>>>;

// ReleaseChannel
pub(crate) struct ReleaseChannel;

impl ReleaseChannel {
    /// A queue of node ids whose reference count dropped to zero. Nodes hold
    /// the sending side, a registry holds the receiving side.
    pub fn new_channel() -> (ReleaseSender, ReleaseReceiver) {
        let queue: ReleaseQueue = Rc::new(RefCell::new(VecDeque::new()));
        let sender = ReleaseSender {
            queue: queue.clone(),
        };
        (sender, ReleaseReceiver { queue })
    }
}

// ReleaseSender
#[derive(Clone)]
pub(crate) struct ReleaseSender {
    queue: ReleaseQueue,
}

impl ReleaseSender {
    pub fn send(&self, ref_id: RefId) -> bool {
        let Ok(mut queue) = self.queue.try_borrow_mut() else {
            return false;
        };
        queue.push_back(ref_id);
        true
    }

    pub fn is_connected_to(&self, receiver: &ReleaseReceiver) -> bool {
        Rc::ptr_eq(&self.queue, &receiver.queue)
    }
}

// ReleaseReceiver
pub(crate) struct ReleaseReceiver {
    queue: ReleaseQueue,
}

impl ReleaseReceiver {
    pub fn new_sender(&self) -> ReleaseSender {
        ReleaseSender {
            queue: self.queue.clone(),
        }
    }

    pub fn try_recv(&self) -> Option<RefId> {
        self.queue.try_borrow_mut().ok()?.pop_front()
    }
}
