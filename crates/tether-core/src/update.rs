use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::{InstanceHandle, InstanceId};

/// Manual invalidation for one instance.
///
/// The value carries no data; it only counts how many times a re-render was
/// forced. Every [`bump`](Self::bump) is counted, even when the renderer
/// coalesces several of them into one render.
pub struct ForcedUpdateCounter {
    value: Cell<u64>,
    owner: InstanceHandle,
}

impl ForcedUpdateCounter {
    pub(crate) fn new(owner: InstanceHandle) -> Self {
        Self {
            value: Cell::new(0),
            owner,
        }
    }

    pub fn value(&self) -> u64 {
        self.value.get()
    }

    pub fn instance(&self) -> InstanceId {
        self.owner.id()
    }

    pub fn bump(&self) {
        self.value.set(self.value.get() + 1);
        log::trace!(
            "forced update #{} for instance {:?}",
            self.value.get(),
            self.owner.id()
        );
        self.owner.invalidate();
    }
}

impl fmt::Debug for ForcedUpdateCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForcedUpdateCounter")
            .field("instance", &self.owner.id())
            .field("value", &self.value.get())
            .finish()
    }
}

/// Zero-argument trigger returned by [`use_update`](crate::use_update).
#[derive(Clone, Debug)]
pub struct UpdateTrigger(Rc<ForcedUpdateCounter>);

impl UpdateTrigger {
    pub(crate) fn new(counter: Rc<ForcedUpdateCounter>) -> Self {
        Self(counter)
    }

    /// Forces a re-render of the owning instance.
    pub fn trigger(&self) {
        self.0.bump();
    }

    /// Number of times this trigger has fired.
    pub fn count(&self) -> u64 {
        self.0.value()
    }

    pub fn instance(&self) -> InstanceId {
        self.0.instance()
    }

    /// Returns the trigger as a plain callback, e.g. for a click handler.
    pub fn as_callback(&self) -> impl Fn() + 'static {
        let counter = self.0.clone();
        move || counter.bump()
    }
}
