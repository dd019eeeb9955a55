//! Hooks for use inside [`Runtime::render`](crate::Runtime::render).
//!
//! Hooks are slot-based: the Nth hook call of a render pass always resolves
//! to the Nth slot of the instance, so every render must call the same hooks
//! in the same order.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::effects::effect_fn;
use crate::error::EffectPhase;
use crate::latest::LatestRef;
use crate::lifecycle::{LifecycleWatch, Phase};
use crate::runtime::{InstanceHandle, with_current};
use crate::update::{ForcedUpdateCounter, UpdateTrigger};

struct MountSlot;
struct UnmountSlot;

/// Returns a cell holding the value passed to the most recent render.
///
/// ```rust
/// use std::rc::Rc;
/// use tether_core::*;
///
/// let rt = Runtime::new(RuntimeConfig::default(), Rc::new(RenderQueue::new()));
/// let id = rt.create_instance();
///
/// let count = rt.render(id, || use_latest(1)).unwrap();
/// rt.render(id, || use_latest(2)).unwrap();
/// assert_eq!(count.get(), 2);
/// ```
pub fn use_latest<T: 'static>(value: T) -> LatestRef<T> {
    with_current(|instance| {
        let (slot, _) = instance.remember(|| RefCell::new(None::<LatestRef<T>>));
        let mut slot = slot.borrow_mut();
        if let Some(cell) = slot.as_ref() {
            cell.update(value);
            return cell.clone();
        }
        let cell = LatestRef::new(value);
        *slot = Some(cell.clone());
        cell
    })
}

/// A cell initialized once on the first render and left alone afterwards.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> LatestRef<T> {
    with_current(|instance| {
        let (cell, _) = instance.remember(|| LatestRef::new(init()));
        (*cell).clone()
    })
}

/// Runs `f` once, when the instance mounts. Later renders ignore `f`.
pub fn use_mount(f: impl FnOnce() + 'static) {
    with_current(|instance| {
        let (_, is_new) = instance.remember(|| MountSlot);
        if !is_new {
            return;
        }
        if instance.phase() != Phase::Pending {
            log::warn!(
                "use_mount first reached after instance {:?} mounted; callback dropped",
                instance.id()
            );
            return;
        }
        instance.register(EffectPhase::Mount, effect_fn(f));
    })
}

/// Runs `f` once, when the instance unmounts.
///
/// The closure from the latest render is the one that runs, so it sees the
/// latest captured values.
pub fn use_unmount(f: impl FnOnce() + 'static) {
    let latest = use_latest(Some(Box::new(f) as Box<dyn FnOnce()>));
    with_current(|instance| {
        let (_, is_new) = instance.remember(|| UnmountSlot);
        if is_new {
            instance.register(
                EffectPhase::Unmount,
                effect_fn(move || {
                    if let Some(f) = latest.take() {
                        f();
                    }
                }),
            );
        }
    })
}

/// `false` from mount until unmount, `true` from unmount on.
///
/// Delayed callbacks capture the returned cell and check it before writing
/// instance state.
pub fn use_unmounted_ref() -> LatestRef<bool> {
    let unmounted = use_ref(|| false);
    use_mount({
        let unmounted = unmounted.clone();
        move || unmounted.update(false)
    });
    use_unmount({
        let unmounted = unmounted.clone();
        move || unmounted.update(true)
    });
    unmounted
}

/// Returns a trigger that forces the current instance to re-render.
pub fn use_update() -> UpdateTrigger {
    with_current(|instance| {
        let (counter, _) =
            instance.remember(|| ForcedUpdateCounter::new(InstanceHandle::of(instance)));
        UpdateTrigger::new(counter)
    })
}

/// Read-only lifecycle of the current instance.
pub fn use_lifecycle() -> LifecycleWatch {
    with_current(|instance| instance.watch())
}

struct ReducerCell<S, A> {
    state: RefCell<S>,
    reducer: RefCell<Rc<dyn Fn(&S, A) -> S>>,
    owner: InstanceHandle,
}

/// Dispatcher returned by [`use_reducer`].
pub struct Dispatch<S: 'static, A: 'static>(Rc<ReducerCell<S, A>>);

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S, A> Dispatch<S, A> {
    /// Applies `action` and requests a re-render. Actions sent after the
    /// instance unmounted are dropped.
    pub fn dispatch(&self, action: A) {
        let cell = &self.0;
        if cell.owner.is_gone() {
            log::warn!(
                "dispatch on unmounted instance {:?}; action dropped",
                cell.owner.id()
            );
            return;
        }
        let reducer = cell.reducer.borrow().clone();
        let next = reducer(&cell.state.borrow(), action);
        *cell.state.borrow_mut() = next;
        cell.owner.invalidate();
    }

    /// State as of the last dispatch, which may be newer than the value
    /// returned by the last render.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.0.state.borrow().clone()
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Dispatch<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("instance", &self.0.owner.id())
            .field("state", &*self.0.state.borrow())
            .finish()
    }
}

/// Reducer state for the current instance. The reducer from the latest
/// render is the one applied by [`Dispatch::dispatch`].
pub fn use_reducer<S, A>(
    init: impl FnOnce() -> S,
    reducer: impl Fn(&S, A) -> S + 'static,
) -> (S, Dispatch<S, A>)
where
    S: Clone + 'static,
    A: 'static,
{
    let reducer: Rc<dyn Fn(&S, A) -> S> = Rc::new(reducer);
    with_current(|instance| {
        let (cell, is_new) = instance.remember(|| ReducerCell {
            state: RefCell::new(init()),
            reducer: RefCell::new(reducer.clone()),
            owner: InstanceHandle::of(instance),
        });
        if !is_new {
            *cell.reducer.borrow_mut() = reducer;
        }
        let state = cell.state.borrow().clone();
        (state, Dispatch(cell))
    })
}
