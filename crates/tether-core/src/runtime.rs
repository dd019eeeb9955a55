use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};

use crate::config::{RemountPolicy, RuntimeConfig};
use crate::effects::{EffectFn, EffectQueue, effect_fn, fallible_effect_fn, run_effects};
use crate::error::{BoxError, EffectPhase, LifecycleViolation, Result, ViolationKind};
use crate::lifecycle::{LifecycleSignal, LifecycleWatch, Phase};
use crate::renderer::Renderer;
use crate::update::{ForcedUpdateCounter, UpdateTrigger};

new_key_type! {
    /// Identity of one instance. Stable across re-renders; a removed
    /// instance's id is never handed out again.
    pub struct InstanceId;
}

thread_local! {
    static CURRENT_INSTANCE: RefCell<Option<Rc<Instance>>> = const { RefCell::new(None) };
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct InstanceFlags: u8 {
        /// At least one render pass has completed.
        const RENDERED = 1 << 0;
        const RENDERING = 1 << 1;
        /// A re-render was requested and the instance has not rendered since.
        const RENDER_REQUESTED = 1 << 2;
        /// Mount callbacks are being drained.
        const MOUNTING = 1 << 3;
    }
}

/// Per-instance storage: hook slots, lifecycle and effect queue.
pub(crate) struct Instance {
    id: InstanceId,
    lifecycle: RefCell<LifecycleSignal>,
    flags: Cell<InstanceFlags>,
    slots: RefCell<Vec<Box<dyn Any>>>,
    cursor: Cell<usize>,
    effects: RefCell<EffectQueue>,
    renderer: Rc<dyn Renderer>,
}

impl Instance {
    fn new(id: InstanceId, renderer: Rc<dyn Renderer>) -> Self {
        Self {
            id,
            lifecycle: RefCell::new(LifecycleSignal::new()),
            flags: Cell::new(InstanceFlags::empty()),
            slots: RefCell::new(Vec::new()),
            cursor: Cell::new(0),
            effects: RefCell::new(EffectQueue::default()),
            renderer,
        }
    }

    pub(crate) fn id(&self) -> InstanceId {
        self.id
    }

    pub(crate) fn phase(&self) -> Phase {
        self.lifecycle.borrow().phase()
    }

    pub(crate) fn watch(&self) -> LifecycleWatch {
        self.lifecycle.borrow().watch()
    }

    fn has(&self, flag: InstanceFlags) -> bool {
        self.flags.get().contains(flag)
    }

    fn set(&self, flag: InstanceFlags, on: bool) {
        let mut flags = self.flags.get();
        flags.set(flag, on);
        self.flags.set(flags);
    }

    fn violation(&self, kind: ViolationKind) -> LifecycleViolation {
        LifecycleViolation::new(kind, self.phase()).for_instance(self.id)
    }

    /// Positional slot lookup. The Nth call in a render pass always returns
    /// the Nth stored value.
    pub(crate) fn remember<T: 'static>(&self, init: impl FnOnce() -> T) -> (Rc<T>, bool) {
        let cursor = self.cursor.get();
        self.cursor.set(cursor + 1);

        {
            let slots = self.slots.borrow();
            if let Some(slot) = slots.get(cursor) {
                if let Some(rc) = slot.downcast_ref::<Rc<T>>() {
                    return (rc.clone(), false);
                }
                log::warn!(
                    "remember: slot {} of instance {:?} changed type; replacing. \
                     Hooks must be called in the same order on every render.",
                    cursor,
                    self.id
                );
            }
        }

        let rc: Rc<T> = Rc::new(init());
        let mut slots = self.slots.borrow_mut();
        if cursor < slots.len() {
            slots[cursor] = Box::new(rc.clone());
        } else {
            slots.push(Box::new(rc.clone()));
        }
        (rc, true)
    }

    pub(crate) fn register(&self, phase: EffectPhase, f: EffectFn) {
        self.effects.borrow_mut().push(phase, f);
    }

    /// Asks the renderer for a re-render unless one is already outstanding.
    /// Returns `false` when the request was coalesced.
    pub(crate) fn request_render(&self) -> bool {
        if self.has(InstanceFlags::RENDER_REQUESTED) {
            return false;
        }
        self.set(InstanceFlags::RENDER_REQUESTED, true);
        self.renderer.request_render(self.id);
        true
    }

    fn run_phase(&self, phase: EffectPhase, isolate_panics: bool) {
        let effects = self.effects.borrow_mut().take(phase);
        if effects.is_empty() {
            return;
        }
        for error in run_effects(self.id, phase, effects, isolate_panics) {
            self.renderer.effect_error(error);
        }
    }
}

/// Makes an instance current for hook calls and restores the previous one
/// when dropped, including during unwinding.
struct RenderGuard {
    instance: Rc<Instance>,
    prev: Option<Rc<Instance>>,
}

impl RenderGuard {
    fn enter(instance: Rc<Instance>) -> Self {
        instance.set(InstanceFlags::RENDERING, true);
        instance.set(InstanceFlags::RENDER_REQUESTED, false);
        instance.cursor.set(0);
        let prev = CURRENT_INSTANCE.with(|c| c.replace(Some(instance.clone())));
        Self { instance, prev }
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        self.instance.set(InstanceFlags::RENDERING, false);
        let prev = self.prev.take();
        CURRENT_INSTANCE.with(|c| *c.borrow_mut() = prev);
    }
}

/// Holds `MOUNTING` for the duration of the mount drain, cleared on unwind.
struct MountGuard<'a>(&'a Instance);

impl<'a> MountGuard<'a> {
    fn enter(instance: &'a Instance) -> Self {
        instance.set(InstanceFlags::MOUNTING, true);
        Self(instance)
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        self.0.set(InstanceFlags::MOUNTING, false);
    }
}

/// Runs `f` against the instance currently rendering.
///
/// # Panics
///
/// Panics when called outside [`Runtime::render`]: hooks have no instance
/// to attach to.
pub(crate) fn with_current<R>(f: impl FnOnce(&Rc<Instance>) -> R) -> R {
    let instance = CURRENT_INSTANCE.with(|c| c.borrow().clone());
    match instance {
        Some(instance) => f(&instance),
        None => panic!("hook called outside of a render pass (no current instance)"),
    }
}

/// Id of the instance currently rendering, if any.
pub fn current_instance() -> Option<InstanceId> {
    CURRENT_INSTANCE.with(|c| c.borrow().as_ref().map(|i| i.id))
}

/// Slot-based remember for the instance currently rendering.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    with_current(|instance| instance.remember(init).0)
}

/// Drives instance lifecycles on behalf of an external renderer.
///
/// The renderer reports three things: an instance rendered
/// ([`render`](Self::render)), its first render was committed
/// ([`mount`](Self::mount)), and it left the tree
/// ([`unmount`](Self::unmount)). In return it receives re-render requests and
/// effect errors through its [`Renderer`] implementation.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
    config: RuntimeConfig,
    renderer: Rc<dyn Renderer>,
    instances: RefCell<SlotMap<InstanceId, Rc<Instance>>>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig, renderer: Rc<dyn Renderer>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                renderer,
                instances: RefCell::new(SlotMap::with_key()),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn len(&self) -> usize {
        self.inner.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_alive(&self, id: InstanceId) -> bool {
        self.inner.instances.borrow().contains_key(id)
    }

    pub fn create_instance(&self) -> InstanceId {
        let renderer = self.inner.renderer.clone();
        let id = self
            .inner
            .instances
            .borrow_mut()
            .insert_with_key(|id| Rc::new(Instance::new(id, renderer)));
        log::debug!("instance {id:?} created");
        id
    }

    fn instance(&self, id: InstanceId) -> std::result::Result<Rc<Instance>, LifecycleViolation> {
        self.inner.instances.borrow().get(id).cloned().ok_or_else(|| {
            LifecycleViolation::new(ViolationKind::TerminalInstance, Phase::Unmounted)
                .for_instance(id)
        })
    }

    pub fn lifecycle(&self, id: InstanceId) -> Result<LifecycleWatch> {
        Ok(self.instance(id)?.watch())
    }

    /// Renders `id`: hook calls inside `f` resolve against this instance.
    ///
    /// An instance whose unmount callbacks are running is already terminal
    /// and cannot render.
    pub fn render<R>(&self, id: InstanceId, f: impl FnOnce() -> R) -> Result<R> {
        let instance = self.instance(id)?;
        if instance.has(InstanceFlags::RENDERING) {
            return Err(instance.violation(ViolationKind::ReentrantRender).into());
        }
        if instance.phase() == Phase::Unmounted {
            return Err(instance.violation(ViolationKind::TerminalInstance).into());
        }

        let guard = RenderGuard::enter(instance.clone());
        let out = f();
        drop(guard);

        instance.set(InstanceFlags::RENDERED, true);
        Ok(out)
    }

    /// Commits the first render of `id` and runs its mount callbacks.
    pub fn mount(&self, id: InstanceId) -> Result<()> {
        let instance = self.instance(id)?;
        if instance.has(InstanceFlags::RENDERING) {
            return Err(instance.violation(ViolationKind::ReentrantRender).into());
        }
        if instance.phase() == Phase::Pending && !instance.has(InstanceFlags::RENDERED) {
            return Err(instance.violation(ViolationKind::MountBeforeRender).into());
        }
        instance
            .lifecycle
            .borrow()
            .mark_mounted()
            .map_err(|v| v.for_instance(id))?;
        log::debug!(
            "instance {id:?} mounted; {} mount callbacks",
            instance.effects.borrow().len(EffectPhase::Mount)
        );

        let _mounting = MountGuard::enter(&instance);
        instance.run_phase(EffectPhase::Mount, self.inner.config.isolate_panics);
        Ok(())
    }

    /// Removes `id` from the tree. Its unmount callbacks run after the
    /// lifecycle signal reads unmounted and before its hook slots are dropped.
    pub fn unmount(&self, id: InstanceId) -> Result<()> {
        let instance = self.instance(id)?;
        self.teardown(&instance)?;

        self.inner.instances.borrow_mut().remove(id);
        instance.effects.borrow_mut().clear();
        log::debug!("instance {id:?} removed");
        Ok(())
    }

    /// Every mount callback finishes before the first unmount callback
    /// starts, so a mount callback cannot unmount its own instance.
    fn teardown(&self, instance: &Instance) -> Result<()> {
        if instance.has(InstanceFlags::RENDERING) {
            return Err(instance.violation(ViolationKind::ReentrantRender).into());
        }
        if instance.has(InstanceFlags::MOUNTING) {
            return Err(instance.violation(ViolationKind::UnmountDuringMount).into());
        }
        instance
            .lifecycle
            .borrow()
            .mark_unmounted()
            .map_err(|v| v.for_instance(instance.id))?;
        log::debug!("instance {:?} unmounted", instance.id);

        instance.run_phase(EffectPhase::Unmount, self.inner.config.isolate_panics);
        Ok(())
    }

    /// Drops an instance that rendered but was never committed. No callbacks
    /// run.
    pub fn discard(&self, id: InstanceId) -> Result<()> {
        let instance = self.instance(id)?;
        if instance.has(InstanceFlags::RENDERING) {
            return Err(instance.violation(ViolationKind::ReentrantRender).into());
        }
        if instance.phase() != Phase::Pending {
            return Err(instance.violation(ViolationKind::DiscardMounted).into());
        }

        self.inner.instances.borrow_mut().remove(id);
        instance.effects.borrow_mut().clear();
        log::debug!("instance {id:?} discarded");
        Ok(())
    }

    /// Unmounts `id` and returns its identity to `Pending` with empty hook
    /// slots and a fresh lifecycle signal. Watches taken before the remount
    /// keep reading unmounted.
    pub fn remount(&self, id: InstanceId) -> Result<()> {
        let instance = self.instance(id)?;
        if self.inner.config.remount_policy != RemountPolicy::Reset {
            return Err(instance.violation(ViolationKind::RemountDisabled).into());
        }
        self.teardown(&instance)?;

        instance.effects.borrow_mut().clear();
        let old_slots = std::mem::take(&mut *instance.slots.borrow_mut());
        drop(old_slots);
        instance.cursor.set(0);
        instance.flags.set(InstanceFlags::empty());
        *instance.lifecycle.borrow_mut() = LifecycleSignal::new();
        log::debug!("instance {id:?} reset for remount");
        Ok(())
    }

    /// Registers `f` to run once when `id` mounts.
    pub fn on_mount(&self, id: InstanceId, f: impl FnOnce() + 'static) -> Result<()> {
        self.register_mount(id, effect_fn(f))
    }

    pub fn try_on_mount<E>(
        &self,
        id: InstanceId,
        f: impl FnOnce() -> std::result::Result<(), E> + 'static,
    ) -> Result<()>
    where
        E: Into<BoxError>,
    {
        self.register_mount(id, fallible_effect_fn(f))
    }

    /// Registers `f` to run once when `id` unmounts.
    pub fn on_unmount(&self, id: InstanceId, f: impl FnOnce() + 'static) -> Result<()> {
        self.register_unmount(id, effect_fn(f))
    }

    pub fn try_on_unmount<E>(
        &self,
        id: InstanceId,
        f: impl FnOnce() -> std::result::Result<(), E> + 'static,
    ) -> Result<()>
    where
        E: Into<BoxError>,
    {
        self.register_unmount(id, fallible_effect_fn(f))
    }

    fn register_mount(&self, id: InstanceId, f: EffectFn) -> Result<()> {
        let instance = self.instance(id)?;
        if instance.phase() != Phase::Pending {
            return Err(instance.violation(ViolationKind::RegisterAfterMount).into());
        }
        instance.register(EffectPhase::Mount, f);
        Ok(())
    }

    fn register_unmount(&self, id: InstanceId, f: EffectFn) -> Result<()> {
        let instance = self.instance(id)?;
        if instance.phase() == Phase::Unmounted {
            return Err(instance.violation(ViolationKind::TerminalInstance).into());
        }
        instance.register(EffectPhase::Unmount, f);
        Ok(())
    }

    /// Forced-update trigger bound to `id`, for renderers that invalidate
    /// instances outside of a render pass.
    pub fn update_trigger(&self, id: InstanceId) -> Result<UpdateTrigger> {
        let instance = self.instance(id)?;
        let counter = ForcedUpdateCounter::new(InstanceHandle::of(&instance));
        Ok(UpdateTrigger::new(Rc::new(counter)))
    }

    /// Re-render was requested for `id` and it has not rendered since.
    pub fn is_render_requested(&self, id: InstanceId) -> bool {
        self.instance(id)
            .map(|i| i.has(InstanceFlags::RENDER_REQUESTED))
            .unwrap_or(false)
    }
}

/// Weak handle used by cells that outlive a render pass and need to reach
/// their instance later (forced updates, reducer dispatch).
#[derive(Clone)]
pub(crate) struct InstanceHandle {
    id: InstanceId,
    instance: Weak<Instance>,
    watch: LifecycleWatch,
}

impl InstanceHandle {
    pub(crate) fn of(instance: &Rc<Instance>) -> Self {
        Self {
            id: instance.id(),
            instance: Rc::downgrade(instance),
            watch: instance.watch(),
        }
    }

    pub(crate) fn id(&self) -> InstanceId {
        self.id
    }

    /// The owning instance unmounted or was dropped.
    pub(crate) fn is_gone(&self) -> bool {
        self.watch.is_unmounted() || self.instance.strong_count() == 0
    }

    /// Requests a re-render of the owning instance. Does nothing (beyond a
    /// warning) once that instance is gone.
    pub(crate) fn invalidate(&self) -> bool {
        if self.watch.is_unmounted() {
            log::warn!(
                "update requested for unmounted instance {:?}; ignored",
                self.id
            );
            return false;
        }
        match self.instance.upgrade() {
            Some(instance) => instance.request_render(),
            None => {
                log::warn!(
                    "update requested for removed instance {:?}; ignored",
                    self.id
                );
                false
            }
        }
    }
}
