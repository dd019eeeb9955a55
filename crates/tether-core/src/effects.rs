use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use smallvec::SmallVec;

use crate::error::{BoxError, EffectError, EffectPhase};
use crate::runtime::InstanceId;

pub(crate) type EffectFn = Box<dyn FnOnce() -> Result<(), BoxError>>;

pub(crate) type EffectList = SmallVec<[EffectFn; 4]>;

/// Wraps an infallible callback.
pub(crate) fn effect_fn(f: impl FnOnce() + 'static) -> EffectFn {
    Box::new(move || {
        f();
        Ok(())
    })
}

pub(crate) fn fallible_effect_fn<E>(f: impl FnOnce() -> Result<(), E> + 'static) -> EffectFn
where
    E: Into<BoxError>,
{
    Box::new(move || f().map_err(Into::into))
}

/// Mount and unmount callback slots of one instance.
#[derive(Default)]
pub(crate) struct EffectQueue {
    mount: EffectList,
    unmount: EffectList,
}

impl EffectQueue {
    pub fn push(&mut self, phase: EffectPhase, f: EffectFn) {
        match phase {
            EffectPhase::Mount => self.mount.push(f),
            EffectPhase::Unmount => self.unmount.push(f),
        }
    }

    /// Empties one slot. Each callback is handed out once.
    pub fn take(&mut self, phase: EffectPhase) -> EffectList {
        match phase {
            EffectPhase::Mount => std::mem::take(&mut self.mount),
            EffectPhase::Unmount => std::mem::take(&mut self.unmount),
        }
    }

    pub fn len(&self, phase: EffectPhase) -> usize {
        match phase {
            EffectPhase::Mount => self.mount.len(),
            EffectPhase::Unmount => self.unmount.len(),
        }
    }

    pub fn clear(&mut self) {
        self.mount.clear();
        self.unmount.clear();
    }
}

/// Runs every callback in registration order. A failure is recorded and the
/// next callback still runs.
pub(crate) fn run_effects(
    instance: InstanceId,
    phase: EffectPhase,
    effects: EffectList,
    isolate_panics: bool,
) -> Vec<EffectError> {
    let mut errors = Vec::new();
    for (index, f) in effects.into_iter().enumerate() {
        let outcome = if isolate_panics {
            catch_unwind(AssertUnwindSafe(f))
        } else {
            Ok(f())
        };

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some((e.to_string(), false)),
            Err(payload) => Some((panic_message(payload.as_ref()), true)),
        };

        if let Some((message, panicked)) = failure {
            errors.push(EffectError {
                instance,
                phase,
                index,
                message,
                panicked,
            });
        }
    }
    errors
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
