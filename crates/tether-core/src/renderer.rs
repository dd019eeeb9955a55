use std::cell::RefCell;

use crate::error::EffectError;
use crate::runtime::InstanceId;

/// The external renderer, as seen from the runtime.
///
/// The runtime never renders anything itself. It asks for re-renders and
/// reports failing effects; scheduling and batching are up to the
/// implementor.
pub trait Renderer {
    /// `id` must be rendered again even though none of its inputs changed.
    fn request_render(&self, id: InstanceId);

    fn effect_error(&self, error: EffectError);
}

/// In-memory renderer channel. Keeps requested ids in order without
/// duplicates and collects effect errors until drained.
#[derive(Default)]
pub struct RenderQueue {
    requests: RefCell<Vec<InstanceId>>,
    errors: RefCell<Vec<EffectError>>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn drain_requests(&self) -> Vec<InstanceId> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    pub fn drain_errors(&self) -> Vec<EffectError> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }
}

impl Renderer for RenderQueue {
    fn request_render(&self, id: InstanceId) {
        let mut requests = self.requests.borrow_mut();
        if !requests.contains(&id) {
            requests.push(id);
        }
    }

    fn effect_error(&self, error: EffectError) {
        log::error!("{error}");
        self.errors.borrow_mut().push(error);
    }
}
