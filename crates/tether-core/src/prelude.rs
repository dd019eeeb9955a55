pub use crate::config::{RemountPolicy, RuntimeConfig};
pub use crate::error::{EffectError, Error, LifecycleViolation, Result, ViolationKind};
pub use crate::hooks::{
    Dispatch, use_latest, use_lifecycle, use_mount, use_reducer, use_ref, use_unmount,
    use_unmounted_ref, use_update,
};
pub use crate::latest::LatestRef;
pub use crate::lifecycle::{LifecycleWatch, Phase};
pub use crate::renderer::{RenderQueue, Renderer};
pub use crate::runtime::{InstanceId, Runtime};
pub use crate::update::UpdateTrigger;
