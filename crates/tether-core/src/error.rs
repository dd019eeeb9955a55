//! Error types for tether

use thiserror::Error;

use crate::lifecycle::Phase;
use crate::runtime::InstanceId;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by fallible mount/unmount callbacks.
pub type BoxError = Box<dyn std::error::Error + 'static>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Lifecycle violation: {0}")]
    Lifecycle(#[from] LifecycleViolation),
}

impl Error {
    pub fn violation_kind(&self) -> ViolationKind {
        match self {
            Error::Lifecycle(v) => v.kind,
        }
    }
}

/// What the caller tried to do that the lifecycle state machine forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    DuplicateMount,
    DuplicateUnmount,
    UnmountBeforeMount,
    MountBeforeRender,
    /// The instance id is stale: the instance was unmounted or discarded.
    TerminalInstance,
    ReentrantRender,
    /// Unmount requested while the instance's mount callbacks are running.
    UnmountDuringMount,
    RegisterAfterMount,
    DiscardMounted,
    RemountDisabled,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ViolationKind::DuplicateMount => "instance is already mounted",
            ViolationKind::DuplicateUnmount => "instance is already unmounted",
            ViolationKind::UnmountBeforeMount => "instance was never mounted",
            ViolationKind::MountBeforeRender => "instance has not completed a render",
            ViolationKind::TerminalInstance => "instance has been removed",
            ViolationKind::ReentrantRender => "instance is already rendering",
            ViolationKind::UnmountDuringMount => "instance is still running its mount callbacks",
            ViolationKind::RegisterAfterMount => "mount callback registered after mount",
            ViolationKind::DiscardMounted => "only pending instances can be discarded",
            ViolationKind::RemountDisabled => "remount requires RemountPolicy::Reset",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} (instance {instance:?}, phase {phase:?})")]
pub struct LifecycleViolation {
    pub kind: ViolationKind,
    pub instance: Option<InstanceId>,
    pub phase: Phase,
}

impl LifecycleViolation {
    pub fn new(kind: ViolationKind, phase: Phase) -> Self {
        Self {
            kind,
            instance: None,
            phase,
        }
    }

    pub fn for_instance(mut self, id: InstanceId) -> Self {
        self.instance = Some(id);
        self
    }
}

/// Which callback slot an effect was registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectPhase {
    Mount,
    Unmount,
}

/// A mount or unmount callback failed. Reported on the renderer's
/// effect-error channel; sibling callbacks still run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{phase:?} effect #{index} of instance {instance:?} failed: {message}")]
pub struct EffectError {
    pub instance: InstanceId,
    pub phase: EffectPhase,
    /// Registration index within the phase.
    pub index: usize,
    pub message: String,
    pub panicked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display_names_the_problem() {
        let v = LifecycleViolation::new(ViolationKind::DuplicateMount, Phase::Mounted);
        let msg = v.to_string();
        assert!(msg.contains("already mounted"));
        assert!(msg.contains("Mounted"));
    }

    #[test]
    fn test_error_from_violation() {
        let err: Error =
            LifecycleViolation::new(ViolationKind::UnmountBeforeMount, Phase::Pending).into();
        assert_eq!(err.violation_kind(), ViolationKind::UnmountBeforeMount);
        assert!(err.to_string().starts_with("Lifecycle violation"));
    }
}
