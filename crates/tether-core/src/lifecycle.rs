use std::cell::Cell;
use std::rc::Rc;

use crate::error::{LifecycleViolation, ViolationKind};

/// Lifecycle of one instance: `Pending -> Mounted -> Unmounted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Pending,
    Mounted,
    Unmounted,
}

/// Mount-state tracker owned by one instance.
///
/// Every transition happens exactly once; repeating one, or skipping
/// `Mounted`, is rejected with a [`LifecycleViolation`] instead of being
/// re-executed.
#[derive(Debug, Default)]
pub struct LifecycleSignal {
    phase: Rc<Cell<Phase>>,
}

impl LifecycleSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn mark_mounted(&self) -> Result<(), LifecycleViolation> {
        match self.phase.get() {
            Phase::Pending => {
                self.phase.set(Phase::Mounted);
                Ok(())
            }
            Phase::Mounted => Err(LifecycleViolation::new(
                ViolationKind::DuplicateMount,
                Phase::Mounted,
            )),
            Phase::Unmounted => Err(LifecycleViolation::new(
                ViolationKind::TerminalInstance,
                Phase::Unmounted,
            )),
        }
    }

    pub fn mark_unmounted(&self) -> Result<(), LifecycleViolation> {
        match self.phase.get() {
            Phase::Mounted => {
                self.phase.set(Phase::Unmounted);
                Ok(())
            }
            Phase::Pending => Err(LifecycleViolation::new(
                ViolationKind::UnmountBeforeMount,
                Phase::Pending,
            )),
            Phase::Unmounted => Err(LifecycleViolation::new(
                ViolationKind::DuplicateUnmount,
                Phase::Unmounted,
            )),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.phase.get() == Phase::Mounted
    }

    pub fn is_unmounted(&self) -> bool {
        self.phase.get() == Phase::Unmounted
    }

    /// Hands out a read-only view for async callbacks.
    pub fn watch(&self) -> LifecycleWatch {
        LifecycleWatch {
            phase: self.phase.clone(),
        }
    }
}

/// Read-only handle to a [`LifecycleSignal`].
///
/// Delayed work (timers, network replies) should check
/// [`is_unmounted`](Self::is_unmounted) before touching instance state.
#[derive(Clone, Debug)]
pub struct LifecycleWatch {
    phase: Rc<Cell<Phase>>,
}

impl LifecycleWatch {
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.phase.get() == Phase::Mounted
    }

    pub fn is_unmounted(&self) -> bool {
        self.phase.get() == Phase::Unmounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let s = LifecycleSignal::new();
        assert_eq!(s.phase(), Phase::Pending);
        assert!(!s.is_unmounted());

        s.mark_mounted().unwrap();
        assert!(s.is_mounted());

        s.mark_unmounted().unwrap();
        assert!(s.is_unmounted());
        assert!(!s.is_mounted());
    }

    #[test]
    fn test_duplicate_mount_rejected() {
        let s = LifecycleSignal::new();
        s.mark_mounted().unwrap();
        let err = s.mark_mounted().unwrap_err();
        assert_eq!(err.kind, ViolationKind::DuplicateMount);
        assert!(s.is_mounted());
    }

    #[test]
    fn test_unmount_before_mount_rejected() {
        let s = LifecycleSignal::new();
        let err = s.mark_unmounted().unwrap_err();
        assert_eq!(err.kind, ViolationKind::UnmountBeforeMount);
        assert_eq!(s.phase(), Phase::Pending);
    }

    #[test]
    fn test_unmounted_is_terminal() {
        let s = LifecycleSignal::new();
        s.mark_mounted().unwrap();
        s.mark_unmounted().unwrap();

        assert_eq!(
            s.mark_unmounted().unwrap_err().kind,
            ViolationKind::DuplicateUnmount
        );
        assert_eq!(
            s.mark_mounted().unwrap_err().kind,
            ViolationKind::TerminalInstance
        );
        assert!(s.is_unmounted());
    }

    #[test]
    fn test_watch_tracks_signal() {
        let s = LifecycleSignal::new();
        let w = s.watch();
        assert_eq!(w.phase(), Phase::Pending);
        s.mark_mounted().unwrap();
        assert!(w.is_mounted());
        s.mark_unmounted().unwrap();
        assert!(w.is_unmounted());
    }
}
