/// What happens when the renderer wants to reuse an instance identity after
/// taking it out of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RemountPolicy {
    /// Unmount is final; every mount/unmount pair needs a fresh instance.
    #[default]
    Terminal,
    /// `Runtime::remount` is allowed. The old lifecycle signal ends in
    /// `Unmounted` and the instance starts over with a fresh one.
    Reset,
}

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub remount_policy: RemountPolicy,
    /// Catch panics inside mount/unmount callbacks and report them as
    /// effect errors instead of unwinding through the runtime.
    pub isolate_panics: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            remount_policy: RemountPolicy::Terminal,
            isolate_panics: true,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remount_policy(mut self, policy: RemountPolicy) -> Self {
        self.remount_policy = policy;
        self
    }

    pub fn with_isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }
}
