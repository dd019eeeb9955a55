//! # Lifecycle-safe hooks
//!
//! tether sits between a UI renderer and component code. It does not render
//! anything: it keeps per-instance state correct across renders and tells the
//! renderer when an instance needs to render again. There are four pieces:
//!
//! - `LatestRef<T>` — a cell that always holds the value from the latest
//!   render, readable from callbacks created during any earlier render.
//! - `LifecycleSignal` — `Pending -> Mounted -> Unmounted`, each transition
//!   exactly once.
//! - mount / unmount callbacks — run exactly once per instance, mount before
//!   unmount, each callback isolated from its siblings' failures.
//! - `ForcedUpdateCounter` — manual invalidation with no data attached.
//!
//! ## Driving instances
//!
//! The renderer owns a `Runtime` and reports render, mount and unmount for
//! each instance. Hooks called inside `render` attach to that instance:
//!
//! ```rust
//! use std::rc::Rc;
//! use tether_core::*;
//!
//! let queue = Rc::new(RenderQueue::new());
//! let rt = Runtime::new(RuntimeConfig::default(), queue.clone());
//!
//! let id = rt.create_instance();
//! let (unmounted, update) = rt
//!     .render(id, || (use_unmounted_ref(), use_update()))
//!     .unwrap();
//! rt.mount(id).unwrap();
//! assert!(!unmounted.get());
//!
//! update.trigger();
//! update.trigger();
//! assert_eq!(queue.drain_requests(), vec![id]);
//! assert_eq!(update.count(), 2);
//!
//! rt.unmount(id).unwrap();
//! assert!(unmounted.get());
//! ```
//!
//! ## Delayed work
//!
//! tether never cancels work it did not start. A timer or network callback
//! captured before unmount should check `use_unmounted_ref()` (or a
//! `LifecycleWatch`) before writing anything owned by the instance; writes
//! through `use_update` or `use_reducer` after unmount are dropped with a
//! warning.
//!
//! ## Errors
//!
//! Illegal transitions (double mount, unmount before mount, touching a
//! removed instance) return `Error::Lifecycle`. A failing or panicking
//! mount/unmount callback is reported to `Renderer::effect_error` and does
//! not stop the callbacks registered after it.

pub mod config;
mod effects;
pub mod error;
pub mod hooks;
pub mod latest;
pub mod lifecycle;
pub mod prelude;
pub mod renderer;
pub mod runtime;
pub mod update;


pub use config::*;
pub use error::*;
pub use hooks::*;
pub use latest::*;
pub use lifecycle::*;
pub use renderer::*;
pub use runtime::{InstanceId, Runtime, current_instance, remember};
pub use update::*;
