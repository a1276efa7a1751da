#![forbid(unsafe_code)]

//! Bubble Showcase Runtime
//!
//! Event-driven controllers that walk a user through a list of on-screen
//! hints, one anchored bubble at a time.
//!
//! # Key Components
//!
//! - [`Sequence`] - Runs an ordered list of steps; skips suppressed ones
//! - [`StepConfig`] - Per-step target, arrow hint, show-once key and content
//! - [`HostTree`] - Trait the host UI tree implements
//! - [`RenderSurface`] - Trait the drawing layer implements
//! - [`ShownStore`] - Show-once persistence ([`MemoryStore`], `FileStore`)
//! - [`Scheduler`] - Timer collaborator for the settle delay
//! - [`TourEvent`] - Notifications drained by the caller
//!
//! # Role in the showcase stack
//! `bubble-runtime` owns every side effect decision: when to attach the dim
//! overlay, when to wait for layout, when to record a show-once key, and
//! when a late callback must be ignored. Geometry is delegated to
//! `bubble-core`.
//!
//! # How it fits in the system
//! The host drives a [`Sequence`] from its UI thread. Nothing here blocks
//! or spawns threads; every asynchronous boundary is a
//! [`DeferredTask`](deferred::DeferredTask) the host fires back in.

pub mod cancellation;
pub mod config;
pub mod deferred;
pub mod error;
pub mod events;
pub mod host;
pub mod sequence;
pub mod showcase;
pub mod store;
pub mod surface;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{ConfigError, SequenceConfig, ShowcaseTiming, StepConfig, TourStep};
pub use deferred::{DeferredTask, Scheduler, TaskId, TaskKind};
pub use error::{Recovery, Result, ShowcaseError};
pub use events::{ClickTarget, SkipReason, TourEvent};
pub use host::{ElementId, HostTree, OverlayId};
pub use sequence::{Sequence, SequenceState};
pub use showcase::{ShowcaseContext, StepPhase};
#[cfg(feature = "state-persistence")]
pub use store::FileStore;
pub use store::{MemoryStore, ShownStore, StoreError, StoreKey};
pub use surface::{
    BubbleContent, BubbleFrame, HighlightMode, HighlightRequest, RenderSurface, Rgba,
};
