#![forbid(unsafe_code)]

//! Bubble showcase public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports the placement engine from `bubble-core` and the step and
//! sequence controllers from `bubble-runtime`, and offers a lightweight
//! prelude for day-to-day usage.
//!
//! # Example
//!
//! ```
//! use bubble::prelude::*;
//!
//! let steps = vec![
//!     StepConfig::new("search")
//!         .target(ElementId(7))
//!         .arrow(ArrowSide::Top)
//!         .show_once("onboarding.search")
//!         .content(BubbleContent::new("Search").description("Find anything here")),
//!     StepConfig::new("outro").centered(true),
//! ];
//! let sequence = Sequence::with_steps(steps)?;
//! assert_eq!(sequence.state(), SequenceState::Idle);
//! # Ok::<(), bubble::Error>(())
//! ```

// --- Core re-exports -------------------------------------------------------

pub use bubble_core::arrow::{AnchorEdges, ArrowHint, ArrowSide};
pub use bubble_core::geometry::{Point, Rect, Sides, Size};
pub use bubble_core::metrics::{MetricsProvider, ScreenMetrics};
pub use bubble_core::placement::{
    PlacementConfig, PlacementEngine, PlacementError, PlacementRequest, PlacementResult,
    compute_placement,
};
pub use bubble_core::shape::{BubbleShape, Rhombus};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "state-persistence")]
pub use bubble_runtime::FileStore;
pub use bubble_runtime::{
    BubbleContent, BubbleFrame, ClickTarget, ConfigError, ElementId, HighlightMode,
    HighlightRequest, HostTree, MemoryStore, OverlayId, Recovery, RenderSurface, Scheduler,
    Sequence, SequenceConfig, SequenceState, ShowcaseContext, ShowcaseTiming, ShownStore,
    SkipReason, StepConfig, StepPhase, StoreKey, TaskId, TourEvent, TourStep,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for showcase APIs.
pub use bubble_runtime::ShowcaseError as Error;

/// Standard result type for showcase APIs.
pub use bubble_runtime::Result;

/// Common imports for building a tour.
pub mod prelude {
    pub use crate::{
        ArrowHint, ArrowSide, BubbleContent, ClickTarget, ElementId, Error, HighlightMode,
        HostTree, MemoryStore, PlacementConfig, Rect, RenderSurface, Result, Scheduler,
        ScreenMetrics, Sequence, SequenceConfig, SequenceState, ShowcaseContext, ShowcaseTiming,
        ShownStore, StepConfig, TaskId, TourEvent,
    };

    pub use crate::{core, runtime};
}

pub use bubble_core as core;
pub use bubble_runtime as runtime;
