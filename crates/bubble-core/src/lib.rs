#![forbid(unsafe_code)]

//! Core: geometry, screen metrics, and the bubble placement engine.
//!
//! # Role in the showcase stack
//! `bubble-core` is pure computation. Given a target rectangle, a screen
//! snapshot and an arrow hint it decides where a message bubble goes and
//! where its arrow points. It never touches a UI toolkit, so every rule can
//! be checked with plain unit and property tests.
//!
//! # Primary responsibilities
//! - **Geometry**: signed pixel [`geometry::Rect`], [`geometry::Point`] and
//!   [`geometry::Sides`].
//! - **Metrics**: immutable [`metrics::ScreenMetrics`] snapshots.
//! - **Placement**: [`placement::PlacementEngine`] and its result type.
//! - **Shape**: the rounded body and rhombus arrow of a placed bubble.
//!
//! # How it fits in the system
//! `bubble-runtime` drives the per-step state machine and calls into the
//! placement engine once the target is laid out. The `bubble` facade
//! re-exports both.

pub mod arrow;
pub mod geometry;
pub mod logging;
pub mod metrics;
pub mod placement;
pub mod shape;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

pub use arrow::{AnchorEdges, ArrowHint, ArrowSide};
pub use geometry::{Point, Rect, Sides, Size};
pub use metrics::{MetricsProvider, ScreenMetrics};
pub use placement::{
    PlacementConfig, PlacementEngine, PlacementError, PlacementRequest, PlacementResult,
    compute_placement,
};
pub use shape::{BubbleShape, Rhombus};
