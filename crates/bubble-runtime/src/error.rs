#![forbid(unsafe_code)]

//! Showcase error model and recovery.
//!
//! # Design Principles
//!
//! 1. **Nothing fatal on the display path**: the worst outcome of a failed
//!    step is that it silently does not appear.
//! 2. **Typed causes**: each failure keeps its domain error so logs can say
//!    exactly what happened.
//! 3. **Recovery mapping**: every variant maps to a [`Recovery`]. The
//!    sequence controller branches on it instead of propagating: skip the
//!    active step, drop the request, or (at build time only) return `Err`.

use std::fmt;

use bubble_core::placement::PlacementError;

use crate::config::ConfigError;
use crate::deferred::TaskId;
use crate::events::SkipReason;
use crate::host::ElementId;
use crate::store::StoreError;

/// Top-level error for the showcase runtime.
#[derive(Debug)]
pub enum ShowcaseError {
    /// Configuration rejected when the sequence was built.
    Config(ConfigError),
    /// The placement engine could not place the bubble.
    Placement(PlacementError),
    /// The step's show-once key is already recorded.
    AlreadyShown { key: String },
    /// The target left the host tree before the bubble could be placed.
    TargetDetached(ElementId),
    /// A dismiss arrived while no step holds the overlay.
    NoActiveContainer,
    /// The host fired a task that was cancelled, already fired, or unknown.
    StaleTask(TaskId),
    /// A persistent store could not be opened.
    Store(StoreError),
}

/// What the controllers do instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Treat the step as instantly dismissed and advance.
    SkipStep(SkipReason),
    /// Drop the request; nothing changes.
    Ignore,
    /// Refuse to build; surfaced to the caller as `Err`.
    Reject,
}

impl ShowcaseError {
    /// Recovery action for this error.
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Placement(PlacementError::TargetNotVisible { .. }) | Self::TargetDetached(_) => {
                Recovery::SkipStep(SkipReason::TargetNotVisible)
            }
            Self::Placement(PlacementError::InvalidMetrics(_)) => {
                Recovery::SkipStep(SkipReason::InvalidMetrics)
            }
            Self::AlreadyShown { .. } => Recovery::SkipStep(SkipReason::AlreadyShown),
            Self::NoActiveContainer | Self::StaleTask(_) => Recovery::Ignore,
            Self::Config(_) | Self::Store(_) => Recovery::Reject,
        }
    }

    /// Error type label for logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Placement(PlacementError::TargetNotVisible { .. }) => "target_not_visible",
            Self::Placement(PlacementError::InvalidMetrics(_)) => "invalid_metrics",
            Self::AlreadyShown { .. } => "already_shown",
            Self::TargetDetached(_) => "target_detached",
            Self::NoActiveContainer => "no_active_container",
            Self::StaleTask(_) => "stale_task",
            Self::Store(_) => "store",
        }
    }

    /// Whether the runtime absorbs this error on its own.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery(), Recovery::Reject)
    }
}

impl fmt::Display for ShowcaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::Placement(e) => write!(f, "placement error: {e}"),
            Self::AlreadyShown { key } => write!(f, "already shown: {key}"),
            Self::TargetDetached(element) => write!(f, "target {} left the host tree", element.0),
            Self::NoActiveContainer => write!(f, "no active overlay container"),
            Self::StaleTask(id) => write!(f, "stale deferred task: {id}"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for ShowcaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Placement(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ShowcaseError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PlacementError> for ShowcaseError {
    fn from(e: PlacementError) -> Self {
        Self::Placement(e)
    }
}

impl From<StoreError> for ShowcaseError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Standard result type for fallible constructors.
pub type Result<T> = std::result::Result<T, ShowcaseError>;
