#![forbid(unsafe_code)]

//! Immutable step and sequence configuration.
//!
//! Configuration is assembled with chained setters and validated once, when
//! a [`Sequence`](crate::sequence::Sequence) is built. After that the
//! controllers only read it.

use std::fmt;

use ahash::AHashSet;
use bubble_core::arrow::{ArrowHint, ArrowSide};
use bubble_core::placement::{InvalidPlacementConfig, PlacementConfig};
use web_time::Duration;

use crate::host::ElementId;
use crate::store::StoreKey;
use crate::surface::{BubbleContent, HighlightMode};

/// Durations used while showing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ShowcaseTiming {
    /// Wait after attaching the overlay before the placement pass, so
    /// in-flight scroll or layout animations settle first.
    pub settle_delay: Duration,
    /// Bubble scale-in.
    pub show_animation: Duration,
    /// Dim background fade-in on the first displayed step.
    pub background_fade: Duration,
    /// Pulse on the highlighted target.
    pub beat_animation: Duration,
}

impl Default for ShowcaseTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(700),
            show_animation: Duration::from_millis(200),
            background_fade: Duration::from_millis(700),
            beat_animation: Duration::from_millis(700),
        }
    }
}

impl ShowcaseTiming {
    /// Set the settle delay.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the bubble scale-in duration.
    #[must_use]
    pub fn show_animation(mut self, duration: Duration) -> Self {
        self.show_animation = duration;
        self
    }

    /// Set the background fade duration.
    #[must_use]
    pub fn background_fade(mut self, duration: Duration) -> Self {
        self.background_fade = duration;
        self
    }

    /// Set the target pulse duration.
    #[must_use]
    pub fn beat_animation(mut self, duration: Duration) -> Self {
        self.beat_animation = duration;
        self
    }
}

/// Configuration for one step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct StepConfig {
    /// Caller-chosen id, unique within a sequence.
    pub id: String,
    /// Element the bubble points at. `None` centers the bubble.
    pub target: Option<ElementId>,
    pub arrow_hint: ArrowHint,
    /// Display the step at most once per store.
    pub show_once_key: Option<String>,
    /// Always use the centered layout.
    pub centered: bool,
    pub highlight_mode: HighlightMode,
    /// Clicking the highlighted target does not dismiss the step.
    pub disable_target_click: bool,
    /// Clicking the dim background dismisses the step.
    pub cancelable: bool,
    pub content: BubbleContent,
}

impl StepConfig {
    /// A cancelable, untargeted step with default content.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: None,
            arrow_hint: ArrowHint::none(),
            show_once_key: None,
            centered: false,
            highlight_mode: HighlightMode::default(),
            disable_target_click: false,
            cancelable: true,
            content: BubbleContent::default(),
        }
    }

    /// Point the bubble at an element.
    #[must_use]
    pub fn target(mut self, element: ElementId) -> Self {
        self.target = Some(element);
        self
    }

    /// Add an arrow side to the hint.
    #[must_use]
    pub fn arrow(mut self, side: ArrowSide) -> Self {
        self.arrow_hint.push(side);
        self
    }

    /// Replace the whole arrow hint.
    #[must_use]
    pub fn arrow_hint(mut self, hint: ArrowHint) -> Self {
        self.arrow_hint = hint;
        self
    }

    /// Show at most once under `key`.
    #[must_use]
    pub fn show_once(mut self, key: impl Into<String>) -> Self {
        self.show_once_key = Some(key.into());
        self
    }

    /// Force the centered layout.
    #[must_use]
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    /// Set the highlight mode.
    #[must_use]
    pub fn highlight_mode(mut self, mode: HighlightMode) -> Self {
        self.highlight_mode = mode;
        self
    }

    /// Keep the step up when the target is clicked.
    #[must_use]
    pub fn disable_target_click(mut self, disable: bool) -> Self {
        self.disable_target_click = disable;
        self
    }

    /// Whether a background click dismisses.
    #[must_use]
    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Set the bubble content.
    #[must_use]
    pub fn content(mut self, content: BubbleContent) -> Self {
        self.content = content;
        self
    }

    /// Namespaced show-once key, if any.
    pub fn store_key(&self) -> Option<StoreKey> {
        self.show_once_key.as_deref().map(StoreKey::new)
    }

    /// Check this step on its own.
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyStepId { index });
        }
        if self
            .show_once_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            return Err(ConfigError::EmptyShowOnceKey {
                step: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Configuration shared by every step of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SequenceConfig {
    pub placement: PlacementConfig,
    pub timing: ShowcaseTiming,
}

impl SequenceConfig {
    /// Set the placement constants.
    #[must_use]
    pub fn placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Set the timing.
    #[must_use]
    pub fn timing(mut self, timing: ShowcaseTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Validate shared settings and every step.
    pub fn validate(&self, steps: &[StepConfig]) -> Result<(), ConfigError> {
        self.placement.validate()?;
        let mut seen = AHashSet::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            step.validate(index)?;
            if !seen.insert(step.id.as_str()) {
                return Err(ConfigError::DuplicateStepId(step.id.clone()));
            }
        }
        Ok(())
    }
}

/// A step as placed in a sequence.
///
/// `is_first` and `is_last` come from the step's position in the list and
/// never change, even when neighbouring steps are suppressed.
#[derive(Debug, Clone, PartialEq)]
pub struct TourStep {
    config: StepConfig,
    index: usize,
    is_first: bool,
    is_last: bool,
}

impl TourStep {
    pub(crate) fn new(config: StepConfig, index: usize, count: usize) -> Self {
        Self {
            config,
            index,
            is_first: index == 0,
            is_last: index + 1 == count,
        }
    }

    /// The step's configuration.
    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Step id.
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Position in the sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// First step in list order.
    pub fn is_first(&self) -> bool {
        self.is_first
    }

    /// Last step in list order.
    pub fn is_last(&self) -> bool {
        self.is_last
    }
}

/// Configuration rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A step id is empty or whitespace.
    EmptyStepId { index: usize },
    /// Two steps share an id.
    DuplicateStepId(String),
    /// A show-once key is empty or whitespace.
    EmptyShowOnceKey { step: String },
    /// A placement constant is out of range.
    Placement(InvalidPlacementConfig),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStepId { index } => write!(f, "step {index} has an empty id"),
            Self::DuplicateStepId(id) => write!(f, "duplicate step id: {id}"),
            Self::EmptyShowOnceKey { step } => {
                write!(f, "step {step} has an empty show-once key")
            }
            Self::Placement(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Placement(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvalidPlacementConfig> for ConfigError {
    fn from(e: InvalidPlacementConfig) -> Self {
        Self::Placement(e)
    }
}
