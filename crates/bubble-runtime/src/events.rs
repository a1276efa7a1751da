#![forbid(unsafe_code)]

//! Caller-facing tour events.
//!
//! The sequence queues events as it runs; the caller drains them with
//! [`Sequence::drain_events`](crate::sequence::Sequence::drain_events).

/// Where a click landed on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// The bubble body.
    Bubble,
    /// The dim background around the bubble.
    Background,
    /// The highlighted target snapshot.
    Target,
    /// The close control in the bubble corner.
    Close,
}

/// Why a step was skipped without being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Its show-once key was already recorded.
    AlreadyShown,
    /// The target had no size or sat at an undefined position.
    TargetNotVisible,
    /// The screen snapshot was unusable.
    InvalidMetrics,
}

impl SkipReason {
    /// Stable label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyShown => "already_shown",
            Self::TargetNotVisible => "target_not_visible",
            Self::InvalidMetrics => "invalid_metrics",
        }
    }
}

/// Notifications produced while a sequence runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TourEvent {
    /// A step's bubble was presented.
    StepShown { step: String, index: usize },
    /// A step was skipped; a [`StepDismissed`](Self::StepDismissed) follows.
    StepSkipped {
        step: String,
        index: usize,
        reason: SkipReason,
    },
    BubbleClick { step: String },
    BackgroundClick { step: String },
    TargetClick { step: String },
    CloseClick { step: String },
    /// A step left the screen. Emitted exactly once per step.
    StepDismissed { step: String, index: usize },
    /// Every step was dismissed or skipped.
    Finished,
    /// The sequence was torn down before finishing.
    Cancelled,
}

impl TourEvent {
    /// Click event for a step.
    pub fn click(target: ClickTarget, step: &str) -> Self {
        let step = step.to_owned();
        match target {
            ClickTarget::Bubble => Self::BubbleClick { step },
            ClickTarget::Background => Self::BackgroundClick { step },
            ClickTarget::Target => Self::TargetClick { step },
            ClickTarget::Close => Self::CloseClick { step },
        }
    }

    /// Id of the step the event concerns, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::StepShown { step, .. }
            | Self::StepSkipped { step, .. }
            | Self::BubbleClick { step }
            | Self::BackgroundClick { step }
            | Self::TargetClick { step }
            | Self::CloseClick { step }
            | Self::StepDismissed { step, .. } => Some(step),
            Self::Finished | Self::Cancelled => None,
        }
    }
}
