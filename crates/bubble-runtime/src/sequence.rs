#![forbid(unsafe_code)]

//! Sequence controller: runs a list of steps one at a time.
//!
//! # States
//!
//! ```text
//! Idle ──start──▶ Active(0) ──dismiss──▶ Active(1) ── … ──▶ Completed
//!   │                 │
//!   │                 └─ suppressed steps are skipped in a cascade
//!   └──cancel──▶ Completed ◀──cancel── Active(i)
//! ```
//!
//! `Completed` is terminal. At most one step is mid-display at any time.
//!
//! # Driving a sequence
//!
//! The sequence never blocks. The host calls in when something happens:
//! [`on_layout`](Sequence::on_layout) and [`on_timer`](Sequence::on_timer)
//! when a deferred task fires, [`on_click`](Sequence::on_click) for overlay
//! clicks, and [`dismiss`](Sequence::dismiss) /
//! [`dismiss_current`](Sequence::dismiss_current) for programmatic or back
//! navigation dismissal. Caller-facing notifications accumulate and are read
//! with [`drain_events`](Sequence::drain_events).

use bubble_core::placement::{PlacementEngine, PlacementResult};
use bubble_core::{debug, info, warn};

use crate::config::{ConfigError, SequenceConfig, StepConfig, TourStep};
use crate::deferred::{TaskId, TaskKind, TaskLookup};
use crate::error::{Recovery, ShowcaseError};
use crate::events::{ClickTarget, SkipReason, TourEvent};
use crate::host::OverlayId;
use crate::showcase::{Progress, Showcase, ShowcaseContext, Stage, StepPhase};

/// Where a sequence is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// Not started.
    Idle,
    /// Showing (or preparing) the step at this index.
    Active(usize),
    /// Every step is done, or the sequence was cancelled.
    Completed,
}

/// An ordered tour of steps.
#[derive(Debug)]
pub struct Sequence {
    steps: Vec<TourStep>,
    state: SequenceState,
    current: Option<Showcase>,
    stage: Stage,
}

impl Sequence {
    /// Build a sequence, validating every step.
    pub fn new(steps: Vec<StepConfig>, config: SequenceConfig) -> Result<Self, ConfigError> {
        config.validate(&steps)?;
        let count = steps.len();
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| TourStep::new(step, index, count))
            .collect();
        Ok(Self {
            steps,
            state: SequenceState::Idle,
            current: None,
            stage: Stage::new(PlacementEngine::new(config.placement), config.timing),
        })
    }

    /// Build a sequence with default placement and timing.
    pub fn with_steps(steps: Vec<StepConfig>) -> Result<Self, ConfigError> {
        Self::new(steps, SequenceConfig::default())
    }

    /// Current state.
    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// All steps in list order.
    pub fn steps(&self) -> &[TourStep] {
        &self.steps
    }

    /// The active step, if any.
    pub fn current_step(&self) -> Option<&TourStep> {
        self.current.as_ref().map(|showcase| &self.steps[showcase.index()])
    }

    /// Phase of the active step.
    pub fn current_phase(&self) -> Option<StepPhase> {
        self.current.as_ref().map(Showcase::phase)
    }

    /// Placement of the bubble on screen, if one is shown.
    pub fn current_placement(&self) -> Option<&PlacementResult> {
        self.current.as_ref().and_then(Showcase::placement)
    }

    /// The attached dim overlay, if any.
    pub fn overlay(&self) -> Option<OverlayId> {
        self.stage.overlay.current()
    }

    /// Number of deferred tasks the host may still fire.
    pub fn pending_tasks(&self) -> usize {
        self.stage.tasks.len()
    }

    /// Whether the sequence reached `Completed`.
    pub fn is_completed(&self) -> bool {
        self.state == SequenceState::Completed
    }

    /// Start at the first step. No-op unless `Idle`.
    pub fn start(&mut self, cx: &mut ShowcaseContext<'_>) {
        if self.state != SequenceState::Idle {
            debug!(message = "sequence.start_ignored", state = ?self.state);
            return;
        }
        info!(message = "sequence.start", steps = self.steps.len());
        self.activate(0, cx);
    }

    /// The host reports that a layout subscription fired.
    pub fn on_layout(&mut self, task: TaskId, cx: &mut ShowcaseContext<'_>) {
        self.fire(task, cx);
    }

    /// The host reports that a scheduled timer fired.
    pub fn on_timer(&mut self, task: TaskId, cx: &mut ShowcaseContext<'_>) {
        self.fire(task, cx);
    }

    /// A click landed on the overlay.
    pub fn on_click(&mut self, target: ClickTarget, cx: &mut ShowcaseContext<'_>) {
        let Some(showcase) = self.current.as_ref() else {
            debug!(message = "sequence.click_ignored", target = ?target);
            return;
        };
        let step = &self.steps[showcase.index()];
        if showcase.on_click(target, step, &mut self.stage) {
            self.dismiss_current(cx);
        }
    }

    /// Dismiss the step with this id if it is the active one.
    ///
    /// Returns `true` if a step was dismissed. Dismissing a step twice, or a
    /// step that is not active, does nothing.
    pub fn dismiss(&mut self, step_id: &str, cx: &mut ShowcaseContext<'_>) -> bool {
        let is_current = self.current_step().is_some_and(|step| step.id() == step_id);
        if !is_current {
            debug!(message = "sequence.dismiss_ignored", step = step_id);
            return self.recover(ShowcaseError::NoActiveContainer, cx).is_some();
        }
        self.dismiss_current(cx)
    }

    /// Dismiss whatever step is active and advance. Returns `true` if a step
    /// was dismissed.
    pub fn dismiss_current(&mut self, cx: &mut ShowcaseContext<'_>) -> bool {
        let Some(mut showcase) = self.current.take() else {
            return self.recover(ShowcaseError::NoActiveContainer, cx).is_some();
        };
        let index = showcase.index();
        if !showcase.dismiss(&self.steps[index], &mut self.stage, cx) {
            return false;
        }
        self.activate(index + 1, cx);
        true
    }

    /// Tear everything down. The active step, if any, is dismissed; later
    /// steps are never shown.
    pub fn cancel(&mut self, cx: &mut ShowcaseContext<'_>) {
        if self.state == SequenceState::Completed {
            return;
        }
        if let Some(mut showcase) = self.current.take() {
            let index = showcase.index();
            showcase.dismiss(&self.steps[index], &mut self.stage, cx);
        }
        for task in self.stage.tasks.drain() {
            match task.kind {
                TaskKind::Layout { element } => cx.host.unsubscribe_layout(element, task.id),
                TaskKind::Settle { .. } => cx.scheduler.cancel(task.id),
            }
        }
        self.stage.overlay.detach(cx.host);
        info!(message = "sequence.cancel", from = ?self.state);
        self.state = SequenceState::Completed;
        self.stage.events.push_back(TourEvent::Cancelled);
    }

    /// Take the queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<TourEvent> {
        self.stage.events.drain(..).collect()
    }

    /// Route a fired task to the active showcase. Tasks that were
    /// cancelled, already fired, or belong to another step are dropped.
    fn fire(&mut self, task: TaskId, cx: &mut ShowcaseContext<'_>) {
        let fired = match self.stage.tasks.take(task) {
            TaskLookup::Ready(fired) => fired,
            TaskLookup::Cancelled(_) | TaskLookup::Unknown => {
                self.recover(ShowcaseError::StaleTask(task), cx);
                return;
            }
        };
        let Some(showcase) = self
            .current
            .as_mut()
            .filter(|showcase| showcase.index() == fired.step && showcase.awaits(task))
        else {
            self.recover(ShowcaseError::StaleTask(task), cx);
            return;
        };

        debug!(
            message = "task.fire",
            task = task.get(),
            kind = fired.kind.as_str(),
            age_ms = fired.age().as_millis() as u64
        );
        let step = &self.steps[showcase.index()];
        let progress = match fired.kind {
            TaskKind::Layout { .. } => showcase.on_layout(step, &mut self.stage, cx),
            TaskKind::Settle { .. } => showcase.on_settled(step, &mut self.stage, cx),
        };
        self.apply(progress, cx);
    }

    /// Act on a showcase's progress.
    fn apply(&mut self, progress: Progress, cx: &mut ShowcaseContext<'_>) {
        if let Progress::Failed(error) = progress {
            if let Some(next) = self.recover(error, cx) {
                self.activate(next, cx);
            }
        }
    }

    /// Apply the recovery for `error`. Returns the index to activate next
    /// when the active step was skipped.
    fn recover(&mut self, error: ShowcaseError, cx: &mut ShowcaseContext<'_>) -> Option<usize> {
        match error.recovery() {
            Recovery::SkipStep(reason) => {
                let mut showcase = self.current.take()?;
                let index = showcase.index();
                self.skip(&mut showcase, reason, cx);
                Some(index + 1)
            }
            Recovery::Ignore => {
                debug!(
                    message = "sequence.ignored",
                    error_type = error.error_type(),
                    error = %error
                );
                None
            }
            Recovery::Reject => {
                warn!(
                    message = "sequence.rejected",
                    error_type = error.error_type(),
                    error = %error
                );
                None
            }
        }
    }

    fn skip(
        &mut self,
        showcase: &mut Showcase,
        reason: SkipReason,
        cx: &mut ShowcaseContext<'_>,
    ) {
        let step = &self.steps[showcase.index()];
        info!(
            message = "sequence.skip",
            step = step.id(),
            reason = reason.as_str()
        );
        self.stage.events.push_back(TourEvent::StepSkipped {
            step: step.id().to_owned(),
            index: step.index(),
            reason,
        });
        showcase.dismiss(step, &mut self.stage, cx);
    }

    /// Activate `index`, skipping suppressed steps until one is pending or
    /// shown, or the list runs out.
    fn activate(&mut self, mut index: usize, cx: &mut ShowcaseContext<'_>) {
        while let Some(step) = self.steps.get(index) {
            let (showcase, progress) = Showcase::display(step, &mut self.stage, cx);
            self.current = Some(showcase);
            if let Progress::Failed(error) = progress {
                if let Some(next) = self.recover(error, cx) {
                    index = next;
                    continue;
                }
            }
            info!(message = "sequence.transition", from = ?self.state, to = index);
            self.state = SequenceState::Active(index);
            return;
        }
        self.finish(cx);
    }

    fn finish(&mut self, cx: &mut ShowcaseContext<'_>) {
        self.current = None;
        self.stage.overlay.detach(cx.host);
        info!(message = "sequence.finished", from = ?self.state);
        self.state = SequenceState::Completed;
        self.stage.events.push_back(TourEvent::Finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use bubble_core::geometry::Rect;
    use bubble_core::metrics::ScreenMetrics;

    use crate::host::ElementId;

    fn three_steps() -> Vec<StepConfig> {
        vec![
            StepConfig::new("a").target(ElementId(1)),
            StepConfig::new("b").target(ElementId(2)),
            StepConfig::new("c"),
        ]
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let err = Sequence::with_steps(vec![StepConfig::new("x"), StepConfig::new("x")]).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateStepId("x".into()));
    }

    #[test]
    fn empty_sequence_finishes_on_start() {
        let mut harness = Harness::phone();
        let mut sequence = Sequence::with_steps(Vec::new()).unwrap();
        sequence.start(&mut harness.cx());
        assert!(sequence.is_completed());
        assert_eq!(sequence.drain_events(), vec![TourEvent::Finished]);
        assert_eq!(harness.host.attach_count(), 0);
    }

    #[test]
    fn start_twice_is_ignored() {
        let mut harness = Harness::phone();
        harness.host.place(ElementId(1), Rect::new(100, 200, 80, 40));
        let mut sequence = Sequence::with_steps(three_steps()).unwrap();
        sequence.start(&mut harness.cx());
        sequence.start(&mut harness.cx());
        assert_eq!(sequence.state(), SequenceState::Active(0));
        assert_eq!(harness.scheduler.pending().len(), 1);
    }

    #[test]
    fn settle_then_show() {
        let mut harness = Harness::phone();
        harness.host.place(ElementId(1), Rect::new(100, 200, 80, 40));
        let mut sequence = Sequence::with_steps(three_steps()).unwrap();
        sequence.start(&mut harness.cx());
        assert_eq!(sequence.current_phase(), Some(StepPhase::Settling));
        assert!(sequence.overlay().is_some());

        harness.run_timers(&mut sequence);
        assert_eq!(sequence.current_phase(), Some(StepPhase::Shown));
        assert!(sequence.current_placement().is_some());
        assert_eq!(
            sequence.drain_events(),
            vec![TourEvent::StepShown {
                step: "a".into(),
                index: 0
            }]
        );
    }

    #[test]
    fn bubble_click_does_not_dismiss() {
        let mut harness = Harness::phone();
        harness.host.place(ElementId(1), Rect::new(100, 200, 80, 40));
        let mut sequence = Sequence::with_steps(three_steps()).unwrap();
        sequence.start(&mut harness.cx());
        harness.run_timers(&mut sequence);
        sequence.drain_events();

        sequence.on_click(ClickTarget::Bubble, &mut harness.cx());
        assert_eq!(sequence.state(), SequenceState::Active(0));
        assert_eq!(
            sequence.drain_events(),
            vec![TourEvent::BubbleClick { step: "a".into() }]
        );
    }

    #[test]
    fn click_before_shown_is_ignored() {
        let mut harness = Harness::phone();
        harness.host.place(ElementId(1), Rect::new(100, 200, 80, 40));
        let mut sequence = Sequence::with_steps(three_steps()).unwrap();
        sequence.start(&mut harness.cx());
        sequence.on_click(ClickTarget::Close, &mut harness.cx());
        assert_eq!(sequence.state(), SequenceState::Active(0));
        assert!(sequence.drain_events().is_empty());
    }

    #[test]
    fn dismiss_when_idle_is_noop() {
        let mut harness = Harness::phone();
        let mut sequence = Sequence::with_steps(three_steps()).unwrap();
        assert!(!sequence.dismiss_current(&mut harness.cx()));
        assert!(!sequence.dismiss("a", &mut harness.cx()));
        assert_eq!(sequence.state(), SequenceState::Idle);
    }

    #[test]
    fn skip_recovery_advances_past_failed_step() {
        let mut harness = Harness::new(ScreenMetrics::new(1080, 1920).density(0.0));
        let mut sequence =
            Sequence::with_steps(vec![StepConfig::new("a"), StepConfig::new("b")]).unwrap();
        sequence.start(&mut harness.cx());
        harness.run_timers(&mut sequence);

        assert_eq!(sequence.state(), SequenceState::Active(1));
        assert_eq!(
            sequence.drain_events(),
            vec![
                TourEvent::StepSkipped {
                    step: "a".into(),
                    index: 0,
                    reason: SkipReason::InvalidMetrics
                },
                TourEvent::StepDismissed {
                    step: "a".into(),
                    index: 0
                },
            ]
        );
    }

    #[test]
    fn ignore_recovery_leaves_active_step_alone() {
        let mut harness = Harness::phone();
        harness.host.place(ElementId(1), Rect::new(100, 200, 80, 40));
        let mut sequence = Sequence::with_steps(three_steps()).unwrap();
        sequence.start(&mut harness.cx());
        let (settle, _) = harness.scheduler.pending()[0];
        harness.run_timers(&mut sequence);
        sequence.drain_events();

        assert_eq!(
            sequence.recover(ShowcaseError::NoActiveContainer, &mut harness.cx()),
            None
        );
        sequence.on_timer(settle, &mut harness.cx());
        assert!(!sequence.dismiss("b", &mut harness.cx()));
        assert_eq!(sequence.state(), SequenceState::Active(0));
        assert_eq!(sequence.current_phase(), Some(StepPhase::Shown));
        assert!(sequence.drain_events().is_empty());
    }
}
