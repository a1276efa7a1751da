#![forbid(unsafe_code)]

//! Bubble placement controller: one step from show-once check to dismiss.
//!
//! A [`Showcase`] is created when its step becomes active and walks through
//! these phases:
//!
//! ```text
//! Starting ──show-once hit──────────────────────────────▶ Skipped
//!    │
//!    ├─target has no size──▶ AwaitingLayout ──laid out──┐
//!    │                          ▲    │                  │
//!    │                          └────┘ still empty      │
//!    ▼                                                  ▼
//! attach overlay ─────────────────────────────────▶ Settling
//!                                                       │ settle delay
//!                                                       ▼
//!                                   placement ok ──▶ Shown
//!                                   not visible ──▶ Skipped
//!
//! any phase ──dismiss──▶ Dismissed (exactly once)
//! ```
//!
//! The shared overlay is attached by whichever step first reaches
//! `Settling`, not by the step flagged first in the list. When leading steps
//! are suppressed, a later step attaches it and logs `overlay.attach_late`.
//! It is detached when the step flagged last is dismissed.
//!
//! Failures surface as `Progress::Failed`; the sequence decides what to
//! do from [`ShowcaseError::recovery`].
//!
//! The controller never blocks. Each asynchronous boundary is a
//! [`DeferredTask`](crate::deferred::DeferredTask) tied to this display's
//! cancellation source, so dismissing the step turns any late firing into a
//! no-op.

use std::collections::VecDeque;

use bubble_core::geometry::Rect;
use bubble_core::metrics::MetricsProvider;
use bubble_core::placement::{PlacementEngine, PlacementRequest, PlacementResult};
use bubble_core::{debug, info, warn};

use crate::cancellation::CancellationSource;
use crate::config::{ShowcaseTiming, TourStep};
use crate::deferred::{Scheduler, TaskId, TaskKind, TaskRegistry};
use crate::error::ShowcaseError;
use crate::events::{ClickTarget, TourEvent};
use crate::host::{ElementId, HostTree, OverlayId};
use crate::store::ShownStore;
use crate::surface::{BubbleFrame, HighlightRequest, RenderSurface};

/// Host-side collaborators, borrowed for the duration of one call.
pub struct ShowcaseContext<'a> {
    pub host: &'a mut dyn HostTree,
    pub surface: &'a mut dyn RenderSurface,
    pub store: &'a mut dyn ShownStore,
    pub metrics: &'a dyn MetricsProvider,
    pub scheduler: &'a mut dyn Scheduler,
}

impl<'a> ShowcaseContext<'a> {
    /// Bundle the collaborators.
    pub fn new(
        host: &'a mut dyn HostTree,
        surface: &'a mut dyn RenderSurface,
        store: &'a mut dyn ShownStore,
        metrics: &'a dyn MetricsProvider,
        scheduler: &'a mut dyn Scheduler,
    ) -> Self {
        Self {
            host,
            surface,
            store,
            metrics,
            scheduler,
        }
    }
}

/// The shared dim container. At most one is attached at a time.
#[derive(Debug, Default)]
pub(crate) struct OverlaySlot {
    current: Option<OverlayId>,
}

impl OverlaySlot {
    pub(crate) fn current(&self) -> Option<OverlayId> {
        self.current
    }

    /// Attach if nothing is attached. Returns the handle and whether this
    /// call attached it.
    pub(crate) fn ensure_attached(&mut self, host: &mut dyn HostTree) -> (OverlayId, bool) {
        match self.current {
            Some(overlay) => (overlay, false),
            None => {
                let overlay = host.attach_overlay();
                info!(message = "overlay.attach", overlay = overlay.0);
                self.current = Some(overlay);
                (overlay, true)
            }
        }
    }

    /// Detach if attached. Returns whether anything was detached.
    pub(crate) fn detach(&mut self, host: &mut dyn HostTree) -> bool {
        match self.current.take() {
            Some(overlay) => {
                host.detach_overlay(overlay);
                info!(message = "overlay.detach", overlay = overlay.0);
                true
            }
            None => false,
        }
    }
}

/// State shared by consecutive showcases of one sequence.
#[derive(Debug)]
pub(crate) struct Stage {
    pub(crate) tasks: TaskRegistry,
    pub(crate) overlay: OverlaySlot,
    pub(crate) events: VecDeque<TourEvent>,
    pub(crate) engine: PlacementEngine,
    pub(crate) timing: ShowcaseTiming,
}

impl Stage {
    pub(crate) fn new(engine: PlacementEngine, timing: ShowcaseTiming) -> Self {
        Self {
            tasks: TaskRegistry::new(),
            overlay: OverlaySlot::default(),
            events: VecDeque::new(),
            engine,
            timing,
        }
    }
}

/// Observable phase of the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Waiting for the target's next layout pass.
    AwaitingLayout,
    /// Overlay attached, waiting for the settle delay.
    Settling,
    /// Bubble presented.
    Shown,
    /// Torn down.
    Dismissed,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Starting,
    AwaitingLayout { task: TaskId, element: ElementId },
    Settling { task: TaskId },
    Shown { placement: PlacementResult },
    Dismissed,
}

/// Result of driving a showcase forward.
#[derive(Debug)]
pub(crate) enum Progress {
    /// Waiting on a deferred task.
    Pending,
    /// The bubble is on screen.
    Shown,
    /// The step cannot continue. The sequence applies the error's
    /// [`Recovery`](crate::error::Recovery).
    Failed(ShowcaseError),
}

/// Controller for one step display.
#[derive(Debug)]
pub(crate) struct Showcase {
    index: usize,
    cancel: CancellationSource,
    phase: Phase,
    fade_in_background: bool,
}

impl Showcase {
    /// Begin displaying `step`.
    pub(crate) fn display(
        step: &TourStep,
        stage: &mut Stage,
        cx: &mut ShowcaseContext<'_>,
    ) -> (Self, Progress) {
        let mut showcase = Self {
            index: step.index(),
            cancel: CancellationSource::new(),
            phase: Phase::Starting,
            fade_in_background: false,
        };

        if let Some(key) = step.config().store_key() {
            if cx.store.has(&key) {
                info!(
                    message = "showcase.suppressed",
                    step = step.id(),
                    key = key.local()
                );
                let error = ShowcaseError::AlreadyShown {
                    key: key.local().to_owned(),
                };
                return (showcase, Progress::Failed(error));
            }
            // Recorded up front so an interrupted display still counts.
            cx.store.set(&key);
        }

        let progress = match step.config().target {
            Some(element) if cx.host.size(element).is_empty() => {
                showcase.await_layout(element, stage, cx)
            }
            _ => showcase.begin_settle(step, stage, cx),
        };
        (showcase, progress)
    }

    /// Index of the step being displayed.
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn phase(&self) -> StepPhase {
        match self.phase {
            Phase::Starting | Phase::Settling { .. } => StepPhase::Settling,
            Phase::AwaitingLayout { .. } => StepPhase::AwaitingLayout,
            Phase::Shown { .. } => StepPhase::Shown,
            Phase::Dismissed => StepPhase::Dismissed,
        }
    }

    /// Placement of the presented bubble.
    pub(crate) fn placement(&self) -> Option<&PlacementResult> {
        match &self.phase {
            Phase::Shown { placement } => Some(placement),
            _ => None,
        }
    }

    /// Whether `task` is the one this showcase is waiting on.
    pub(crate) fn awaits(&self, task: TaskId) -> bool {
        match self.phase {
            Phase::AwaitingLayout { task: t, .. } | Phase::Settling { task: t } => t == task,
            _ => false,
        }
    }

    fn await_layout(
        &mut self,
        element: ElementId,
        stage: &mut Stage,
        cx: &mut ShowcaseContext<'_>,
    ) -> Progress {
        let task = stage
            .tasks
            .issue(TaskKind::Layout { element }, self.index, self.cancel.token());
        cx.host.subscribe_on_next_layout(element, task);
        debug!(
            message = "showcase.await_layout",
            step = self.index,
            element = element.0,
            task = task.get()
        );
        self.phase = Phase::AwaitingLayout { task, element };
        Progress::Pending
    }

    fn begin_settle(
        &mut self,
        step: &TourStep,
        stage: &mut Stage,
        cx: &mut ShowcaseContext<'_>,
    ) -> Progress {
        // The first step to get here attaches the overlay, whatever its
        // position. A suppressed leading step would otherwise leave the tour
        // without one.
        let attached = stage.overlay.ensure_attached(cx.host).1;
        if attached && !step.is_first() {
            debug!(
                message = "overlay.attach_late",
                step = step.id(),
                overlay = ?stage.overlay.current()
            );
        }
        self.fade_in_background = attached;

        let delay = stage.timing.settle_delay;
        let task = stage
            .tasks
            .issue(TaskKind::Settle { delay }, self.index, self.cancel.token());
        cx.scheduler.schedule(task, delay);
        self.phase = Phase::Settling { task };
        Progress::Pending
    }

    /// The target's layout pass completed.
    pub(crate) fn on_layout(
        &mut self,
        step: &TourStep,
        stage: &mut Stage,
        cx: &mut ShowcaseContext<'_>,
    ) -> Progress {
        let Phase::AwaitingLayout { element, .. } = self.phase else {
            return Progress::Pending;
        };
        if cx.host.size(element).is_empty() {
            // The subscription was one-shot; ask for the next pass.
            return self.await_layout(element, stage, cx);
        }
        self.begin_settle(step, stage, cx)
    }

    /// The settle delay elapsed: place and present.
    pub(crate) fn on_settled(
        &mut self,
        step: &TourStep,
        stage: &mut Stage,
        cx: &mut ShowcaseContext<'_>,
    ) -> Progress {
        if !matches!(self.phase, Phase::Settling { .. }) {
            return Progress::Pending;
        }
        self.phase = Phase::Starting;

        let config = step.config();
        let (overlay, attached) = stage.overlay.ensure_attached(cx.host);
        self.fade_in_background |= attached;

        let metrics = cx.metrics.snapshot();
        let overlay_origin = cx.host.overlay_origin(overlay);
        let target = match config.target {
            Some(element) => match cx.host.on_screen_origin(element) {
                Some(origin) => Some(Rect::from_origin_size(origin, cx.host.size(element))),
                None => {
                    warn!(
                        message = "showcase.target_detached",
                        step = step.id(),
                        element = element.0
                    );
                    return Progress::Failed(ShowcaseError::TargetDetached(element));
                }
            },
            None => None,
        };

        let request = PlacementRequest {
            target,
            overlay_offset: overlay_origin,
            hint: &config.arrow_hint,
            centered: config.centered,
        };
        let surface = &mut *cx.surface;
        let content = &config.content;
        let result = stage
            .engine
            .compute(&request, &metrics, |width| surface.measure_bubble(content, width));

        let placement = match result {
            Ok(placement) => placement,
            Err(error) => {
                warn!(message = "showcase.skip", step = step.id(), error = %error);
                return Progress::Failed(error.into());
            }
        };

        let highlight = placement
            .highlight
            .zip(config.target)
            .map(|(bounds, element)| {
                HighlightRequest::new(
                    element,
                    bounds,
                    config.highlight_mode,
                    metrics.width - overlay_origin.x,
                )
            });
        let frame = BubbleFrame {
            step_id: step.id(),
            step_index: step.index(),
            placement: &placement,
            shape: placement.shape(&metrics, stage.engine.config()),
            content,
            highlight,
            timing: &stage.timing,
            fade_in_background: self.fade_in_background,
        };
        cx.surface.present(overlay, frame);

        info!(
            message = "showcase.shown",
            step = step.id(),
            centered = placement.centered
        );
        stage.events.push_back(TourEvent::StepShown {
            step: step.id().to_owned(),
            index: step.index(),
        });
        self.phase = Phase::Shown { placement };
        Progress::Shown
    }

    /// A click landed on the overlay. Returns whether the step should be
    /// dismissed.
    pub(crate) fn on_click(&self, target: ClickTarget, step: &TourStep, stage: &mut Stage) -> bool {
        if !matches!(self.phase, Phase::Shown { .. }) {
            return false;
        }
        stage.events.push_back(TourEvent::click(target, step.id()));
        let config = step.config();
        match target {
            ClickTarget::Bubble => false,
            ClickTarget::Background => config.cancelable,
            ClickTarget::Target => !config.disable_target_click,
            ClickTarget::Close => true,
        }
    }

    /// Tear down this step. Returns `false` if it was already dismissed.
    pub(crate) fn dismiss(
        &mut self,
        step: &TourStep,
        stage: &mut Stage,
        cx: &mut ShowcaseContext<'_>,
    ) -> bool {
        match self.phase {
            Phase::Dismissed => return false,
            Phase::AwaitingLayout { task, element } => {
                cx.host.unsubscribe_layout(element, task);
                stage.tasks.discard(task);
            }
            Phase::Settling { task } => {
                cx.scheduler.cancel(task);
                stage.tasks.discard(task);
            }
            Phase::Shown { .. } => {
                if let Some(overlay) = stage.overlay.current() {
                    cx.surface.clear(overlay, step.id());
                }
            }
            Phase::Starting => {}
        }
        self.cancel.cancel();
        self.phase = Phase::Dismissed;

        if step.is_last() {
            stage.overlay.detach(cx.host);
        }

        debug!(message = "showcase.dismiss", step = step.id());
        stage.events.push_back(TourEvent::StepDismissed {
            step: step.id().to_owned(),
            index: step.index(),
        });
        true
    }
}
