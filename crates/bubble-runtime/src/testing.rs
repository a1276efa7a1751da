#![forbid(unsafe_code)]

//! In-memory doubles for the host collaborators.
//!
//! [`Harness`] bundles a [`FakeHost`], a [`RecordingSurface`], a
//! [`MemoryStore`] and a [`ManualScheduler`] so a [`Sequence`] can be driven
//! deterministically: the test decides when layouts complete and when timers
//! fire, then inspects what was attached, presented and cleared.

use std::time::Duration;

use ahash::AHashMap;
use bubble_core::geometry::{Point, Rect, Size};
use bubble_core::metrics::ScreenMetrics;
use bubble_core::placement::PlacementResult;
use bubble_core::shape::BubbleShape;

use crate::deferred::{Scheduler, TaskId};
use crate::host::{ElementId, HostTree, OverlayId};
use crate::sequence::Sequence;
use crate::showcase::ShowcaseContext;
use crate::store::MemoryStore;
use crate::surface::{BubbleContent, BubbleFrame, HighlightRequest, RenderSurface};

/// Host tree backed by a map of element rectangles.
#[derive(Debug, Default)]
pub struct FakeHost {
    elements: AHashMap<ElementId, Rect>,
    layout_subscriptions: Vec<(ElementId, TaskId)>,
    overlay_origin: Point,
    next_overlay: u64,
    attached: Option<OverlayId>,
    attach_count: usize,
    detach_calls: usize,
    overlapping_attaches: usize,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an element on screen at `rect`.
    pub fn place(&mut self, element: ElementId, rect: Rect) {
        self.elements.insert(element, rect);
    }

    /// Change an element's size, keeping its origin.
    pub fn resize(&mut self, element: ElementId, size: Size) {
        let origin = self
            .elements
            .get(&element)
            .map_or(Point::default(), Rect::origin);
        self.elements
            .insert(element, Rect::from_origin_size(origin, size));
    }

    /// Take an element out of the tree.
    pub fn remove(&mut self, element: ElementId) {
        self.elements.remove(&element);
    }

    /// Offset the overlay container from the screen origin.
    pub fn set_overlay_origin(&mut self, origin: Point) {
        self.overlay_origin = origin;
    }

    /// Complete a layout pass for `element`, returning the tasks to report.
    /// Subscriptions are one-shot.
    pub fn fire_layout(&mut self, element: ElementId) -> Vec<TaskId> {
        let mut fired = Vec::new();
        self.layout_subscriptions.retain(|&(subscribed, task)| {
            if subscribed == element {
                fired.push(task);
                false
            } else {
                true
            }
        });
        fired
    }

    /// Pending layout subscriptions.
    pub fn subscriptions(&self) -> &[(ElementId, TaskId)] {
        &self.layout_subscriptions
    }

    /// The overlay currently attached, if any.
    pub fn attached(&self) -> Option<OverlayId> {
        self.attached
    }

    /// How many overlays were ever attached.
    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    /// How many detach calls were made, including redundant ones.
    pub fn detach_calls(&self) -> usize {
        self.detach_calls
    }

    /// Attaches made while another overlay was still attached.
    pub fn overlapping_attaches(&self) -> usize {
        self.overlapping_attaches
    }
}

impl HostTree for FakeHost {
    fn on_screen_origin(&self, element: ElementId) -> Option<Point> {
        self.elements.get(&element).map(|rect| rect.origin())
    }

    fn size(&self, element: ElementId) -> Size {
        self.elements
            .get(&element)
            .map_or(Size::default(), |rect| rect.size())
    }

    fn subscribe_on_next_layout(&mut self, element: ElementId, task: TaskId) {
        self.layout_subscriptions.push((element, task));
    }

    fn unsubscribe_layout(&mut self, element: ElementId, task: TaskId) {
        self.layout_subscriptions
            .retain(|&entry| entry != (element, task));
    }

    fn attach_overlay(&mut self) -> OverlayId {
        if self.attached.is_some() {
            self.overlapping_attaches += 1;
        }
        self.next_overlay += 1;
        let overlay = OverlayId(self.next_overlay);
        self.attached = Some(overlay);
        self.attach_count += 1;
        overlay
    }

    fn detach_overlay(&mut self, overlay: OverlayId) {
        self.detach_calls += 1;
        if self.attached == Some(overlay) {
            self.attached = None;
        }
    }

    fn overlay_origin(&self, _overlay: OverlayId) -> Point {
        self.overlay_origin
    }
}

/// Owned copy of a presented [`BubbleFrame`].
#[derive(Debug, Clone)]
pub struct PresentedFrame {
    pub overlay: OverlayId,
    pub step_id: String,
    pub step_index: usize,
    pub placement: PlacementResult,
    pub shape: BubbleShape,
    pub title: String,
    pub highlight: Option<HighlightRequest>,
    pub fade_in_background: bool,
}

/// Surface that records every call.
#[derive(Debug)]
pub struct RecordingSurface {
    /// Height returned by every measurement.
    pub content_height: i32,
    measured_widths: Vec<i32>,
    presented: Vec<PresentedFrame>,
    cleared: Vec<String>,
    visible: Vec<String>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::with_height(120)
    }
}

impl RecordingSurface {
    /// Surface whose content always measures `height` pixels tall.
    pub fn with_height(height: i32) -> Self {
        Self {
            content_height: height,
            measured_widths: Vec::new(),
            presented: Vec::new(),
            cleared: Vec::new(),
            visible: Vec::new(),
        }
    }

    /// Widths the controllers measured at.
    pub fn measured_widths(&self) -> &[i32] {
        &self.measured_widths
    }

    /// Every frame presented, oldest first.
    pub fn presented(&self) -> &[PresentedFrame] {
        &self.presented
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<&PresentedFrame> {
        self.presented.last()
    }

    /// Step ids cleared, in order.
    pub fn cleared(&self) -> &[String] {
        &self.cleared
    }

    /// Step ids still drawn.
    pub fn visible(&self) -> &[String] {
        &self.visible
    }
}

impl RenderSurface for RecordingSurface {
    fn measure_bubble(&mut self, _content: &BubbleContent, width: i32) -> i32 {
        self.measured_widths.push(width);
        self.content_height
    }

    fn present(&mut self, overlay: OverlayId, frame: BubbleFrame<'_>) {
        self.visible.push(frame.step_id.to_owned());
        self.presented.push(PresentedFrame {
            overlay,
            step_id: frame.step_id.to_owned(),
            step_index: frame.step_index,
            placement: *frame.placement,
            shape: frame.shape,
            title: frame.content.title.clone(),
            highlight: frame.highlight,
            fade_in_background: frame.fade_in_background,
        });
    }

    fn clear(&mut self, _overlay: OverlayId, step_id: &str) {
        self.cleared.push(step_id.to_owned());
        self.visible.retain(|visible| visible != step_id);
    }
}

/// Scheduler that only fires when told to.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: Vec<(TaskId, Duration)>,
    cancelled: Vec<TaskId>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers scheduled and not yet taken or cancelled.
    pub fn pending(&self) -> &[(TaskId, Duration)] {
        &self.pending
    }

    /// Timers the controllers cancelled.
    pub fn cancelled(&self) -> &[TaskId] {
        &self.cancelled
    }

    /// Remove and return every pending timer, oldest first.
    pub fn take_due(&mut self) -> Vec<TaskId> {
        self.pending.drain(..).map(|(task, _)| task).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, task: TaskId, delay: Duration) {
        self.pending.push((task, delay));
    }

    fn cancel(&mut self, task: TaskId) {
        self.pending.retain(|&(pending, _)| pending != task);
        self.cancelled.push(task);
    }
}

/// All doubles in one place.
#[derive(Debug)]
pub struct Harness {
    pub host: FakeHost,
    pub surface: RecordingSurface,
    pub store: MemoryStore,
    pub metrics: ScreenMetrics,
    pub scheduler: ManualScheduler,
}

impl Harness {
    /// Harness over the given screen.
    pub fn new(metrics: ScreenMetrics) -> Self {
        Self {
            host: FakeHost::new(),
            surface: RecordingSurface::default(),
            store: MemoryStore::new(),
            metrics,
            scheduler: ManualScheduler::new(),
        }
    }

    /// 1080x1920 phone at 1x density.
    pub fn phone() -> Self {
        Self::new(ScreenMetrics::new(1080, 1920))
    }

    /// Borrow everything as a controller context.
    pub fn cx(&mut self) -> ShowcaseContext<'_> {
        ShowcaseContext::new(
            &mut self.host,
            &mut self.surface,
            &mut self.store,
            &self.metrics,
            &mut self.scheduler,
        )
    }

    /// Fire every timer pending right now. Timers scheduled while these
    /// fire stay pending. Returns how many fired.
    pub fn run_timers(&mut self, sequence: &mut Sequence) -> usize {
        let due = self.scheduler.take_due();
        let fired = due.len();
        for task in due {
            sequence.on_timer(task, &mut self.cx());
        }
        fired
    }

    /// Complete a layout pass for `element` and report its subscriptions.
    pub fn fire_layout(&mut self, sequence: &mut Sequence, element: ElementId) -> usize {
        let due = self.host.fire_layout(element);
        let fired = due.len();
        for task in due {
            sequence.on_layout(task, &mut self.cx());
        }
        fired
    }
}
