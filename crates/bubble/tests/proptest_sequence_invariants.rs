//! Property-based invariant tests for the sequence controller.
//!
//! 1. Every step is dismissed exactly once, in list order
//! 2. Only steps that are neither suppressed nor hidden are shown
//! 3. At most one overlay is ever attached, and none is left behind
//! 4. Cancelling at any point leaves no pending work and silences late tasks

use bubble::{ElementId, Rect, Sequence, ShownStore, Size, StepConfig, StoreKey, TourEvent};
use bubble_runtime::testing::Harness;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct StepShape {
    suppressed: bool,
    has_target: bool,
    laid_out: bool,
    visible: bool,
}

impl StepShape {
    fn is_shown(self) -> bool {
        !self.suppressed && (!self.has_target || self.visible)
    }
}

fn step_shape() -> impl Strategy<Value = StepShape> {
    (any::<bool>(), any::<bool>(), any::<bool>(), prop::bool::weighted(0.8)).prop_map(
        |(suppressed, has_target, laid_out, visible)| StepShape {
            suppressed,
            has_target,
            laid_out,
            visible,
        },
    )
}

fn tour() -> impl Strategy<Value = Vec<StepShape>> {
    prop::collection::vec(step_shape(), 1..7)
}

fn setup(shapes: &[StepShape]) -> (Harness, Sequence) {
    let mut harness = Harness::phone();
    let mut steps = Vec::new();
    for (i, shape) in shapes.iter().enumerate() {
        let id = format!("s{i}");
        let mut step = StepConfig::new(id.clone()).show_once(id.clone());
        if shape.suppressed {
            harness.store.set(&StoreKey::new(&id));
        }
        if shape.has_target {
            let element = ElementId(i as u64 + 1);
            let (x, y) = if shape.visible {
                (100 + 10 * i as i32, 300 + 150 * i as i32)
            } else {
                (0, 0)
            };
            let size = if shape.laid_out { (80, 40) } else { (0, 0) };
            harness
                .host
                .place(element, Rect::new(x, y, size.0, size.1));
            step = step.target(element);
        }
        steps.push(step);
    }
    let sequence = Sequence::with_steps(steps).unwrap();
    (harness, sequence)
}

/// Advance one host-side step: complete a pending layout, fire timers, or
/// dismiss the shown bubble.
fn advance(harness: &mut Harness, sequence: &mut Sequence) {
    if let Some(&(element, _)) = harness.host.subscriptions().first() {
        harness.host.resize(element, Size::new(80, 40));
        harness.fire_layout(sequence, element);
    } else if !harness.scheduler.pending().is_empty() {
        harness.run_timers(sequence);
    } else {
        sequence.dismiss_current(&mut harness.cx());
    }
}

fn dismissed_indices(events: &[TourEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            TourEvent::StepDismissed { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Full runs
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn full_run_dismisses_each_step_once(shapes in tour()) {
        let (mut harness, mut sequence) = setup(&shapes);
        sequence.start(&mut harness.cx());
        for _ in 0..64 {
            if sequence.is_completed() {
                break;
            }
            advance(&mut harness, &mut sequence);
        }
        prop_assert!(sequence.is_completed());

        let events = sequence.drain_events();
        let expected: Vec<usize> = (0..shapes.len()).collect();
        prop_assert_eq!(dismissed_indices(&events), expected);
        prop_assert_eq!(events.last(), Some(&TourEvent::Finished));
        prop_assert_eq!(
            events.iter().filter(|e| matches!(e, TourEvent::Finished)).count(),
            1
        );
    }

    #[test]
    fn only_eligible_steps_are_shown(shapes in tour()) {
        let (mut harness, mut sequence) = setup(&shapes);
        sequence.start(&mut harness.cx());
        for _ in 0..64 {
            if sequence.is_completed() {
                break;
            }
            advance(&mut harness, &mut sequence);
        }

        let shown: Vec<usize> = sequence
            .drain_events()
            .iter()
            .filter_map(|event| match event {
                TourEvent::StepShown { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        let expected: Vec<usize> = shapes
            .iter()
            .enumerate()
            .filter(|(_, shape)| shape.is_shown())
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(shown, expected);

        for i in 0..shapes.len() {
            let key = format!("s{i}");
            prop_assert!(harness.store.has(&StoreKey::new(&key)));
        }
    }

    #[test]
    fn overlay_attached_at_most_once(shapes in tour()) {
        let (mut harness, mut sequence) = setup(&shapes);
        sequence.start(&mut harness.cx());
        for _ in 0..64 {
            if sequence.is_completed() {
                break;
            }
            prop_assert!(harness.host.overlapping_attaches() == 0);
            advance(&mut harness, &mut sequence);
        }

        let any_displayed = shapes.iter().any(|shape| !shape.suppressed);
        prop_assert_eq!(harness.host.attach_count(), usize::from(any_displayed));
        prop_assert_eq!(harness.host.attached(), None);
        prop_assert_eq!(sequence.pending_tasks(), 0);
        prop_assert!(harness.surface.visible().is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Cancellation at an arbitrary point
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cancel_anywhere_leaves_nothing_behind(shapes in tour(), steps_before in 0usize..12) {
        let (mut harness, mut sequence) = setup(&shapes);
        sequence.start(&mut harness.cx());
        for _ in 0..steps_before {
            if sequence.is_completed() {
                break;
            }
            advance(&mut harness, &mut sequence);
        }

        let late_layouts: Vec<_> = harness.host.subscriptions().to_vec();
        let late_timers: Vec<_> = harness.scheduler.pending().to_vec();
        let was_completed = sequence.is_completed();
        sequence.cancel(&mut harness.cx());
        let events = sequence.drain_events();

        prop_assert!(sequence.is_completed());
        prop_assert_eq!(sequence.pending_tasks(), 0);
        prop_assert!(harness.host.subscriptions().is_empty());
        prop_assert!(harness.scheduler.pending().is_empty());
        prop_assert_eq!(harness.host.attached(), None);
        prop_assert!(harness.surface.visible().is_empty());
        if !was_completed {
            prop_assert_eq!(events.last(), Some(&TourEvent::Cancelled));
        }

        let mut indices = dismissed_indices(&events);
        let total = indices.len();
        indices.dedup();
        prop_assert_eq!(indices.len(), total);

        for (_, task) in late_layouts {
            sequence.on_layout(task, &mut harness.cx());
        }
        for (task, _) in late_timers {
            sequence.on_timer(task, &mut harness.cx());
        }
        prop_assert!(sequence.drain_events().is_empty());
    }
}
