#![forbid(unsafe_code)]

//! Placement engine for anchored message bubbles.
//!
//! [`PlacementEngine`] turns a target rectangle, a screen snapshot and the
//! caller's arrow hint into a [`PlacementResult`]: which overlay edges the
//! bubble hangs from, the margins from those edges, the bubble bounds, and
//! where along the bubble's edge the arrow tip goes.
//!
//! # Rules
//!
//! 1. No target, a multi-side hint, or an explicit centered request: the
//!    bubble is centered vertically with no arrow.
//! 2. A target whose overlay-relative origin is `(0, 0)`, negative on either
//!    axis, or whose size is zero is not laid out yet: placement fails with
//!    [`PlacementError::TargetNotVisible`].
//! 3. An empty hint resolves to [`ArrowSide::Top`] when the target's center
//!    lies strictly in the upper half of the overlay, else
//!    [`ArrowSide::Bottom`].
//! 4. The bubble takes the span on the far side of the target from its
//!    arrow; on wide layouts the span perpendicular to the arrow is clamped
//!    to the maximum bubble width.
//! 5. The arrow tip tracks the target's center along the bubble edge,
//!    clamped to stay a security margin away from the rounded corners.
//!
//! # Example
//!
//! ```
//! use bubble_core::arrow::ArrowHint;
//! use bubble_core::geometry::{Point, Rect};
//! use bubble_core::metrics::ScreenMetrics;
//! use bubble_core::placement::{PlacementEngine, PlacementRequest};
//!
//! let metrics = ScreenMetrics::new(1080, 1920);
//! let hint = ArrowHint::none();
//! let request = PlacementRequest::new(&hint)
//!     .target(Rect::new(500, 100, 80, 40))
//!     .overlay_offset(Point::new(0, 0));
//! let placement = PlacementEngine::default()
//!     .compute(&request, &metrics, |_width| 300)
//!     .unwrap();
//! assert!(!placement.centered);
//! ```

use std::fmt;

use crate::arrow::{AnchorEdges, ArrowHint, ArrowSide};
use crate::geometry::{Point, Rect, Sides};
use crate::metrics::ScreenMetrics;
use crate::shape::{BubbleShape, Rhombus};

use crate::{debug, trace};

/// Maximum bubble width on wide layouts, in dp.
pub const MAX_BUBBLE_WIDTH_DP: i32 = 420;
/// Width of the arrow glyph, in dp.
pub const ARROW_WIDTH_DP: i32 = 20;
/// Inset of the bubble body from the bubble bounds, in dp.
pub const BASE_MARGIN_DP: i32 = 20;
/// Corner radius of the bubble body, in pixels.
pub const CORNER_RADIUS_PX: i32 = 24;

/// Tunable constants for the placement engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacementConfig {
    /// Maximum bubble width on wide layouts (dp).
    pub max_bubble_width_dp: i32,
    /// Arrow glyph width (dp).
    pub arrow_width_dp: i32,
    /// Body inset from the bubble bounds (dp).
    pub base_margin_dp: i32,
    /// Body corner radius (px).
    pub corner_radius_px: i32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_bubble_width_dp: MAX_BUBBLE_WIDTH_DP,
            arrow_width_dp: ARROW_WIDTH_DP,
            base_margin_dp: BASE_MARGIN_DP,
            corner_radius_px: CORNER_RADIUS_PX,
        }
    }
}

impl PlacementConfig {
    /// Set the maximum bubble width on wide layouts.
    #[must_use]
    pub fn max_bubble_width_dp(mut self, dp: i32) -> Self {
        self.max_bubble_width_dp = dp;
        self
    }

    /// Set the arrow width.
    #[must_use]
    pub fn arrow_width_dp(mut self, dp: i32) -> Self {
        self.arrow_width_dp = dp;
        self
    }

    /// Set the body inset.
    #[must_use]
    pub fn base_margin_dp(mut self, dp: i32) -> Self {
        self.base_margin_dp = dp;
        self
    }

    /// Set the body corner radius.
    #[must_use]
    pub fn corner_radius_px(mut self, px: i32) -> Self {
        self.corner_radius_px = px;
        self
    }

    /// Check that every constant is usable.
    pub fn validate(&self) -> Result<(), InvalidPlacementConfig> {
        let checks = [
            ("max_bubble_width_dp", self.max_bubble_width_dp, 1),
            ("arrow_width_dp", self.arrow_width_dp, 1),
            ("base_margin_dp", self.base_margin_dp, 0),
            ("corner_radius_px", self.corner_radius_px, 0),
        ];
        for (field, value, min) in checks {
            if value < min {
                return Err(InvalidPlacementConfig { field, value });
            }
        }
        Ok(())
    }
}

/// A [`PlacementConfig`] field is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPlacementConfig {
    pub field: &'static str,
    pub value: i32,
}

impl fmt::Display for InvalidPlacementConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid placement config: {} = {}", self.field, self.value)
    }
}

impl std::error::Error for InvalidPlacementConfig {}

/// Why a placement could not be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementError {
    /// The target has no size or sits at an undefined position (not laid
    /// out yet, or scrolled off the top/left of the overlay).
    TargetNotVisible {
        /// Target bounds relative to the overlay.
        bounds: Rect,
    },
    /// The screen snapshot has no area or a non-positive density.
    InvalidMetrics(ScreenMetrics),
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotVisible { bounds } => write!(
                f,
                "target not visible at ({}, {}) size {}x{}",
                bounds.x, bounds.y, bounds.width, bounds.height
            ),
            Self::InvalidMetrics(m) => write!(
                f,
                "invalid screen metrics: {}x{} @ {}",
                m.width, m.height, m.density
            ),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Input to one placement pass.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest<'a> {
    /// Target bounds in on-screen coordinates, if the step has a target.
    pub target: Option<Rect>,
    /// On-screen origin of the overlay container.
    pub overlay_offset: Point,
    /// Caller arrow hint.
    pub hint: &'a ArrowHint,
    /// Force the centered layout regardless of target and hint.
    pub centered: bool,
}

impl<'a> PlacementRequest<'a> {
    /// A request with no target, zero offset, and the given hint.
    pub fn new(hint: &'a ArrowHint) -> Self {
        Self {
            target: None,
            overlay_offset: Point::ZERO,
            hint,
            centered: false,
        }
    }

    /// Set the target bounds.
    #[must_use]
    pub fn target(mut self, target: Rect) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the overlay container's on-screen origin.
    #[must_use]
    pub fn overlay_offset(mut self, offset: Point) -> Self {
        self.overlay_offset = offset;
        self
    }

    /// Force the centered layout.
    #[must_use]
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    /// Whether rule 1 applies: the bubble goes in the middle of the overlay.
    pub fn wants_center(&self) -> bool {
        self.centered || self.target.is_none() || self.hint.len() > 1
    }
}

/// Where the bubble and its arrow go.
///
/// All rectangles are in overlay coordinates; the arrow tip is local to the
/// bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementResult {
    /// Overlay edges the bubble hangs from. Empty when centered.
    pub anchor_edges: AnchorEdges,
    /// Distances from the overlay edges.
    pub margins: Sides,
    /// Bubble edge that carries the arrow.
    pub arrow_side: Option<ArrowSide>,
    /// Arrow tip, relative to the bubble's top-left corner.
    pub arrow_tip: Option<Point>,
    /// Centered fallback layout.
    pub centered: bool,
    /// Whether `arrow_side` came from the target position rather than the hint.
    pub default_side: bool,
    /// Bubble bounds.
    pub bubble: Rect,
    /// Target bounds, where the highlight snapshot is drawn.
    pub highlight: Option<Rect>,
}

impl PlacementResult {
    /// The side of the target the bubble occupies.
    ///
    /// An arrow on the bubble's top edge means the bubble sits below the
    /// target, so this is the opposite of [`arrow_side`](Self::arrow_side).
    pub fn bubble_side(&self) -> Option<ArrowSide> {
        self.arrow_side.map(ArrowSide::opposite)
    }

    /// Arrow tip in overlay coordinates.
    pub fn arrow_tip_in_overlay(&self) -> Option<Point> {
        self.arrow_tip.map(|tip| tip.offset(self.bubble.origin()))
    }

    /// Drawing geometry for the rendering surface.
    pub fn shape(&self, metrics: &ScreenMetrics, config: &PlacementConfig) -> BubbleShape {
        let inset = metrics.dp_to_px(config.base_margin_dp);
        let body = Rect::from_size(self.bubble.width, self.bubble.height).inner(Sides::all(inset));
        let arrow = self
            .arrow_tip
            .map(|tip| Rhombus::at(tip, metrics.dp_to_px(config.arrow_width_dp)));
        BubbleShape {
            body,
            corner_radius: config.corner_radius_px,
            arrow,
        }
    }
}

/// Computes bubble placements.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

/// Anchoring decided before the bubble height is known.
#[derive(Debug, Clone, Copy)]
struct Anchoring {
    edges: AnchorEdges,
    margins: Sides,
}

impl PlacementEngine {
    /// Create an engine with the given constants.
    pub const fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// The engine's constants.
    pub const fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Distance the arrow tip keeps from the bubble's corners, in pixels.
    pub fn security_margin(&self, metrics: &ScreenMetrics) -> i32 {
        metrics.dp_to_px(self.config.base_margin_dp)
            + metrics.dp_to_px(2 * self.config.arrow_width_dp / 3)
    }

    /// Compute a placement.
    ///
    /// `measure` receives the bubble width and returns the height the
    /// bubble's content wants at that width.
    pub fn compute<F>(
        &self,
        request: &PlacementRequest<'_>,
        metrics: &ScreenMetrics,
        measure: F,
    ) -> Result<PlacementResult, PlacementError>
    where
        F: FnOnce(i32) -> i32,
    {
        if !metrics.is_valid() {
            return Err(PlacementError::InvalidMetrics(*metrics));
        }

        let offset = request.overlay_offset;
        let overlay = Rect::new(
            0,
            0,
            metrics.width.saturating_sub(offset.x),
            metrics.height.saturating_sub(offset.y),
        );

        let target = match request.target {
            Some(target) if !request.wants_center() => target.relative_to(offset),
            _ => return Ok(self.centered(overlay, metrics, measure)),
        };

        if !is_visible(target) {
            debug!(
                message = "bubble.placement.not_visible",
                x = target.x,
                y = target.y,
                width = target.width,
                height = target.height
            );
            return Err(PlacementError::TargetNotVisible { bounds: target });
        }

        let (side, default_side) = match request.hint.as_single() {
            Some(side) => (side, false),
            None => (default_arrow_side(target, overlay), true),
        };

        let anchoring = self.anchor(side, target, overlay, metrics);
        let bubble = bubble_bounds(anchoring, overlay, measure);
        let tip = self.arrow_tip(side, target, bubble, offset, metrics);

        debug!(
            message = "bubble.placement",
            side = side.as_str(),
            default_side,
            bubble_x = bubble.x,
            bubble_y = bubble.y,
            bubble_width = bubble.width,
            bubble_height = bubble.height,
            tip_x = tip.x,
            tip_y = tip.y
        );

        Ok(PlacementResult {
            anchor_edges: anchoring.edges,
            margins: anchoring.margins,
            arrow_side: Some(side),
            arrow_tip: Some(tip),
            centered: false,
            default_side,
            bubble,
            highlight: Some(target),
        })
    }

    /// Rule 1: vertically centered, horizontally clamped on wide layouts.
    fn centered<F>(&self, overlay: Rect, metrics: &ScreenMetrics, measure: F) -> PlacementResult
    where
        F: FnOnce(i32) -> i32,
    {
        let side_margin = if metrics.wide_layout {
            let max_width = metrics.dp_to_px(self.config.max_bubble_width_dp);
            (overlay.width / 2 - max_width / 2).max(0)
        } else {
            0
        };
        let margins = Sides::new(0, side_margin, 0, side_margin);
        let width = (overlay.width - margins.horizontal_sum()).max(0);
        let height = measure(width).clamp(0, overlay.height);
        let bubble = Rect::new(
            margins.left,
            (overlay.height - height) / 2,
            width,
            height,
        );

        trace!(
            message = "bubble.placement.centered",
            bubble_width = bubble.width,
            bubble_height = bubble.height
        );

        PlacementResult {
            anchor_edges: AnchorEdges::empty(),
            margins,
            arrow_side: None,
            arrow_tip: None,
            centered: true,
            default_side: false,
            bubble,
            highlight: None,
        }
    }

    /// Rule 4: edges and margins for a single resolved side.
    fn anchor(
        &self,
        side: ArrowSide,
        target: Rect,
        overlay: Rect,
        metrics: &ScreenMetrics,
    ) -> Anchoring {
        let wide = metrics.wide_layout;
        let max_width = metrics.dp_to_px(self.config.max_bubble_width_dp);
        // Span the bubble may use on a wide layout, given `available` pixels.
        let clamp_span = |available: i32| available.min(max_width).max(0);
        let wide_or_zero = |value: i32| if wide { value } else { 0 };

        let (w, h) = (overlay.width, overlay.height);
        let upper = in_upper_half(target, overlay);
        let vertical_edge = if upper {
            AnchorEdges::TOP
        } else {
            AnchorEdges::BOTTOM
        };
        let (top, bottom) = if upper {
            (target.y, 0)
        } else {
            (0, h - target.bottom())
        };

        let (edges, margins) = match side {
            ArrowSide::Left => {
                let available = w - target.right();
                (
                    AnchorEdges::LEFT | vertical_edge,
                    Sides::new(
                        top,
                        wide_or_zero(available - clamp_span(available)),
                        bottom,
                        target.right(),
                    ),
                )
            }
            ArrowSide::Right => {
                let available = target.x;
                (
                    AnchorEdges::RIGHT | vertical_edge,
                    Sides::new(
                        top,
                        w - target.x,
                        bottom,
                        wide_or_zero(available - clamp_span(available)),
                    ),
                )
            }
            ArrowSide::Top | ArrowSide::Bottom => {
                let (top, bottom) = if side == ArrowSide::Top {
                    (target.bottom(), 0)
                } else {
                    (0, h - target.y)
                };
                let (horizontal_edge, left, right) = if in_left_half(target, overlay) {
                    let available = w - target.x;
                    (
                        AnchorEdges::LEFT,
                        wide_or_zero(target.x),
                        wide_or_zero(available - clamp_span(available)),
                    )
                } else {
                    // Right-aligned with the target's right edge, so the span
                    // is `x + w` and includes the target's own width. Spanning
                    // only `x` would leave the bubble narrower than the room
                    // it is anchored in and misalign it with the arrow.
                    let available = target.right();
                    (
                        AnchorEdges::RIGHT,
                        wide_or_zero(available - clamp_span(available)),
                        wide_or_zero(w - target.right()),
                    )
                };
                (
                    AnchorEdges::from(side) | horizontal_edge,
                    Sides::new(top, right, bottom, left),
                )
            }
        };

        Anchoring {
            edges,
            margins: Sides::new(
                margins.top.max(0),
                margins.right.max(0),
                margins.bottom.max(0),
                margins.left.max(0),
            ),
        }
    }

    /// Rule 5: arrow tip along the bubble's arrow edge, local to the bubble.
    fn arrow_tip(
        &self,
        side: ArrowSide,
        target: Rect,
        bubble: Rect,
        offset: Point,
        metrics: &ScreenMetrics,
    ) -> Point {
        let margin = metrics.dp_to_px(self.config.base_margin_dp);
        let security = self.security_margin(metrics);

        match side {
            ArrowSide::Left | ArrowSide::Right => {
                // Target bounds are measured below the status bar while the
                // bubble origin is measured from the overlay's screen origin.
                let raw = round_half_up(
                    target.center_y() + metrics.status_bar_height as f32
                        - (offset.y + bubble.y) as f32,
                );
                let y = clamp_to_span(raw, bubble.height, security);
                let x = if side == ArrowSide::Left {
                    margin
                } else {
                    bubble.width - margin
                };
                Point::new(x, y)
            }
            ArrowSide::Top | ArrowSide::Bottom => {
                let raw = round_half_up(target.center_x() - (offset.x + bubble.x) as f32);
                let x = clamp_to_span(raw, bubble.width, security);
                let y = if side == ArrowSide::Top {
                    margin
                } else {
                    bubble.height - margin
                };
                Point::new(x, y)
            }
        }
    }
}

/// Compute a placement with the default constants.
pub fn compute_placement<F>(
    request: &PlacementRequest<'_>,
    metrics: &ScreenMetrics,
    measure: F,
) -> Result<PlacementResult, PlacementError>
where
    F: FnOnce(i32) -> i32,
{
    PlacementEngine::default().compute(request, metrics, measure)
}

/// Side picked for an empty hint. A target centered exactly on the midline
/// resolves to [`ArrowSide::Bottom`].
pub fn default_arrow_side(target: Rect, overlay: Rect) -> ArrowSide {
    if in_upper_half(target, overlay) {
        ArrowSide::Top
    } else {
        ArrowSide::Bottom
    }
}

/// A target that has not been laid out reports `(0, 0)`; anything above or
/// left of the overlay is off screen.
fn is_visible(target: Rect) -> bool {
    !target.is_empty() && target.x >= 0 && target.y >= 0 && (target.x != 0 || target.y != 0)
}

/// Strictly above the horizontal midline. Compared doubled to stay integral.
fn in_upper_half(target: Rect, overlay: Rect) -> bool {
    let doubled_center = 2 * (target.y - overlay.y) + target.height;
    doubled_center < overlay.height
}

/// Strictly left of the vertical midline.
fn in_left_half(target: Rect, overlay: Rect) -> bool {
    let doubled_center = 2 * (target.x - overlay.x) + target.width;
    doubled_center < overlay.width
}

fn bubble_bounds<F>(anchoring: Anchoring, overlay: Rect, measure: F) -> Rect
where
    F: FnOnce(i32) -> i32,
{
    let margins = anchoring.margins;
    let width = (overlay.width - margins.horizontal_sum()).max(0);
    let available_height = (overlay.height - margins.vertical_sum()).max(0);
    let height = measure(width).clamp(0, available_height);
    let y = if anchoring.edges.contains(AnchorEdges::BOTTOM) {
        overlay.height - margins.bottom - height
    } else {
        margins.top
    };
    Rect::new(margins.left, y, width, height)
}

/// Keep `raw` inside `[security, span - security]`. When the span is too
/// short for both bounds, the far bound wins.
fn clamp_to_span(raw: i32, span: i32, security: i32) -> i32 {
    let far = span - security;
    if raw > far {
        far
    } else if raw < security {
        security
    } else {
        raw
    }
}

fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}
