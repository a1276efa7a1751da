#![forbid(unsafe_code)]

//! Drawing geometry for a placed bubble.
//!
//! Everything here is local to the bubble: `(0, 0)` is the bubble's top-left
//! corner as reported in [`PlacementResult::bubble`](crate::placement::PlacementResult::bubble).

use crate::geometry::{Point, Rect};

/// Rounded body plus optional arrow glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleShape {
    /// Body rectangle, inset from the bubble bounds so the arrow fits.
    pub body: Rect,
    /// Corner radius of the body in pixels.
    pub corner_radius: i32,
    /// Arrow glyph, absent for the centered layout.
    pub arrow: Option<Rhombus>,
}

/// A square rotated 45 degrees, centered on the arrow tip.
///
/// Half of it overlaps the body; the other half pokes out towards the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rhombus {
    /// Center of the glyph.
    pub tip: Point,
    /// Distance from the center to each vertex.
    pub half_width: i32,
}

impl Rhombus {
    /// A rhombus of the given full width centered on `tip`.
    pub const fn at(tip: Point, width: i32) -> Self {
        Self {
            tip,
            half_width: width / 2,
        }
    }

    /// Vertices in drawing order: below, left, above, right of the tip.
    pub const fn vertices(&self) -> [Point; 4] {
        let Point { x, y } = self.tip;
        let h = self.half_width;
        [
            Point::new(x, y + h),
            Point::new(x - h, y),
            Point::new(x, y - h),
            Point::new(x + h, y),
        ]
    }

    /// Axis-aligned bounds of the glyph.
    pub const fn bounds(&self) -> Rect {
        let h = self.half_width;
        Rect::new(self.tip.x - h, self.tip.y - h, 2 * h, 2 * h)
    }
}
