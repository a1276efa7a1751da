#![forbid(unsafe_code)]

//! Screen metrics snapshots.
//!
//! A [`ScreenMetrics`] value is captured once per display cycle and treated
//! as immutable while the placement is computed. Hosts implement
//! [`MetricsProvider`] to hand out fresh snapshots.

use crate::geometry::Size;

/// Immutable description of the screen for one display cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenMetrics {
    /// Screen width in pixels.
    pub width: i32,
    /// Screen height in pixels.
    pub height: i32,
    /// Height of the system status bar in pixels.
    pub status_bar_height: i32,
    /// Tablet-class layout: bubbles are clamped to a maximum width.
    pub wide_layout: bool,
    /// Pixels per density-independent pixel.
    pub density: f32,
}

impl ScreenMetrics {
    /// Phone-class metrics at 1x density with no status bar.
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            status_bar_height: 0,
            wide_layout: false,
            density: 1.0,
        }
    }

    /// Set the status bar height.
    #[must_use]
    pub const fn status_bar_height(mut self, height: i32) -> Self {
        self.status_bar_height = height;
        self
    }

    /// Mark the layout as tablet-class.
    #[must_use]
    pub const fn wide_layout(mut self, wide: bool) -> Self {
        self.wide_layout = wide;
        self
    }

    /// Set the display density.
    #[must_use]
    pub const fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Screen extents.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Convert density-independent pixels to pixels, rounding to nearest.
    #[inline]
    pub fn dp_to_px(&self, dp: i32) -> i32 {
        (dp as f32 * self.density).round() as i32
    }

    /// Whether the snapshot can be used for placement at all.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.density.is_finite() && self.density > 0.0
    }
}

/// Source of [`ScreenMetrics`] snapshots.
pub trait MetricsProvider {
    /// Capture the current screen metrics.
    fn snapshot(&self) -> ScreenMetrics;
}

impl MetricsProvider for ScreenMetrics {
    fn snapshot(&self) -> ScreenMetrics {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dp_to_px_rounds() {
        let metrics = ScreenMetrics::new(1080, 1920).density(2.625);
        assert_eq!(metrics.dp_to_px(20), 53);
        assert_eq!(metrics.dp_to_px(420), 1103);
        assert_eq!(metrics.dp_to_px(0), 0);
    }

    #[test]
    fn builder_sets_fields() {
        let metrics = ScreenMetrics::new(800, 1280)
            .status_bar_height(48)
            .wide_layout(true)
            .density(2.0);
        assert_eq!(metrics.status_bar_height, 48);
        assert!(metrics.wide_layout);
        assert_eq!(metrics.size(), Size::new(800, 1280));
        assert!(metrics.is_valid());
    }

    #[test]
    fn invalid_metrics_detected() {
        assert!(!ScreenMetrics::new(0, 100).is_valid());
        assert!(!ScreenMetrics::new(100, 100).density(0.0).is_valid());
        assert!(!ScreenMetrics::new(100, 100).density(f32::NAN).is_valid());
    }

    #[test]
    fn snapshot_is_copy() {
        let metrics = ScreenMetrics::new(10, 20);
        assert_eq!(metrics.snapshot(), metrics);
    }
}
