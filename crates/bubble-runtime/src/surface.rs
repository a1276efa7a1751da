#![forbid(unsafe_code)]

//! Rendering surface contract and the bubble content payload.
//!
//! The controllers decide *where* things go. A [`RenderSurface`] decides how
//! they look: it measures the bubble content, draws the rounded body and the
//! arrow glyph, and snapshots the highlighted target onto the dim overlay.

use bubble_core::geometry::{Rect, Sides};
use bubble_core::placement::PlacementResult;
use bubble_core::shape::BubbleShape;

use crate::config::ShowcaseTiming;
use crate::host::{ElementId, OverlayId};

/// A packed `0xAARRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Rgba(pub u32);

impl Rgba {
    /// Default bubble background.
    pub const BUBBLE_BLUE: Self = Self(0xFF3C_7DE6);
    /// Default text color.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Backdrop dim.
    pub const DIM: Self = Self(0x9900_0000);

    /// Build from components.
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Alpha component.
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

/// What the highlight snapshot of the target covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum HighlightMode {
    /// The element's whole layout box.
    #[default]
    ViewLayout,
    /// Only the element's drawn surface.
    ViewSurface,
}

/// Text and styling shown inside a bubble. Opaque to the controllers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BubbleContent {
    pub title: String,
    pub description: Option<String>,
    /// Label of the in-bubble button; `None` hides it.
    pub button_text: Option<String>,
    /// Show the close control in the corner.
    pub show_close: bool,
    /// Host-resolved image reference.
    pub image: Option<String>,
    pub background: Rgba,
    pub text_color: Rgba,
    /// Title text size in scaled pixels.
    pub title_size_sp: Option<f32>,
    /// Description text size in scaled pixels.
    pub description_size_sp: Option<f32>,
}

impl Default for BubbleContent {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            button_text: None,
            show_close: true,
            image: None,
            background: Rgba::BUBBLE_BLUE,
            text_color: Rgba::WHITE,
            title_size_sp: None,
            description_size_sp: None,
        }
    }
}

impl BubbleContent {
    /// Content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Show a button with the given label.
    #[must_use]
    pub fn button(mut self, text: impl Into<String>) -> Self {
        self.button_text = Some(text.into());
        self
    }

    /// Show or hide the close control.
    #[must_use]
    pub fn show_close(mut self, show: bool) -> Self {
        self.show_close = show;
        self
    }

    /// Set the image reference.
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the background color.
    #[must_use]
    pub fn background(mut self, color: Rgba) -> Self {
        self.background = color;
        self
    }

    /// Set the text color.
    #[must_use]
    pub fn text_color(mut self, color: Rgba) -> Self {
        self.text_color = color;
        self
    }

    /// Set the title text size.
    #[must_use]
    pub fn title_size_sp(mut self, size: f32) -> Self {
        self.title_size_sp = Some(size);
        self
    }

    /// Set the description text size.
    #[must_use]
    pub fn description_size_sp(mut self, size: f32) -> Self {
        self.description_size_sp = Some(size);
        self
    }
}

/// Request to snapshot the target onto the dim overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRequest {
    pub element: ElementId,
    /// Target bounds in overlay coordinates.
    pub bounds: Rect,
    pub mode: HighlightMode,
    /// Margins that place the snapshot inside the overlay: left and top are
    /// the target origin, right is what remains of the overlay width.
    pub margins: Sides,
}

impl HighlightRequest {
    /// Build a request for a target inside an overlay of `overlay_width`.
    pub fn new(element: ElementId, bounds: Rect, mode: HighlightMode, overlay_width: i32) -> Self {
        Self {
            element,
            bounds,
            mode,
            margins: Sides::new(bounds.y, (overlay_width - bounds.right()).max(0), 0, bounds.x),
        }
    }
}

/// Everything the surface needs to draw one step.
#[derive(Debug, Clone, Copy)]
pub struct BubbleFrame<'a> {
    pub step_id: &'a str,
    pub step_index: usize,
    pub placement: &'a PlacementResult,
    pub shape: BubbleShape,
    pub content: &'a BubbleContent,
    pub highlight: Option<HighlightRequest>,
    pub timing: &'a ShowcaseTiming,
    /// The dim overlay was attached for this step and should fade in.
    pub fade_in_background: bool,
}

/// Rendering collaborator.
pub trait RenderSurface {
    /// Height the content wants at the given bubble width.
    fn measure_bubble(&mut self, content: &BubbleContent, width: i32) -> i32;

    /// Draw a placed bubble, plus the target highlight if requested.
    fn present(&mut self, overlay: OverlayId, frame: BubbleFrame<'_>);

    /// Remove everything drawn for a step. No-op if nothing is drawn.
    fn clear(&mut self, overlay: OverlayId, step_id: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_components() {
        let color = Rgba::from_argb(0x99, 0x12, 0x34, 0x56);
        assert_eq!(color, Rgba(0x9912_3456));
        assert_eq!(color.alpha(), 0x99);
        assert_eq!(Rgba::DIM.alpha(), 0x99);
    }

    #[test]
    fn content_builder() {
        let content = BubbleContent::new("Title")
            .description("Body")
            .button("Next")
            .show_close(false)
            .title_size_sp(18.0);
        assert_eq!(content.title, "Title");
        assert_eq!(content.description.as_deref(), Some("Body"));
        assert_eq!(content.button_text.as_deref(), Some("Next"));
        assert!(!content.show_close);
        assert_eq!(content.title_size_sp, Some(18.0));
        assert_eq!(content.background, Rgba::BUBBLE_BLUE);
    }

    #[test]
    fn highlight_margins_position_snapshot() {
        let request = HighlightRequest::new(
            ElementId(1),
            Rect::new(100, 200, 50, 40),
            HighlightMode::ViewSurface,
            1080,
        );
        assert_eq!(request.margins, Sides::new(200, 930, 0, 100));
        assert_eq!(request.mode, HighlightMode::ViewSurface);
    }

    #[test]
    fn highlight_mode_defaults_to_layout() {
        assert_eq!(HighlightMode::default(), HighlightMode::ViewLayout);
    }
}
