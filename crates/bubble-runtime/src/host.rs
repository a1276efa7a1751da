#![forbid(unsafe_code)]

//! The host UI tree as seen by the showcase controllers.
//!
//! The controllers never hold references into the host's widget tree. They
//! name elements by [`ElementId`] and the shared dim container by
//! [`OverlayId`], and ask the host through [`HostTree`] whenever they need
//! geometry or want something attached.

use bubble_core::geometry::{Point, Size};

use crate::deferred::TaskId;

/// Opaque handle to an element in the host UI tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ElementId(pub u64);

/// Handle to an attached dim overlay container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Operations the host UI tree provides.
///
/// All calls happen on the UI thread. Detaching an overlay that is already
/// gone and unsubscribing a callback that already fired must both be
/// harmless.
pub trait HostTree {
    /// On-screen origin of an element, or `None` if it is not in the tree.
    fn on_screen_origin(&self, element: ElementId) -> Option<Point>;

    /// Current laid-out size of an element. Zero until layout completes.
    fn size(&self, element: ElementId) -> Size;

    /// Fire `task` once after the element's next layout pass, then forget
    /// it. The host reports the firing through
    /// [`Sequence::on_layout`](crate::sequence::Sequence::on_layout).
    fn subscribe_on_next_layout(&mut self, element: ElementId, task: TaskId);

    /// Drop a pending layout subscription. No-op if it already fired.
    fn unsubscribe_layout(&mut self, element: ElementId, task: TaskId);

    /// Attach a full-screen dim container and return its handle.
    fn attach_overlay(&mut self) -> OverlayId;

    /// Detach a previously attached container. No-op if already detached.
    fn detach_overlay(&mut self, overlay: OverlayId);

    /// On-screen origin of an attached container.
    fn overlay_origin(&self, overlay: OverlayId) -> Point;
}
