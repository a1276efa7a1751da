#![forbid(unsafe_code)]

//! Arrow sides, caller hints, and anchoring edges.

use bitflags::bitflags;

/// The edge of the bubble that carries the arrow.
///
/// `Top` means the arrow sits on the bubble's top edge and points up at a
/// target above it, so the bubble itself is placed below the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrowSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl ArrowSide {
    /// All sides in declaration order.
    pub const ALL: [ArrowSide; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// The opposite side.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether the arrow sits on a horizontal edge (top or bottom).
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    /// Stable lowercase label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Caller-supplied arrow sides for one step.
///
/// An ordered set: duplicates are dropped on insertion, first occurrence
/// wins. Empty means "pick a default from the target position"; more than
/// one entry means "no single side, center the bubble".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrowHint {
    sides: Vec<ArrowSide>,
}

impl ArrowHint {
    /// An empty hint.
    pub const fn none() -> Self {
        Self { sides: Vec::new() }
    }

    /// A single-side hint.
    pub fn single(side: ArrowSide) -> Self {
        Self { sides: vec![side] }
    }

    /// Add a side, keeping insertion order and ignoring duplicates.
    #[must_use]
    pub fn with(mut self, side: ArrowSide) -> Self {
        self.push(side);
        self
    }

    /// Add a side in place.
    pub fn push(&mut self, side: ArrowSide) {
        if !self.sides.contains(&side) {
            self.sides.push(side);
        }
    }

    /// Number of distinct sides.
    pub fn len(&self) -> usize {
        self.sides.len()
    }

    /// Whether no side was given.
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    /// The side, if exactly one was given.
    pub fn as_single(&self) -> Option<ArrowSide> {
        match self.sides.as_slice() {
            [side] => Some(*side),
            _ => None,
        }
    }

    /// Iterate the sides in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = ArrowSide> + '_ {
        self.sides.iter().copied()
    }
}

impl From<ArrowSide> for ArrowHint {
    fn from(side: ArrowSide) -> Self {
        Self::single(side)
    }
}

impl FromIterator<ArrowSide> for ArrowHint {
    fn from_iter<I: IntoIterator<Item = ArrowSide>>(iter: I) -> Self {
        let mut hint = Self::none();
        for side in iter {
            hint.push(side);
        }
        hint
    }
}

bitflags! {
    /// Overlay edges a bubble is anchored to.
    ///
    /// Margins in a placement are measured from these edges, so a result can
    /// be fed directly into a toolkit's relative-layout constraints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnchorEdges: u8 {
        const TOP = 0b0001;
        const BOTTOM = 0b0010;
        const LEFT = 0b0100;
        const RIGHT = 0b1000;
    }
}

impl From<ArrowSide> for AnchorEdges {
    fn from(side: ArrowSide) -> Self {
        match side {
            ArrowSide::Top => Self::TOP,
            ArrowSide::Bottom => Self::BOTTOM,
            ArrowSide::Left => Self::LEFT,
            ArrowSide::Right => Self::RIGHT,
        }
    }
}
