//! Placement geometry for the movable control
//!
//! Screen space, pixels, origin at the top-left of the container.
//! All inputs are snapshots taken at call time; nothing here holds state.

use glam::{IVec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Componentwise maximum (used to floor measured sizes)
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box with its top-left corner at `origin`
    pub fn from_origin_size(origin: Vec2, size: Size) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x + size.width,
            origin.y + size.height,
        )
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.left + self.width() / 2.0,
            self.top + self.height() / 2.0,
        )
    }

    /// Grow the box by `amount` on every side
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect::new(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }

    /// Strict overlap test: boxes that only touch along an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }
}

/// Minimum clearance from container edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    /// Applied to both the left and the right edge
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            x: 40.0,
            top: 80.0,
            bottom: 40.0,
        }
    }
}

/// Closed range of valid top-left positions for a control of a given size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidRange {
    pub min: Vec2,
    pub max: Vec2,
}

impl ValidRange {
    pub fn new(container: Size, movable: Size, margins: Margins) -> Self {
        Self {
            min: Vec2::new(margins.x, margins.top),
            max: Vec2::new(
                container.width - movable.width - margins.x,
                container.height - movable.height - margins.bottom,
            ),
        }
    }

    /// True when the container is too small to hold the control plus margins
    pub fn is_degenerate(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// At least one whole-pixel position fits on both axes
    pub fn holds_integer_point(&self) -> bool {
        let (min, max) = (self.min.ceil(), self.max.floor());
        min.x <= max.x && min.y <= max.y
    }

    /// Clamp a point into the range. On a degenerate axis the minimum wins.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.min(self.max.x).max(self.min.x),
            p.y.min(self.max.y).max(self.min.y),
        )
    }
}

/// Everything the solver needs for one placement
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest {
    pub container: Size,
    pub movable: Size,
    /// Box the movable control must keep away from
    pub obstacle: Rect,
    pub margins: Margins,
    /// Minimum clearance from the obstacle
    pub safe_zone: f32,
    /// Draw budget before falling back to the last candidate
    pub max_attempts: u32,
}

/// Result of a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Integer pixel position of the control's top-left corner
    At(IVec2),
    /// Container too small; leave the control where it is
    NoRoom,
}

impl Placement {
    pub fn position(self) -> Option<IVec2> {
        match self {
            Placement::At(p) => Some(p),
            Placement::NoRoom => None,
        }
    }
}

/// Pick a random in-bounds position that keeps clear of the obstacle.
///
/// Up to `max_attempts` uniform draws; the first draw whose box, inflated by
/// the safe zone, misses the obstacle wins. If none does, the last draw is used.
/// The result is always clamped into the valid range and rounded.
pub fn solve<R: Rng>(req: &PlacementRequest, rng: &mut R) -> Placement {
    let range = ValidRange::new(req.container, req.movable, req.margins);
    if range.is_degenerate() || !range.holds_integer_point() {
        return Placement::NoRoom;
    }

    let attempts = req.max_attempts.max(1);
    let mut candidate = range.min;
    for _ in 0..attempts {
        candidate = Vec2::new(
            rng.random_range(range.min.x..=range.max.x),
            rng.random_range(range.min.y..=range.max.y),
        );
        if !crowds(candidate, req.movable, &req.obstacle, req.safe_zone) {
            break;
        }
    }

    let clamped = range.clamp(candidate);
    // Rounding can push past a fractional bound; clamp again in integer space
    let rounded = clamped.round();
    Placement::At(rounded.min(range.max.floor()).max(range.min.ceil()).as_ivec2())
}

/// Would a control of `size` at `origin` sit within `safe_zone` of `obstacle`?
pub fn crowds(origin: Vec2, size: Size, obstacle: &Rect, safe_zone: f32) -> bool {
    Rect::from_origin_size(origin, size)
        .inflate(safe_zone)
        .intersects(obstacle)
}
