use std::ops::{Add, Sub};

/// Integer 2D coordinate. `y` is the slow (row) axis, `x` the fast (column) axis.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Point2 {
    pub x: i64,
    pub y: i64,
}

impl Point2 {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn is_non_negative(self) -> bool {
        self.x >= 0 && self.y >= 0
    }
}

impl Add for Point2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Integer 2D size.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Extent2 {
    pub width: i64,
    pub height: i64,
}

impl Extent2 {
    pub const fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn area(self) -> i64 {
        self.width.max(0) * self.height.max(0)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn is_non_negative(self) -> bool {
        self.width >= 0 && self.height >= 0
    }
}

/// Axis-aligned integer rectangle, `start` inclusive and `end` exclusive.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IRect {
    pub start: Point2,
    pub end: Point2,
}

impl IRect {
    pub const fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    pub fn from_anchor(anchor: Point2, extent: Extent2) -> Self {
        Self {
            start: anchor,
            end: Point2::new(anchor.x + extent.width, anchor.y + extent.height),
        }
    }

    /// Like [`IRect::from_anchor`], but `None` when the far corner overflows `i64`.
    pub fn checked_from_anchor(anchor: Point2, extent: Extent2) -> Option<Self> {
        Some(Self {
            start: anchor,
            end: Point2::new(
                anchor.x.checked_add(extent.width)?,
                anchor.y.checked_add(extent.height)?,
            ),
        })
    }

    pub fn from_extent(extent: Extent2) -> Self {
        Self::from_anchor(Point2::ZERO, extent)
    }

    pub fn width(self) -> i64 {
        (self.end.x - self.start.x).max(0)
    }

    pub fn height(self) -> i64 {
        (self.end.y - self.start.y).max(0)
    }

    pub fn extent(self) -> Extent2 {
        Extent2::new(self.width(), self.height())
    }

    pub fn area(self) -> i64 {
        self.width() * self.height()
    }

    pub fn is_empty(self) -> bool {
        self.end.x <= self.start.x || self.end.y <= self.start.y
    }

    pub fn contains(self, p: Point2) -> bool {
        self.start.x <= p.x && p.x < self.end.x && self.start.y <= p.y && p.y < self.end.y
    }

    pub fn contains_rect(self, other: Self) -> bool {
        other.is_empty()
            || (self.start.x <= other.start.x
                && self.start.y <= other.start.y
                && other.end.x <= self.end.x
                && other.end.y <= self.end.y)
    }

    /// Empty rectangles never intersect anything.
    pub fn intersects(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start.x < other.end.x
            && other.start.x < self.end.x
            && self.start.y < other.end.y
            && other.start.y < self.end.y
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
