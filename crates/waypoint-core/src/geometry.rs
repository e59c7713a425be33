#![forbid(unsafe_code)]

//! Cell-space geometry for targets, viewports and overlay openings.

/// An axis-aligned rectangle in cell coordinates (origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersection with another rectangle, `None` when they don't overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Grow the rectangle outward by `margin`, saturating at the origin.
    ///
    /// Growth that would cross the origin is dropped rather than shifted, so
    /// a target in the top-left corner keeps its far edges where they were.
    pub fn outer(&self, margin: Sides) -> Rect {
        let x = self.x.saturating_sub(margin.left);
        let y = self.y.saturating_sub(margin.top);
        let right = self.right().saturating_add(margin.right);
        let bottom = self.bottom().saturating_add(margin.bottom);
        Rect::new(x, y, right - x, bottom - y)
    }

    /// A `width` x `height` rectangle centered inside `self`, clamped to fit.
    pub fn centered(&self, width: u16, height: u16) -> Rect {
        let width = width.min(self.width);
        let height = height.min(self.height);
        Rect::new(
            self.x + (self.width - width) / 2,
            self.y + (self.height - height) / 2,
            width,
            height,
        )
    }
}

/// Per-edge insets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sides {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Sides {
    /// Equal inset on every edge.
    pub const fn all(val: u16) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }
}

impl From<u16> for Sides {
    fn from(val: u16) -> Self {
        Self::all(val)
    }
}

#[cfg(test)]
mod tests {
    use super::{Rect, Sides};

    #[test]
    fn contains_edges() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 3));
        assert!(!rect.contains(2, 8));
    }

    #[test]
    fn intersection_overlap_and_disjoint() {
        let a = Rect::new(0, 0, 4, 4);
        assert_eq!(
            a.intersection(&Rect::new(2, 2, 4, 4)),
            Some(Rect::new(2, 2, 2, 2))
        );
        assert_eq!(a.intersection(&Rect::new(5, 5, 2, 2)), None);
    }

    #[test]
    fn outer_grows_uniformly() {
        let rect = Rect::new(10, 5, 20, 3);
        assert_eq!(rect.outer(Sides::all(2)), Rect::new(8, 3, 24, 7));
    }

    #[test]
    fn outer_saturates_at_origin() {
        let rect = Rect::new(1, 0, 4, 2);
        assert_eq!(rect.outer(Sides::all(3)), Rect::new(0, 0, 8, 5));
    }

    #[test]
    fn centered_fits_inside() {
        let screen = Rect::from_size(80, 24);
        assert_eq!(screen.centered(20, 4), Rect::new(30, 10, 20, 4));
        assert_eq!(screen.centered(100, 100), screen);
    }
}
