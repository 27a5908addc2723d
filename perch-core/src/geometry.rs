//! Viewport geometry primitives.
//!
//! Rectangles are always in viewport (client) coordinates, the same space
//! `getBoundingClientRect` reports. They are derived per call from live
//! layout and never cached across frames.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from its edges.
    #[must_use]
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    #[must_use]
    pub const fn left(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub const fn top(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Same size, moved to `(x, y)`.
    #[must_use]
    pub const fn at(self, x: f64, y: f64) -> Self {
        Self::new(x, y, self.width, self.height)
    }

    /// Overlapping region of two rectangles, `None` if they do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > left && bottom > top).then(|| Rect::from_edges(left, top, right, bottom))
    }

    /// Check that the rectangle can be anchored to or positioned.
    ///
    /// `what` names the rectangle in the error ("trigger", "content").
    pub fn validate(&self, what: &'static str) -> Result<()> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if usable(self.width) && usable(self.height) && self.x.is_finite() && self.y.is_finite()
        {
            Ok(())
        } else {
            Err(Error::InvalidGeometry {
                what,
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// The visible viewport, sampled at computation time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    #[must_use]
    pub const fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    /// The viewport as a rectangle in client coordinates.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Edges of `rect` that cross the viewport boundary inset by `padding`.
    #[must_use]
    pub fn overflow(&self, rect: &Rect, padding: f64) -> Overflow {
        Overflow {
            top: rect.top() < padding,
            right: rect.right() > self.width - padding,
            bottom: rect.bottom() > self.height - padding,
            left: rect.left() < padding,
        }
    }

    /// Fraction of `rect` that is visible, in `[0, 1]`.
    #[must_use]
    pub fn visible_ratio(&self, rect: &Rect) -> f64 {
        let total = rect.area();
        if total <= 0.0 {
            return 0.0;
        }
        self.rect()
            .intersection(rect)
            .map_or(0.0, |visible| (visible.area() / total).clamp(0.0, 1.0))
    }

    /// Convert a client-space point to document coordinates.
    #[must_use]
    pub fn to_document(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.scroll_x, y + self.scroll_y)
    }
}

/// Which viewport edges a rectangle crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overflow {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Overflow {
    /// Number of overflowing edges.
    #[must_use]
    pub fn count(&self) -> usize {
        [self.top, self.right, self.bottom, self.left]
            .into_iter()
            .filter(|edge| *edge)
            .count()
    }

    #[must_use]
    pub fn any(&self) -> bool {
        self.count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_derived_from_origin_and_size() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.center_x(), 25.0);
        assert_eq!(rect.center_y(), 40.0);
        assert_eq!(Rect::from_edges(10.0, 20.0, 40.0, 60.0), rect);
    }

    #[test]
    fn validate_rejects_degenerate_sizes() {
        assert!(Rect::new(0.0, 0.0, 10.0, 10.0).validate("trigger").is_ok());
        for (w, h) in [(0.0, 10.0), (10.0, 0.0), (-1.0, 10.0), (f64::NAN, 10.0)] {
            let err = Rect::new(0.0, 0.0, w, h).validate("content");
            assert!(
                matches!(err, Err(Error::InvalidGeometry { what: "content", .. })),
                "{w}x{h} should be rejected"
            );
        }
    }

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn overflow_counts_each_crossed_edge() {
        let viewport = Viewport::new(100.0, 100.0);
        let inside = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(viewport.overflow(&inside, 8.0).count(), 0);

        let corner = Rect::new(-5.0, 90.0, 20.0, 20.0);
        let overflow = viewport.overflow(&corner, 0.0);
        assert!(overflow.left && overflow.bottom);
        assert!(!overflow.top && !overflow.right);
        assert_eq!(overflow.count(), 2);
    }

    #[test]
    fn padding_shrinks_the_usable_area() {
        let viewport = Viewport::new(100.0, 100.0);
        let rect = Rect::new(4.0, 50.0, 10.0, 10.0);
        assert!(!viewport.overflow(&rect, 0.0).any());
        assert!(viewport.overflow(&rect, 8.0).left);
    }

    #[test]
    fn visible_ratio_is_partial_for_clipped_rects() {
        let viewport = Viewport::new(100.0, 100.0);
        assert_eq!(viewport.visible_ratio(&Rect::new(0.0, 0.0, 50.0, 50.0)), 1.0);
        assert_eq!(viewport.visible_ratio(&Rect::new(-25.0, 0.0, 50.0, 50.0)), 0.5);
        assert_eq!(viewport.visible_ratio(&Rect::new(200.0, 0.0, 50.0, 50.0)), 0.0);
    }

    #[test]
    fn scroll_offsets_map_to_document_space() {
        let viewport = Viewport::new(800.0, 600.0).with_scroll(0.0, 250.0);
        assert_eq!(viewport.to_document(10.0, 10.0), (10.0, 260.0));
    }
}
