// fatou-core/src/geometry.rs

use crate::PixelRect;
use serde::{Deserialize, Serialize};

/// Integer pixel dimensions of a render target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Pixel count. Widened so supersampled 8K targets cannot overflow.
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Both dimensions multiplied by `factor` (the supersampled size).
    pub fn scaled(&self, factor: u32) -> Self {
        Self::new(self.w.saturating_mul(factor), self.h.saturating_mul(factor))
    }

    /// Height over width, used to derive the vertical zoom factor.
    pub fn aspect(&self) -> f64 {
        if self.w == 0 {
            1.0
        } else {
            self.h as f64 / self.w as f64
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Normalized sub-window `{l, t, r, b}` of a target in `[0, 1]` space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
}

impl Rect {
    /// The whole target.
    pub const FULL: Rect = Rect {
        l: 0.0,
        t: 0.0,
        r: 1.0,
        b: 1.0,
    };

    pub const fn new(l: f64, t: f64, r: f64, b: f64) -> Self {
        Self { l, t, r, b }
    }

    /// Full-width horizontal band between `t` and `b`.
    pub fn rows(t: f64, b: f64) -> Self {
        Self::new(0.0, t, 1.0, b)
    }

    pub fn width(&self) -> f64 {
        self.r - self.l
    }

    pub fn height(&self) -> f64 {
        self.b - self.t
    }

    /// Same window shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.l + dx, self.t + dy, self.r + dx, self.b + dy)
    }

    /// Pixel bounds of this window inside a target of `size`.
    ///
    /// Edges are rounded to the nearest pixel boundary and clamped to the
    /// target, so bands computed from whole row counts map back exactly.
    pub fn to_pixels(&self, size: Size) -> PixelRect {
        let edge = |v: f64, extent: u32| -> u32 {
            let px = (v * extent as f64).round();
            px.clamp(0.0, extent as f64) as u32
        };
        let x0 = edge(self.l, size.w);
        let y0 = edge(self.t, size.h);
        let x1 = edge(self.r, size.w).max(x0);
        let y1 = edge(self.b, size.h).max(y0);
        PixelRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_area_does_not_overflow() {
        let size = Size::new(7680 * 4, 4320 * 4);
        assert_eq!(size.area(), 7680 * 4 * 4320 * 4);
    }

    #[test]
    fn size_scaled_and_empty() {
        assert_eq!(Size::new(800, 600).scaled(2), Size::new(1600, 1200));
        assert!(Size::new(0, 10).is_empty());
        assert!(Size::new(10, 0).is_empty());
        assert!(!Size::new(1, 1).is_empty());
    }

    #[test]
    fn size_aspect() {
        assert!((Size::new(200, 100).aspect() - 0.5).abs() < 1e-12);
        assert_eq!(Size::new(0, 100).aspect(), 1.0);
    }

    #[test]
    fn rect_full_maps_to_whole_target() {
        let px = Rect::FULL.to_pixels(Size::new(640, 480));
        assert_eq!(px, PixelRect::new(0, 0, 640, 480));
    }

    #[test]
    fn rect_rows_maps_to_exact_band() {
        let h = 300;
        let rect = Rect::rows(17.0 / h as f64, 41.0 / h as f64);
        let px = rect.to_pixels(Size::new(100, h));
        assert_eq!(px, PixelRect::new(0, 17, 100, 24));
    }

    #[test]
    fn rect_clamps_outside_target() {
        let px = Rect::new(-0.5, 0.5, 1.5, 2.0).to_pixels(Size::new(10, 10));
        assert_eq!(px, PixelRect::new(0, 5, 10, 5));
    }

    #[test]
    fn rect_offset() {
        let r = Rect::FULL.offset(0.25, 0.0);
        assert_eq!(r, Rect::new(0.25, 0.0, 1.25, 1.0));
        assert!((r.width() - 1.0).abs() < 1e-12);
        assert!((r.height() - 1.0).abs() < 1e-12);
    }
}
