//! Horizontal pixel spans, the unit of work of the row driver.
//!
//! A [`PixelSpan`] covers columns `[x, r)` of scanline `y`. Coordinates
//! are signed so that padded requests (blur margins, scroll offsets)
//! can reach outside the image before being edge-clamped.
//!
//! ```rust
//! use pixfx_core::PixelSpan;
//!
//! let span = PixelSpan::new(4, 10, 20);
//! assert_eq!(span.width(), 10);
//! assert_eq!(span.padded(2).x, 8);
//!
//! let halves: Vec<_> = span.chunks(5).collect();
//! assert_eq!(halves.len(), 2);
//! ```

use std::ops::Range;

/// Columns `[x, r)` on scanline `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelSpan {
    /// Scanline
    pub y: i32,
    /// First column (inclusive)
    pub x: i32,
    /// End column (exclusive)
    pub r: i32,
}

impl PixelSpan {
    /// Creates a span. A reversed range is normalized to an empty span at `x`.
    #[inline]
    pub const fn new(y: i32, x: i32, r: i32) -> Self {
        let r = if r < x { x } else { r };
        Self { y, x, r }
    }

    /// Full-width span of scanline `y`.
    #[inline]
    pub const fn full_row(y: i32, width: u32) -> Self {
        Self::new(y, 0, width as i32)
    }

    /// Number of pixels in the span.
    #[inline]
    pub const fn width(&self) -> usize {
        (self.r - self.x) as usize
    }

    /// Returns `true` if the span has no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.r <= self.x
    }

    /// Column range of the span.
    #[inline]
    pub fn columns(&self) -> Range<i32> {
        self.x..self.r
    }

    /// Returns `true` if column `col` lies inside the span.
    #[inline]
    pub const fn contains(&self, col: i32) -> bool {
        col >= self.x && col < self.r
    }

    /// Span widened by `pad` columns on both sides.
    #[inline]
    pub const fn padded(&self, pad: i32) -> Self {
        Self::new(self.y, self.x - pad, self.r + pad)
    }

    /// Same columns on another scanline.
    #[inline]
    pub const fn on_row(&self, y: i32) -> Self {
        Self { y, ..*self }
    }

    /// Overlap with columns `[x, r)`, if any.
    pub fn intersect(&self, x: i32, r: i32) -> Option<Self> {
        let nx = self.x.max(x);
        let nr = self.r.min(r);
        (nx < nr).then(|| Self::new(self.y, nx, nr))
    }

    /// Splits the span into consecutive pieces of at most `size` pixels.
    ///
    /// A `size` of zero yields the whole span as one piece.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = Self> + use<> {
        let step = if size == 0 { self.width().max(1) } else { size } as i32;
        let Self { y, x, r } = *self;
        (x..r).step_by(step as usize).map(move |cx| Self::new(y, cx, (cx + step).min(r)))
    }
}
