//! Planar full-frame images.
//!
//! [`Frame`] is the in-memory stand-in for a host image: one `f32` plane
//! per channel of its [`ChannelLayout`]. It implements [`RowSource`] so
//! kernels can read from it, and [`Frame::write_row`] collects their
//! output.
//!
//! # Example
//!
//! ```rust
//! use pixfx_core::{Channel, ChannelLayout, ChannelSet, Frame, RowSource};
//!
//! let mut frame = Frame::new(4, 2, ChannelLayout::rgba()).unwrap();
//! frame.set(3, 1, Channel::RED, 0.5);
//!
//! // Requests past the right edge repeat the last column.
//! let row = frame.fetch_row(1, 2, 6, ChannelSet::RGB);
//! assert_eq!(row.channel(Channel::RED), &[0.0, 0.5, 0.5, 0.5]);
//! ```

use crate::channel::{Channel, ChannelLayout, ChannelSet};
use crate::error::{Error, Result};
use crate::row::{Row, RowSource};

/// Width and height of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Format {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Format {
    /// Creates a format.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel center of the format, `(width / 2, height / 2)`.
    #[inline]
    pub fn center(&self) -> [f32; 2] {
        [self.width as f32 / 2.0, self.height as f32 / 2.0]
    }

    /// Number of pixels.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A planar image: one plane of `width * height` samples per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    format: Format,
    layout: ChannelLayout,
    planes: Vec<Vec<f32>>,
}

impl Frame {
    /// Creates a black frame.
    pub fn new(width: u32, height: u32, layout: ChannelLayout) -> Result<Self> {
        Self::filled(width, height, layout, &[0.0])
    }

    /// Creates a frame with channel `i` set to `values[i]`.
    ///
    /// The last value repeats for channels past the end of `values`.
    pub fn filled(width: u32, height: u32, layout: ChannelLayout, values: &[f32]) -> Result<Self> {
        let format = Self::check_format(width, height)?;
        let planes = (0..layout.len())
            .map(|c| {
                let v = values
                    .get(c)
                    .or_else(|| values.last())
                    .copied()
                    .unwrap_or(0.0);
                vec![v; format.area()]
            })
            .collect();
        Ok(Self {
            format,
            layout,
            planes,
        })
    }

    /// Creates a frame from existing planes, one per layout channel.
    pub fn from_planes(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        planes: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let format = Self::check_format(width, height)?;
        if planes.len() != layout.len() {
            return Err(Error::channel_mismatch(layout.len(), planes.len()));
        }
        if let Some(bad) = planes.iter().find(|p| p.len() != format.area()) {
            return Err(Error::buffer_size(format.area(), bad.len()));
        }
        Ok(Self {
            format,
            layout,
            planes,
        })
    }

    /// Creates a frame from interleaved samples (`RGBARGBA...`).
    pub fn from_interleaved(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        data: &[f32],
    ) -> Result<Self> {
        let format = Self::check_format(width, height)?;
        let nch = layout.len();
        let expected = format
            .area()
            .checked_mul(nch)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "sample count overflows"))?;
        if data.len() != expected {
            return Err(Error::buffer_size(expected, data.len()));
        }
        let planes = (0..nch)
            .map(|c| data.iter().skip(c).step_by(nch.max(1)).copied().collect())
            .collect();
        Self::from_planes(width, height, layout, planes)
    }

    fn check_format(width: u32, height: u32) -> Result<Format> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "width and height must be > 0"));
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(Error::invalid_dimensions(width, height, "exceeds i32 coordinate range"));
        }
        Ok(Format::new(width, height))
    }

    /// Width and height.
    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Channel layout.
    #[inline]
    pub fn channel_layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Samples of `ch`, row-major.
    pub fn plane(&self, ch: Channel) -> Result<&[f32]> {
        self.layout.check(ch)?;
        Ok(&self.planes[ch.index()])
    }

    /// Mutable samples of `ch`, row-major.
    pub fn plane_mut(&mut self, ch: Channel) -> Result<&mut [f32]> {
        self.layout.check(ch)?;
        Ok(&mut self.planes[ch.index()])
    }

    /// Sample at `(x, y)`. Panics if out of range.
    #[inline]
    pub fn get(&self, x: u32, y: u32, ch: Channel) -> f32 {
        self.planes[ch.index()][self.offset(x, y)]
    }

    /// Sets the sample at `(x, y)`. Panics if out of range.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, ch: Channel, value: f32) {
        let idx = self.offset(x, y);
        self.planes[ch.index()][idx] = value;
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(x < self.format.width && y < self.format.height, "pixel ({x}, {y}) out of bounds");
        y as usize * self.format.width as usize + x as usize
    }

    /// Stores `channels` of `row` into scanline `y`.
    ///
    /// Columns of the row outside the frame, and rows outside the frame,
    /// are ignored.
    pub fn write_row(&mut self, y: i32, row: &Row, channels: ChannelSet) {
        if y < 0 || y >= self.format.height as i32 {
            return;
        }
        let x = row.x().max(0);
        let r = row.r().min(self.format.width as i32);
        if x >= r {
            return;
        }
        let base = y as usize * self.format.width as usize;
        for ch in (channels & self.layout.all()).iter() {
            let src = row.channel_span(ch, x, r);
            self.planes[ch.index()][base + x as usize..base + r as usize].copy_from_slice(src);
        }
    }

    /// Samples in interleaved order (`RGBARGBA...`).
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.format.area() * self.planes.len());
        for i in 0..self.format.area() {
            out.extend(self.planes.iter().map(|p| p[i]));
        }
        out
    }
}

impl RowSource for Frame {
    fn width(&self) -> u32 {
        self.format.width
    }

    fn height(&self) -> u32 {
        self.format.height
    }

    fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    fn fetch(&self, y: i32, x: i32, r: i32, channels: ChannelSet, row: &mut Row) {
        let width = self.format.width as usize;
        let max_x = self.format.width as i32 - 1;
        let sy = y.clamp(0, self.format.height as i32 - 1) as usize;

        for ch in (channels & self.layout.all()).iter() {
            let line = &self.planes[ch.index()][sy * width..(sy + 1) * width];
            let dst = row.writable_span(ch, x, r);
            for (d, col) in dst.iter_mut().zip(x..r) {
                *d = line[col.clamp(0, max_x) as usize];
            }
        }
    }
}
