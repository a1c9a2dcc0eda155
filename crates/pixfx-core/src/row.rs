//! Planar scanline buffers and the [`RowSource`] trait.
//!
//! A [`Row`] holds one plane of `f32` samples per channel, covering the
//! columns `[x, r)`. Planes are allocated on first write; reading a
//! channel that was never written yields black, so kernels can treat
//! every requested channel as present.
//!
//! [`RowSource`] is the seam between the kernels and whatever owns the
//! pixels. The driver asks a source for the rows it needs, with
//! coordinates outside the image clamped to the nearest edge.

use crate::channel::{Channel, ChannelLayout, ChannelSet};
use crate::span::PixelSpan;

/// Per-channel sample planes for the columns `[x, r)` of one scanline.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    x: i32,
    r: i32,
    planes: Vec<Option<Vec<f32>>>,
    black: Vec<f32>,
}

impl Row {
    /// Creates an empty row covering `[x, r)`.
    pub fn new(x: i32, r: i32) -> Self {
        let r = r.max(x);
        Self {
            x,
            r,
            planes: Vec::new(),
            black: vec![0.0; (r - x) as usize],
        }
    }

    /// Creates an empty row covering the columns of `span`.
    pub fn for_span(span: PixelSpan) -> Self {
        Self::new(span.x, span.r)
    }

    /// First column.
    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// End column (exclusive).
    #[inline]
    pub fn r(&self) -> i32 {
        self.r
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.black.len()
    }

    /// Returns `true` if `ch` has been written.
    pub fn has(&self, ch: Channel) -> bool {
        matches!(self.planes.get(ch.index()), Some(Some(_)))
    }

    /// Channels that have been written.
    pub fn channels(&self) -> ChannelSet {
        self.planes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_some())
            .filter_map(|(i, _)| Channel::new(i))
            .collect()
    }

    /// Samples of `ch`; black if the channel was never written.
    pub fn channel(&self, ch: Channel) -> &[f32] {
        match self.planes.get(ch.index()) {
            Some(Some(plane)) => plane,
            _ => &self.black,
        }
    }

    /// Samples of `ch` for columns `[x, r)`, which must lie inside the row.
    pub fn channel_span(&self, ch: Channel, x: i32, r: i32) -> &[f32] {
        let (a, b) = self.offsets(x, r);
        &self.channel(ch)[a..b]
    }

    /// Mutable samples of `ch`, allocated black on first access.
    pub fn writable(&mut self, ch: Channel) -> &mut [f32] {
        let idx = ch.index();
        if self.planes.len() <= idx {
            self.planes.resize(idx + 1, None);
        }
        let width = self.black.len();
        self.planes[idx].get_or_insert_with(|| vec![0.0; width])
    }

    /// Mutable samples of `ch` for columns `[x, r)` inside the row.
    pub fn writable_span(&mut self, ch: Channel, x: i32, r: i32) -> &mut [f32] {
        let (a, b) = self.offsets(x, r);
        &mut self.writable(ch)[a..b]
    }

    /// Copies channel `ch` from `src` over the columns both rows cover.
    pub fn copy_channel(&mut self, src: &Row, ch: Channel) {
        let x = self.x.max(src.x);
        let r = self.r.min(src.r);
        if x >= r {
            return;
        }
        let from = src.channel_span(ch, x, r);
        self.writable_span(ch, x, r).copy_from_slice(from);
    }

    /// Copies every channel of `channels` from `src`.
    pub fn copy_channels(&mut self, src: &Row, channels: ChannelSet) {
        for ch in channels.iter() {
            self.copy_channel(src, ch);
        }
    }

    /// Sets `ch` to black.
    pub fn erase(&mut self, ch: Channel) {
        self.writable(ch).fill(0.0);
    }

    fn offsets(&self, x: i32, r: i32) -> (usize, usize) {
        assert!(
            x >= self.x && r <= self.r && x <= r,
            "columns [{x}, {r}) outside row [{}, {})",
            self.x,
            self.r
        );
        ((x - self.x) as usize, (r - self.x) as usize)
    }
}

/// Anything that can hand out rows of pixels to a kernel.
///
/// Implementors must clamp out-of-range coordinates to the nearest edge
/// pixel so that padded requests always succeed.
pub trait RowSource: Send + Sync {
    /// Image width in pixels.
    fn width(&self) -> u32;

    /// Image height in pixels.
    fn height(&self) -> u32;

    /// Channel layout of the pixels.
    fn layout(&self) -> &ChannelLayout;

    /// Writes `channels` of scanline `y`, columns `[x, r)`, into `row`.
    ///
    /// `row` must cover `[x, r)`.
    fn fetch(&self, y: i32, x: i32, r: i32, channels: ChannelSet, row: &mut Row);

    /// Convenience wrapper that allocates the destination row.
    fn fetch_row(&self, y: i32, x: i32, r: i32, channels: ChannelSet) -> Row {
        let mut row = Row::new(x, r);
        self.fetch(y, x, r, channels, &mut row);
        row
    }
}
