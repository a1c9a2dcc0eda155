//! Integer scroll with wrap-around, for painting away tiling.
//!
//! The image is offset by a whole number of pixels and the part pushed
//! past one edge reappears at the opposite edge. No filtering is done.

use pixfx_core::{ChannelSet, Format, PixelSpan, Row};
use serde::{Deserialize, Serialize};

use crate::error::ensure_range;
use crate::{AbortFlag, ChannelSpec, Effect, OpsResult, SpanBuffers, SpanOutcome};

/// Rounds a scroll amount to whole pixels.
///
/// `floor(v + 0.5)` rounds halves the same way for negative values.
/// The result stays a float so that offsets beyond the `i64` range are
/// not saturated.
#[inline]
pub fn round_offset(v: f32) -> f64 {
    (f64::from(v) + 0.5).floor()
}

/// Reduces a rounded offset into `[0, extent)`.
///
/// `f64::rem_euclid` is exact, so huge offsets wrap to the same pixel
/// they would with unbounded integers.
#[inline]
pub fn wrap_offset(offset: f64, extent: u32) -> i64 {
    offset.rem_euclid(f64::from(extent.max(1))) as i64
}

/// Derived scroll parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollParams {
    /// Horizontal offset in pixels, in `[0, width)` when derived.
    pub dx: i64,
    /// Vertical offset in pixels, in `[0, height)` when derived.
    pub dy: i64,
    /// Wrap width.
    pub width: u32,
    /// Wrap height.
    pub height: u32,
}

impl ScrollParams {
    /// Source column for output column `x`.
    #[inline]
    pub fn source_x(&self, x: i32) -> i32 {
        let w = self.width as i64;
        (x as i64 - self.dx.rem_euclid(w)).rem_euclid(w) as i32
    }

    /// Source row for output row `y`.
    #[inline]
    pub fn source_y(&self, y: i32) -> i32 {
        let h = self.height as i64;
        (y as i64 - self.dy.rem_euclid(h)).rem_euclid(h) as i32
    }
}

/// Scroll settings as stored in presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Offset in pixels, rounded to the nearest integer.
    pub scroll: [f32; 2],
    /// Negates the offset.
    pub invert: bool,
}

/// The scroll effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scroll;

impl Effect for Scroll {
    const NAME: &'static str = "scroll";
    type Settings = ScrollSettings;
    type Params = ScrollParams;

    fn derive_params(settings: &ScrollSettings, format: Format) -> OpsResult<ScrollParams> {
        let [x, y] = settings.scroll;
        let sign = if settings.invert { -1.0 } else { 1.0 };
        let width = format.width.max(1);
        let height = format.height.max(1);
        let dx = sign * round_offset(ensure_range("scroll", x, f32::MIN, f32::MAX)?);
        let dy = sign * round_offset(ensure_range("scroll", y, f32::MIN, f32::MAX)?);
        Ok(ScrollParams {
            dx: wrap_offset(dx, width),
            dy: wrap_offset(dy, height),
            width,
            height,
        })
    }

    fn required_channels(_params: &ScrollParams) -> ChannelSpec {
        ChannelSpec::PER_CHANNEL
    }

    fn process_span(
        params: &ScrollParams,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome {
        let Some(source) = inputs.sources.first() else {
            return SpanOutcome::Completed;
        };
        let src = source.fetch_row(params.source_y(span.y), 0, params.width as i32, channels);

        for ch in channels.iter() {
            if abort.is_aborted() {
                return SpanOutcome::Aborted;
            }
            let line = src.channel(ch);
            let dst = out.writable_span(ch, span.x, span.r);
            for (d, x) in dst.iter_mut().zip(span.columns()) {
                *d = line[params.source_x(x) as usize];
            }
        }
        SpanOutcome::Completed
    }
}
