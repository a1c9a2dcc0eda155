//! Toon soften pass: a separable blur with selectable filter.
//!
//! Each output span pulls a padded block of input rows, blurs it
//! vertically, then horizontally, and writes the span. Input outside the
//! image is edge-clamped by the [`RowSource`](pixfx_core::RowSource).
//!
//! # Filters
//!
//! | Filter      | Weight at offset `i` (before normalization) |
//! |-------------|----------------------------------------------|
//! | `Box`       | coverage of pixel `i` by a box of width `size` |
//! | `Triangle`  | `1 - abs(i) / (size / 2 + 1)` |
//! | `Quadratic` | quadratic B-spline stretched over `size / 2 + 1` |
//! | `Gaussian`  | `exp(-i^2 / 2 sigma^2)`, `sigma = size / 4` |

use pixfx_core::{ChannelSet, Format, PixelSpan, Row};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_range, OpsError};
use crate::{AbortFlag, ChannelSpec, Effect, OpsResult, SpanBuffers, SpanOutcome};

/// Largest accepted blur size in pixels.
pub const MAX_SIZE: f32 = 1024.0;

/// Blur sizes below this are treated as no blur.
pub const MIN_SIZE: f32 = 1.0e-3;

/// Blur filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToonFilter {
    /// Flat box.
    Box,
    /// Linear falloff.
    Triangle,
    /// Quadratic B-spline.
    Quadratic,
    /// Gaussian with `sigma = size / 4`.
    #[default]
    Gaussian,
}

impl ToonFilter {
    /// Normalized kernel weights for a blur of `size` pixels.
    ///
    /// The kernel has `2 * radius + 1` taps centered on the middle one.
    /// A size below [`MIN_SIZE`] returns the single tap `[1.0]`.
    pub fn weights(self, size: f32) -> Vec<f32> {
        if size.is_nan() || size < MIN_SIZE {
            return vec![1.0];
        }
        let half = size / 2.0;
        let radius = match self {
            Self::Gaussian => (3.0 * size / 4.0).ceil(),
            _ => half.ceil(),
        } as i32;

        let mut weights: Vec<f32> = (-radius..=radius)
            .map(|i| self.weight(i as f32, half))
            .collect();
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        weights
    }

    fn weight(self, i: f32, half: f32) -> f32 {
        let d = i.abs();
        match self {
            Self::Box => ((d + 0.5).min(half) - (d - 0.5).max(-half)).clamp(0.0, 1.0),
            Self::Triangle => (1.0 - d / (half + 1.0)).max(0.0),
            Self::Quadratic => {
                let u = 1.5 * d / (half + 1.0);
                if u < 0.5 {
                    0.75 - u * u
                } else if u < 1.5 {
                    0.5 * (1.5 - u) * (1.5 - u)
                } else {
                    0.0
                }
            }
            Self::Gaussian => {
                let sigma = half / 2.0;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            }
        }
    }
}

/// Derived toon parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToonParams {
    /// Filter in use.
    pub filter: ToonFilter,
    /// Horizontal kernel.
    pub horizontal: Vec<f32>,
    /// Vertical kernel.
    pub vertical: Vec<f32>,
}

impl ToonParams {
    /// Builds both kernels for a `[width, height]` blur size.
    pub fn new(size: [f32; 2], filter: ToonFilter) -> Self {
        Self {
            filter,
            horizontal: filter.weights(size[0]),
            vertical: filter.weights(size[1]),
        }
    }

    /// Horizontal padding in pixels.
    #[inline]
    pub fn radius_x(&self) -> i32 {
        (self.horizontal.len() / 2) as i32
    }

    /// Vertical padding in pixels.
    #[inline]
    pub fn radius_y(&self) -> i32 {
        (self.vertical.len() / 2) as i32
    }

    /// Returns `true` when both kernels are a single tap.
    pub fn is_identity(&self) -> bool {
        self.horizontal.len() == 1 && self.vertical.len() == 1
    }
}

/// Toon settings as stored in presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToonSettings {
    /// Blur size `[width, height]` in pixels.
    #[serde(alias = "soften")]
    pub size: [f32; 2],
    /// Filter.
    pub filter: ToonFilter,
}

impl Default for ToonSettings {
    fn default() -> Self {
        Self {
            size: [10.0, 10.0],
            filter: ToonFilter::Gaussian,
        }
    }
}

/// The toon soften effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toon;

impl Effect for Toon {
    const NAME: &'static str = "toon";
    type Settings = ToonSettings;
    type Params = ToonParams;

    fn derive_params(settings: &ToonSettings, _format: Format) -> OpsResult<ToonParams> {
        let [w, h] = settings.size;
        if w < 0.0 || h < 0.0 {
            return Err(OpsError::invalid("size", format!("[{w}, {h}] must not be negative")));
        }
        let size = [
            ensure_range("size", w, 0.0, MAX_SIZE)?,
            ensure_range("size", h, 0.0, MAX_SIZE)?,
        ];
        Ok(ToonParams::new(size, settings.filter))
    }

    fn required_channels(_params: &ToonParams) -> ChannelSpec {
        ChannelSpec::PER_CHANNEL
    }

    fn process_span(
        params: &ToonParams,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome {
        let Some(source) = inputs.sources.first() else {
            return SpanOutcome::Completed;
        };
        if params.is_identity() {
            return SpanOutcome::Completed;
        }

        let rx = params.radius_x();
        let ry = params.radius_y();
        let padded = span.padded(rx);
        let rows: Vec<Row> = (span.y - ry..=span.y + ry)
            .map(|y| source.fetch_row(y, padded.x, padded.r, channels))
            .collect();

        let mut column = vec![0.0f32; padded.width()];
        for ch in channels.iter() {
            if abort.is_aborted() {
                return SpanOutcome::Aborted;
            }

            column.fill(0.0);
            for (row, &w) in rows.iter().zip(&params.vertical) {
                for (acc, &v) in column.iter_mut().zip(row.channel(ch)) {
                    *acc += w * v;
                }
            }

            let dst = out.writable_span(ch, span.x, span.r);
            for (k, d) in dst.iter_mut().enumerate() {
                *d = column[k..k + params.horizontal.len()]
                    .iter()
                    .zip(&params.horizontal)
                    .map(|(&v, &w)| v * w)
                    .sum();
            }
        }
        SpanOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn weights_are_normalized_and_symmetric() {
        for filter in [
            ToonFilter::Box,
            ToonFilter::Triangle,
            ToonFilter::Quadratic,
            ToonFilter::Gaussian,
        ] {
            for size in [0.5, 1.0, 3.0, 10.0, 25.0] {
                let w = filter.weights(size);
                assert_eq!(w.len() % 2, 1, "{filter:?} {size}");
                assert_abs_diff_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
                let n = w.len();
                for i in 0..n / 2 {
                    assert_abs_diff_eq!(w[i], w[n - 1 - i], epsilon = 1e-7);
                }
                let center = w[n / 2];
                assert!(w.iter().all(|&x| x <= center + 1e-7));
            }
        }
    }

    #[test]
    fn zero_size_is_single_tap() {
        assert_eq!(ToonFilter::Gaussian.weights(0.0), vec![1.0]);
        assert!(ToonParams::new([0.0, 0.0], ToonFilter::Box).is_identity());
        let params = ToonParams::new([4.0, 0.0], ToonFilter::Box);
        assert_eq!(params.radius_x(), 2);
        assert_eq!(params.radius_y(), 0);
    }

    #[test]
    fn subpixel_size_is_single_tap() {
        for filter in [
            ToonFilter::Box,
            ToonFilter::Triangle,
            ToonFilter::Quadratic,
            ToonFilter::Gaussian,
        ] {
            assert_eq!(filter.weights(1.0e-25), vec![1.0], "{filter:?}");
            assert_eq!(filter.weights(f32::MIN_POSITIVE), vec![1.0], "{filter:?}");
            let w = filter.weights(MIN_SIZE);
            assert!(w.iter().all(|x| x.is_finite()), "{filter:?}");
            assert_abs_diff_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }

        let settings = ToonSettings {
            size: [1.0e-25, 1.0e-25],
            ..Default::default()
        };
        let params = Toon::derive_params(&settings, Format::new(4, 4)).unwrap();
        assert!(params.is_identity());
    }

    #[test]
    fn box_weights() {
        // width 2: half pixels at each side
        let w = ToonFilter::Box.weights(2.0);
        assert_eq!(w.len(), 3);
        assert_abs_diff_eq!(w[0], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(w[1], 0.5, epsilon = 1e-6);

        // width 3: three full taps, outer taps empty
        let w = ToonFilter::Box.weights(3.0);
        assert_eq!(w.len(), 5);
        assert_eq!(w[0], 0.0);
        assert_abs_diff_eq!(w[2], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn derive_rejects_negative_size() {
        let settings = ToonSettings {
            size: [-1.0, 2.0],
            ..Default::default()
        };
        assert!(Toon::derive_params(&settings, Format::new(4, 4)).is_err());
        let params = Toon::derive_params(&ToonSettings::default(), Format::new(4, 4)).unwrap();
        assert_eq!(params.filter, ToonFilter::Gaussian);
        assert_eq!(params.horizontal.len(), 2 * 8 + 1);
    }
}
