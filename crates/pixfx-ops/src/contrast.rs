//! Pivot contrast.
//!
//! A power curve anchored at a pivot value, matching the contrast of a
//! grade node: values at the pivot are unchanged, values above are pushed
//! up and values below are pulled down when the exponent exceeds 1.
//!
//! # Formula
//!
//! ```text
//! out = (value / pivot) ^ exponent * pivot
//! ```
//!
//! A negative `value` with a non-integer exponent yields NaN. That is the
//! IEEE-754 result of `powf` and is passed through, not masked.

use pixfx_core::{ChannelSet, Format, PixelSpan, Row};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, OpsError};
use crate::{AbortFlag, ChannelSpec, Effect, OpsResult, SpanBuffers, SpanOutcome};

/// Default pivot: 18% gray.
pub const DEFAULT_PIVOT: f32 = 0.18;

/// Applies the pivot contrast curve to one value.
#[inline]
pub fn apply(value: f32, exponent: f32, pivot: f32) -> f32 {
    (value / pivot).powf(exponent) * pivot
}

/// Derived contrast parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastParams {
    /// Exponent per color index (red, green, blue, alpha).
    pub exponents: [f32; 4],
    /// Pivot in `(0, 1]`.
    pub pivot: f32,
}

impl ContrastParams {
    /// Exponent for the channel at `color_index`, if it is adjusted.
    #[inline]
    pub fn exponent(&self, color_index: usize) -> Option<f32> {
        self.exponents.get(color_index).copied()
    }

    /// Returns `true` when every exponent is 1.
    pub fn is_identity(&self) -> bool {
        self.exponents.iter().all(|&e| e == 1.0)
    }
}

/// Contrast settings as stored in presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastSettings {
    /// Exponents for red, green, blue and alpha.
    #[serde(alias = "value")]
    pub exponents: [f32; 4],
    /// Pivot in `(0, 1]`.
    pub pivot: f32,
}

impl Default for ContrastSettings {
    fn default() -> Self {
        Self {
            exponents: [1.0; 4],
            pivot: DEFAULT_PIVOT,
        }
    }
}

/// The contrast effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Contrast;

impl Effect for Contrast {
    const NAME: &'static str = "contrast";
    type Settings = ContrastSettings;
    type Params = ContrastParams;

    fn derive_params(settings: &ContrastSettings, _format: Format) -> OpsResult<ContrastParams> {
        let pivot = ensure_positive("pivot", settings.pivot)?;
        if pivot > 1.0 {
            return Err(OpsError::invalid("pivot", format!("{pivot} must be <= 1")));
        }
        if settings.exponents.iter().any(|e| !e.is_finite()) {
            return Err(OpsError::invalid("exponents", "must be finite"));
        }
        Ok(ContrastParams {
            exponents: settings.exponents,
            pivot,
        })
    }

    fn required_channels(_params: &ContrastParams) -> ChannelSpec {
        ChannelSpec::PER_CHANNEL
    }

    fn process_span(
        params: &ContrastParams,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome {
        let Some(src) = inputs.row(0) else {
            return SpanOutcome::Completed;
        };
        if params.is_identity() {
            return SpanOutcome::Completed;
        }

        for ch in channels.iter() {
            let Some(exponent) = params.exponent(inputs.layout.color_index(ch)) else {
                continue;
            };
            if abort.is_aborted() {
                return SpanOutcome::Aborted;
            }
            let input = src.channel_span(ch, span.x, span.r);
            let dst = out.writable_span(ch, span.x, span.r);
            for (d, &v) in dst.iter_mut().zip(input) {
                *d = apply(v, exponent, params.pivot);
            }
        }
        SpanOutcome::Completed
    }
}
