//! Vibrance: saturation weighted toward less saturated pixels.
//!
//! A mask derived from the channel spread concentrates the adjustment on
//! near-neutral colors and leaves strongly saturated ones mostly alone.
//!
//! ```rust
//! use pixfx_core::{Color3, LuminanceMode};
//! use pixfx_ops::vibrance::apply;
//!
//! let c = Color3::new(0.3, 0.25, 0.2);
//! assert_eq!(apply(c, 1.0, LuminanceMode::Rec709), c);
//! ```

use pixfx_core::{clamp, lerp, luminance, ChannelSet, Color3, Format, LuminanceMode, PixelSpan, Row};
use serde::{Deserialize, Serialize};

use crate::effect::{read_triple, write_triple};
use crate::error::ensure_range;
use crate::{AbortFlag, ChannelSpec, Effect, OpsResult, SpanBuffers, SpanOutcome};

/// Upper bound of the vibrance setting.
pub const MAX_VIBRANCE: f32 = 5.0;

/// Weight of the vibrance adjustment for `c`.
///
/// Near 1 for low-saturation colors, near 0 for saturated or bright ones.
#[inline]
pub fn mask(c: Color3) -> f32 {
    let mn = c.min_channel();
    let mx = c.max_channel();
    clamp(1.0 - mx.max(1.0 - (mx - mn)), 0.0, 1.0)
}

/// Applies `vibrance` to `c`. A vibrance of exactly 1 returns `c`.
pub fn apply(c: Color3, vibrance: f32, mode: LuminanceMode) -> Color3 {
    if vibrance == 1.0 {
        return c;
    }
    let y = luminance(c, mode);
    let m = mask(c);
    c.map(|ch| lerp(y, ch, vibrance) * m + ch * (1.0 - m))
}

/// Derived vibrance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibranceParams {
    /// Vibrance in `[0, 5]`; 1 is the identity.
    pub vibrance: f32,
    /// Luminance formula.
    pub mode: LuminanceMode,
}

impl VibranceParams {
    /// Returns `true` when the adjustment leaves pixels unchanged.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.vibrance == 1.0
    }
}

/// Vibrance settings as stored in presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibranceSettings {
    /// Vibrance in `[0, 5]`.
    #[serde(alias = "vibrancy")]
    pub vibrance: f32,
    /// Luminance formula.
    pub mode: LuminanceMode,
}

impl Default for VibranceSettings {
    fn default() -> Self {
        Self {
            vibrance: 1.0,
            mode: LuminanceMode::Rec709,
        }
    }
}

/// The vibrance effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vibrance;

impl Effect for Vibrance {
    const NAME: &'static str = "vibrance";
    type Settings = VibranceSettings;
    type Params = VibranceParams;

    fn derive_params(settings: &VibranceSettings, _format: Format) -> OpsResult<VibranceParams> {
        Ok(VibranceParams {
            vibrance: ensure_range("vibrance", settings.vibrance, 0.0, MAX_VIBRANCE)?,
            mode: settings.mode,
        })
    }

    fn required_channels(_params: &VibranceParams) -> ChannelSpec {
        ChannelSpec::triples(1)
    }

    fn process_span(
        params: &VibranceParams,
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

        for triple in inputs.layout.triples(channels) {
            if abort.is_aborted() {
                return SpanOutcome::Aborted;
            }
            let adjusted: Vec<Color3> = read_triple(src, triple, span)
                .into_iter()
                .map(|c| apply(c, params.vibrance, params.mode))
                .collect();
            write_triple(out, triple, span, &adjusted);
        }
        SpanOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_at_one() {
        let samples = [
            Color3::new(0.3, 0.25, 0.2),
            Color3::new(-1.0, 4.0, 0.5),
            Color3::gray(0.0),
            Color3::new(f32::NAN, 0.1, 0.2),
        ];
        for mode in LuminanceMode::ALL {
            for c in samples {
                let out = apply(c, 1.0, mode);
                assert_eq!(out.to_array().map(f32::to_bits), c.to_array().map(f32::to_bits));
            }
        }
    }

    #[test]
    fn neutral_gray_is_mask_invariant() {
        let c = Color3::gray(0.5);
        assert_eq!(mask(c), 0.0);
        assert_eq!(apply(c, 2.0, LuminanceMode::Average), c);
    }

    #[test]
    fn mask_favors_dim_muted_colors() {
        let muted = Color3::new(0.3, 0.25, 0.2);
        let vivid = Color3::new(1.0, 0.2, 0.0);
        assert_abs_diff_eq!(mask(muted), 0.1, epsilon = 1e-6);
        assert_eq!(mask(vivid), 0.0);
    }

    #[test]
    fn boosts_saturation_of_muted_colors() {
        let c = Color3::new(0.3, 0.25, 0.2);
        let y = luminance(c, LuminanceMode::Average);
        let out = apply(c, 3.0, LuminanceMode::Average);
        // mask 0.1: each channel moves 0.1 * 2 * (ch - y) away from the mean
        assert_abs_diff_eq!(out.r, 0.3 + 0.2 * (0.3 - y), epsilon = 1e-6);
        assert_abs_diff_eq!(out.b, 0.2 + 0.2 * (0.2 - y), epsilon = 1e-6);
        assert!(out.r - out.b > c.r - c.b);
    }

    #[test]
    fn derive_checks_range() {
        let format = Format::new(1, 1);
        let ok = VibranceSettings {
            vibrance: 5.0,
            ..Default::default()
        };
        assert!(Vibrance::derive_params(&ok, format).is_ok());
        let bad = VibranceSettings {
            vibrance: 5.5,
            ..Default::default()
        };
        assert!(Vibrance::derive_params(&bad, format).is_err());
        assert!(Vibrance::derive_params(&VibranceSettings::default(), format)
            .unwrap()
            .is_identity());
    }
}
