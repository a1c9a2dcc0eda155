//! Additive/difference keyer.
//!
//! The keyer measures how far a screen color deviates from a reference
//! (key) color and adds that deviation, scaled by the background, back
//! onto the background:
//!
//! ```text
//! diff      = screen - reference
//! desat     = lerp(luminance(diff), diff, saturation)
//! highlight = gain * clamp(desat, 0, 1000) * bg
//! shadow    = shadow_gain * clamp(desat, -1000, 0) * bg   (optional)
//! result    = bg + highlight + shadow                     (optionally compensated)
//! ```
//!
//! Compensation keeps the visual strength roughly constant while the
//! gain is swept. Two formulas exist in the wild and both are offered
//! through [`CompensationFormula`].
//!
//! # Example
//!
//! ```rust
//! use pixfx_core::{Color3, LuminanceMode};
//! use pixfx_ops::keyer::{compose, KeyerParams};
//!
//! let params = KeyerParams::new(Color3::gray(0.1), LuminanceMode::Maximum, 0.5, 2.0);
//! let bg = Color3::new(0.2, 0.3, 0.4);
//!
//! // A screen pixel at the reference color leaves the background alone.
//! assert_eq!(compose(bg, Color3::gray(0.1), &params), bg);
//! ```

use pixfx_core::{
    clamp, lerp, luminance, ChannelSet, Color3, Format, LuminanceMode, PixelSpan, Row,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::effect::{read_triple, write_triple};
use crate::error::{ensure_range, OpsError};
use crate::{AbortFlag, ChannelSpec, Effect, OpsResult, SpanBuffers, SpanOutcome};

/// Magnitude limit applied to the clamped deviation copies.
pub const KEY_LIMIT: f32 = 1000.0;

/// How the compensation factor is computed from the highlight gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationFormula {
    /// `1 / gain`: the highlight term becomes independent of the gain.
    #[default]
    Reciprocal,
    /// `1 - gain / 10`: a gentle falloff, reaching zero at gain 10.
    LinearFalloff,
}

impl CompensationFormula {
    /// Compensation factor for `gain`.
    #[inline]
    pub fn factor(self, gain: f32) -> f32 {
        match self {
            Self::Reciprocal => 1.0 / gain,
            Self::LinearFalloff => 1.0 - gain / 10.0,
        }
    }
}

/// Which part of the result the compensation factor scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationScope {
    /// Only the highlight term.
    #[default]
    Highlight,
    /// The whole composite, background included.
    Composite,
}

/// A compensation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Compensation {
    /// Factor formula
    pub formula: CompensationFormula,
    /// Scaled term
    pub scope: CompensationScope,
}

/// Derived keyer parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyerParams {
    /// Key color subtracted from the screen.
    pub reference: Color3,
    /// Luminance formula for the desaturation step.
    pub mode: LuminanceMode,
    /// 0 keys on luminance only, 1 keys on full color.
    pub saturation: f32,
    highlight_gain: f32,
    /// Shadow gain when the shadow branch is enabled.
    pub shadow: Option<f32>,
    compensation: Option<(CompensationScope, f32)>,
}

impl KeyerParams {
    /// Creates params with no shadow branch and no compensation.
    pub fn new(reference: Color3, mode: LuminanceMode, saturation: f32, highlight_gain: f32) -> Self {
        Self {
            reference,
            mode,
            saturation,
            highlight_gain,
            shadow: None,
            compensation: None,
        }
    }

    /// Enables the shadow branch with `gain`.
    pub fn with_shadow(mut self, gain: f32) -> Self {
        self.shadow = Some(gain);
        self
    }

    /// Enables compensation.
    ///
    /// A zero highlight gain leaves compensation off, since the
    /// reciprocal would be undefined.
    pub fn with_compensation(mut self, compensation: Compensation) -> Self {
        if self.highlight_gain == 0.0 {
            warn!("keyer compensation skipped: highlight gain is zero");
            self.compensation = None;
        } else {
            let factor = compensation.formula.factor(self.highlight_gain);
            self.compensation = Some((compensation.scope, factor));
        }
        self
    }

    /// Highlight gain, `>= 0`.
    ///
    /// Fixed at construction; the compensation factor is cached from it.
    #[inline]
    pub fn highlight_gain(&self) -> f32 {
        self.highlight_gain
    }

    /// Active compensation scope and its cached factor.
    pub fn compensation(&self) -> Option<(CompensationScope, f32)> {
        self.compensation
    }
}

/// Composites the keyed deviation of `screen` onto `bg`.
pub fn compose(bg: Color3, screen: Color3, params: &KeyerParams) -> Color3 {
    let diff = screen - params.reference;
    let y = luminance(diff, params.mode);
    let desat = diff.map(|c| lerp(y, c, params.saturation));

    let positive = desat.map(|c| clamp(c, 0.0, KEY_LIMIT));
    let highlight = positive * bg * params.highlight_gain;

    let shadow = match params.shadow {
        Some(gain) => desat.map(|c| clamp(c, -KEY_LIMIT, 0.0)) * bg * gain,
        None => Color3::BLACK,
    };

    match params.compensation {
        None => bg + highlight + shadow,
        Some((CompensationScope::Highlight, factor)) => bg + highlight * factor + shadow,
        Some((CompensationScope::Composite, factor)) => (bg + highlight + shadow) * factor,
    }
}

/// Keyer settings as stored in presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyerSettings {
    /// Key color.
    pub reference_color: [f32; 3],
    /// When off the reference is black and the screen itself is the deviation.
    pub use_reference_color: bool,
    /// Luminance formula.
    pub mode: LuminanceMode,
    /// Saturation in `[0, 1]`.
    pub saturation: f32,
    /// Highlight gain.
    pub highlights: f32,
    /// Enables the shadow branch.
    pub enable_shadows: bool,
    /// Shadow gain.
    pub shadows: f32,
    /// Enables compensation.
    pub compensate: bool,
    /// Compensation formula.
    pub compensation_formula: CompensationFormula,
    /// Compensation scope.
    pub compensation_scope: CompensationScope,
}

impl Default for KeyerSettings {
    fn default() -> Self {
        Self {
            reference_color: [0.0; 3],
            use_reference_color: true,
            mode: LuminanceMode::Maximum,
            saturation: 0.0,
            highlights: 0.0,
            enable_shadows: false,
            shadows: 0.0,
            compensate: false,
            compensation_formula: CompensationFormula::default(),
            compensation_scope: CompensationScope::default(),
        }
    }
}

/// The keyer effect: input 0 is the background, input 1 the screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keyer;

impl Effect for Keyer {
    const NAME: &'static str = "keyer";
    type Settings = KeyerSettings;
    type Params = KeyerParams;

    fn derive_params(settings: &KeyerSettings, _format: Format) -> OpsResult<KeyerParams> {
        let reference = if settings.use_reference_color {
            Color3::from(settings.reference_color)
        } else {
            Color3::BLACK
        };
        if !reference.is_finite() {
            return Err(OpsError::invalid("reference_color", "must be finite"));
        }
        let saturation = ensure_range("saturation", settings.saturation, 0.0, 1.0)?;
        let highlights = ensure_range("highlights", settings.highlights, 0.0, f32::MAX)?;

        let mut params = KeyerParams::new(reference, settings.mode, saturation, highlights);
        if settings.enable_shadows {
            params = params.with_shadow(ensure_range("shadows", settings.shadows, 0.0, f32::MAX)?);
        }
        if settings.compensate {
            params = params.with_compensation(Compensation {
                formula: settings.compensation_formula,
                scope: settings.compensation_scope,
            });
        }
        Ok(params)
    }

    fn required_channels(_params: &KeyerParams) -> ChannelSpec {
        ChannelSpec::triples(2)
    }

    fn process_span(
        params: &KeyerParams,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome {
        let (Some(bg_row), Some(screen_row)) = (inputs.row(0), inputs.row(1)) else {
            return SpanOutcome::Completed;
        };

        for triple in inputs.layout.triples(channels) {
            if abort.is_aborted() {
                return SpanOutcome::Aborted;
            }
            let bg = read_triple(bg_row, triple, span);
            let screen = read_triple(screen_row, triple, span);
            let keyed: Vec<Color3> = bg
                .iter()
                .zip(&screen)
                .map(|(&b, &s)| compose(b, s, params))
                .collect();
            write_triple(out, triple, span, &keyed);
        }
        SpanOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_color_eq(a: Color3, b: Color3) {
        assert_abs_diff_eq!(a.r, b.r, epsilon = 1e-6);
        assert_abs_diff_eq!(a.g, b.g, epsilon = 1e-6);
        assert_abs_diff_eq!(a.b, b.b, epsilon = 1e-6);
    }

    #[test]
    fn zero_deviation_returns_background() {
        let c = Color3::new(0.2, 0.3, 0.4);
        let params = KeyerParams::new(c, LuminanceMode::Maximum, 0.5, 2.0);
        assert_eq!(compose(c, c, &params), c);
    }

    #[test]
    fn zero_deviation_any_settings() {
        let bg = Color3::new(0.7, 0.1, 0.9);
        let reference = Color3::new(0.3, 0.6, 0.2);
        for mode in LuminanceMode::ALL {
            for saturation in [0.0, 0.25, 1.0] {
                for gain in [0.0, 1.0, 7.5] {
                    let params = KeyerParams::new(reference, mode, saturation, gain)
                        .with_shadow(3.0)
                        .with_compensation(Compensation::default());
                    assert_eq!(compose(bg, reference, &params), bg);
                }
            }
        }
    }

    #[test]
    fn highlight_adds_scaled_deviation() {
        // Maximum of (0.4, 0.2, 0.0) is 0.4; saturation 0 keys on luminance.
        let params = KeyerParams::new(Color3::BLACK, LuminanceMode::Maximum, 0.0, 2.0);
        let bg = Color3::new(0.5, 0.25, 1.0);
        let out = compose(bg, Color3::new(0.4, 0.2, 0.0), &params);
        assert_color_eq(out, bg + bg * 0.8);
    }

    #[test]
    fn full_saturation_keys_per_channel() {
        let params = KeyerParams::new(Color3::BLACK, LuminanceMode::Rec709, 1.0, 1.0);
        let bg = Color3::gray(0.5);
        let out = compose(bg, Color3::new(0.2, 0.0, 0.6), &params);
        assert_color_eq(out, Color3::new(0.6, 0.5, 0.8));
    }

    #[test]
    fn negative_deviation_needs_shadow_branch() {
        let reference = Color3::gray(0.5);
        let screen = Color3::gray(0.3);
        let bg = Color3::gray(1.0);

        let plain = KeyerParams::new(reference, LuminanceMode::Average, 0.0, 1.0);
        assert_eq!(compose(bg, screen, &plain), bg);

        let shadow = plain.with_shadow(2.0);
        let out = compose(bg, screen, &shadow);
        assert_color_eq(out, Color3::gray(0.6));
    }

    #[test]
    fn reciprocal_compensation_is_gain_invariant() {
        let bg = Color3::new(0.2, 0.4, 0.6);
        let screen = Color3::new(0.9, 0.5, 0.3);
        let comp = Compensation::default();
        let results: Vec<Color3> = [0.5, 2.0, 8.0]
            .into_iter()
            .map(|gain| {
                let params = KeyerParams::new(Color3::gray(0.1), LuminanceMode::Maximum, 0.3, gain)
                    .with_compensation(comp);
                compose(bg, screen, &params)
            })
            .collect();
        assert_color_eq(results[0], results[1]);
        assert_color_eq(results[1], results[2]);
    }

    #[test]
    fn linear_falloff_composite() {
        let params = KeyerParams::new(Color3::BLACK, LuminanceMode::Maximum, 0.0, 5.0)
            .with_compensation(Compensation {
                formula: CompensationFormula::LinearFalloff,
                scope: CompensationScope::Composite,
            });
        let bg = Color3::gray(0.2);
        let out = compose(bg, Color3::gray(0.1), &params);
        // (0.2 + 5 * 0.1 * 0.2) * (1 - 0.5)
        assert_color_eq(out, Color3::gray(0.15));
    }

    #[test]
    fn zero_gain_skips_compensation() {
        let params = KeyerParams::new(Color3::BLACK, LuminanceMode::Maximum, 0.0, 0.0)
            .with_compensation(Compensation::default());
        assert_eq!(params.compensation(), None);
        let out = compose(Color3::gray(0.4), Color3::WHITE, &params);
        assert!(out.is_finite());
        assert_eq!(out, Color3::gray(0.4));
    }

    #[test]
    fn cached_factor_matches_gain() {
        for formula in [CompensationFormula::Reciprocal, CompensationFormula::LinearFalloff] {
            let params = KeyerParams::new(Color3::BLACK, LuminanceMode::Rec709, 0.5, 4.0)
                .with_shadow(1.0)
                .with_compensation(Compensation {
                    formula,
                    scope: CompensationScope::Highlight,
                });
            assert_eq!(params.highlight_gain(), 4.0);
            let (_, factor) = params.compensation().unwrap();
            assert_eq!(factor, formula.factor(params.highlight_gain()));
        }

        let params = KeyerParams::new(Color3::BLACK, LuminanceMode::Rec709, 0.0, 4.0)
            .with_compensation(Compensation::default());
        // compensated highlight is gain * deviation * bg / gain
        let out = compose(Color3::gray(0.5), Color3::gray(0.2), &params);
        assert_color_eq(out, Color3::gray(0.5 + 0.2 * 0.5));
    }

    #[test]
    fn deviation_is_clamped() {
        let params = KeyerParams::new(Color3::BLACK, LuminanceMode::Maximum, 1.0, 1.0);
        let out = compose(Color3::WHITE, Color3::gray(5000.0), &params);
        assert_eq!(out, Color3::gray(1.0 + KEY_LIMIT));
    }

    #[test]
    fn derive_from_settings() {
        let settings = KeyerSettings {
            reference_color: [0.1, 0.2, 0.3],
            highlights: 2.0,
            compensate: true,
            ..Default::default()
        };
        let params = Keyer::derive_params(&settings, Format::new(4, 4)).unwrap();
        assert_eq!(params.reference, Color3::new(0.1, 0.2, 0.3));
        assert_eq!(params.mode, LuminanceMode::Maximum);
        assert_eq!(params.shadow, None);
        let (scope, factor) = params.compensation().unwrap();
        assert_eq!(scope, CompensationScope::Highlight);
        assert_abs_diff_eq!(factor, 0.5);

        let unreferenced = KeyerSettings {
            use_reference_color: false,
            ..settings
        };
        let params = Keyer::derive_params(&unreferenced, Format::new(4, 4)).unwrap();
        assert_eq!(params.reference, Color3::BLACK);
    }

    #[test]
    fn derive_rejects_out_of_range() {
        let format = Format::new(1, 1);
        let bad_sat = KeyerSettings {
            saturation: 1.5,
            ..Default::default()
        };
        assert!(Keyer::derive_params(&bad_sat, format).is_err());

        let bad_gain = KeyerSettings {
            highlights: -1.0,
            ..Default::default()
        };
        assert!(Keyer::derive_params(&bad_gain, format).is_err());

        let bad_shadow = KeyerSettings {
            enable_shadows: true,
            shadows: -0.5,
            ..Default::default()
        };
        assert!(Keyer::derive_params(&bad_shadow, format).is_err());
    }
}
