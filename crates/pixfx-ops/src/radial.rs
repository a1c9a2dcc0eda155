//! Procedural radial fields: angular ramp, rays and rings.
//!
//! All three shapes share one geometry step. The offset of a pixel from
//! the center is rotated by `-rotation` to give `(h, v)`:
//!
//! ```text
//! ramp  : t = 0.5 + atan2(h, v) / 2pi,  out = (1 - t) * start + t * end
//! rays  : out = sin(atan2(h, v) * count) * color
//! rings : out = sin(|(h, v)| / size) * color
//! ```
//!
//! Fields are written to the red, green, blue and alpha slots (color
//! index 0..4) of every requested layer; other channels are black.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec2;
//! use pixfx_ops::radial::{RadialFieldParams, RadialShape};
//!
//! let rings = RadialFieldParams::new(
//!     Vec2::ZERO,
//!     0.0,
//!     RadialShape::Rings { size: 10.0, color: [1.0; 4] },
//! );
//! assert_eq!(rings.sample(0.0, 0.0), [0.0; 4]);
//! ```

use std::f32::consts::TAU;

use glam::{Mat2, Vec2, Vec4};
use pixfx_core::{ChannelSet, Format, PixelSpan, Row};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, ensure_range, OpsError};
use crate::{AbortFlag, ChannelSpec, Effect, OpsResult, SpanBuffers, SpanOutcome};

/// Shape of a radial field and its colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadialShape {
    /// Angular gradient from `start` to `end`.
    Ramp {
        /// Color at `t = 0`
        start: [f32; 4],
        /// Color at `t = 1`
        end: [f32; 4],
    },
    /// `count` sine rays around the center.
    Rays {
        /// Number of rays
        count: f32,
        /// Peak color
        color: [f32; 4],
    },
    /// Concentric sine rings.
    Rings {
        /// Ring period divisor
        size: f32,
        /// Peak color
        color: [f32; 4],
    },
}

/// Derived radial field parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialFieldParams {
    /// Field center in pixels.
    pub center: Vec2,
    /// Rotation in radians, reduced to `[0, 2pi)`.
    pub rotation: f32,
    /// Shape and colors.
    pub shape: RadialShape,
    inverse: Mat2,
}

impl RadialFieldParams {
    /// Creates params; `rotation_degrees` is reduced modulo 360.
    pub fn new(center: Vec2, rotation_degrees: f32, shape: RadialShape) -> Self {
        let rotation = rotation_degrees.rem_euclid(360.0).to_radians();
        Self {
            center,
            rotation,
            shape,
            inverse: Mat2::from_angle(-rotation),
        }
    }

    /// Rotated offset `(h, v)` of pixel `(x, y)` from the center.
    #[inline]
    pub fn offset(&self, x: f32, y: f32) -> Vec2 {
        self.inverse * (Vec2::new(x, y) - self.center)
    }

    /// Field value at pixel `(x, y)`, as RGBA.
    pub fn sample(&self, x: f32, y: f32) -> [f32; 4] {
        let hv = self.offset(x, y);
        let value = match self.shape {
            RadialShape::Ramp { start, end } => {
                let t = 0.5 + hv.x.atan2(hv.y) / TAU;
                Vec4::from_array(start) * (1.0 - t) + Vec4::from_array(end) * t
            }
            RadialShape::Rays { count, color } => {
                Vec4::from_array(color) * (hv.x.atan2(hv.y) * count).sin()
            }
            RadialShape::Rings { size, color } => {
                Vec4::from_array(color) * (hv.length() / size).sin()
            }
        };
        value.to_array()
    }
}

/// Writes the field of `params` for `channels` of `span`.
fn generate(
    params: &RadialFieldParams,
    span: PixelSpan,
    inputs: &SpanBuffers<'_>,
    channels: ChannelSet,
    out: &mut Row,
    abort: &AbortFlag,
) -> SpanOutcome {
    let y = span.y as f32;
    let field: Vec<[f32; 4]> = span
        .columns()
        .map(|x| params.sample(x as f32, y))
        .collect();

    for ch in channels.iter() {
        if abort.is_aborted() {
            return SpanOutcome::Aborted;
        }
        let idx = inputs.layout.color_index(ch);
        let dst = out.writable_span(ch, span.x, span.r);
        if idx < 4 {
            for (d, v) in dst.iter_mut().zip(&field) {
                *d = v[idx];
            }
        } else {
            dst.fill(0.0);
        }
    }
    SpanOutcome::Completed
}

fn center_or_default(center: Option<[f32; 2]>, format: Format) -> OpsResult<Vec2> {
    let center = Vec2::from_array(center.unwrap_or_else(|| format.center()));
    if center.is_finite() {
        Ok(center)
    } else {
        Err(OpsError::invalid("center", "must be finite"))
    }
}

fn check_rotation(rotate: f32) -> OpsResult<f32> {
    ensure_range("rotate", rotate, f32::MIN, f32::MAX)
}

fn check_color(name: &'static str, color: [f32; 4]) -> OpsResult<[f32; 4]> {
    if color.iter().all(|c| c.is_finite()) {
        Ok(color)
    } else {
        Err(OpsError::invalid(name, "must be finite"))
    }
}

/// Circular ramp settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampSettings {
    /// Center in pixels; the frame center when unset.
    pub center: Option<[f32; 2]>,
    /// Rotation in degrees.
    pub rotate: f32,
    /// Start color (RGBA).
    pub start_color: [f32; 4],
    /// End color (RGBA).
    pub end_color: [f32; 4],
}

impl Default for RampSettings {
    fn default() -> Self {
        Self {
            center: None,
            rotate: 0.0,
            start_color: [0.0; 4],
            end_color: [1.0; 4],
        }
    }
}

/// Circular rays settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaysSettings {
    /// Center in pixels; the frame center when unset.
    pub center: Option<[f32; 2]>,
    /// Rotation in degrees.
    pub rotate: f32,
    /// Number of rays, `>= 1`.
    #[serde(alias = "amount")]
    pub count: f32,
    /// Ray color (RGBA).
    pub color: [f32; 4],
}

impl Default for RaysSettings {
    fn default() -> Self {
        Self {
            center: None,
            rotate: 0.0,
            count: 10.0,
            color: [1.0; 4],
        }
    }
}

/// Circular rings settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingsSettings {
    /// Center in pixels; the frame center when unset.
    pub center: Option<[f32; 2]>,
    /// Rotation in degrees.
    pub rotate: f32,
    /// Ring size, `> 0`.
    pub size: f32,
    /// Ring color (RGBA).
    pub color: [f32; 4],
}

impl Default for RingsSettings {
    fn default() -> Self {
        Self {
            center: None,
            rotate: 0.0,
            size: 10.0,
            color: [1.0; 4],
        }
    }
}

/// Angular gradient generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularRamp;

/// Sine rays generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularRays;

/// Sine rings generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularRings;

impl Effect for CircularRamp {
    const NAME: &'static str = "circular_ramp";
    type Settings = RampSettings;
    type Params = RadialFieldParams;

    fn derive_params(s: &RampSettings, format: Format) -> OpsResult<RadialFieldParams> {
        let shape = RadialShape::Ramp {
            start: check_color("start_color", s.start_color)?,
            end: check_color("end_color", s.end_color)?,
        };
        Ok(RadialFieldParams::new(
            center_or_default(s.center, format)?,
            check_rotation(s.rotate)?,
            shape,
        ))
    }

    fn required_channels(_params: &RadialFieldParams) -> ChannelSpec {
        ChannelSpec::GENERATOR
    }

    fn process_span(
        params: &RadialFieldParams,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome {
        generate(params, span, inputs, channels, out, abort)
    }
}

impl Effect for CircularRays {
    const NAME: &'static str = "circular_rays";
    type Settings = RaysSettings;
    type Params = RadialFieldParams;

    fn derive_params(s: &RaysSettings, format: Format) -> OpsResult<RadialFieldParams> {
        let shape = RadialShape::Rays {
            count: ensure_range("count", s.count, 1.0, f32::MAX)?,
            color: check_color("color", s.color)?,
        };
        Ok(RadialFieldParams::new(
            center_or_default(s.center, format)?,
            check_rotation(s.rotate)?,
            shape,
        ))
    }

    fn required_channels(_params: &RadialFieldParams) -> ChannelSpec {
        ChannelSpec::GENERATOR
    }

    fn process_span(
        params: &RadialFieldParams,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome {
        generate(params, span, inputs, channels, out, abort)
    }
}

impl Effect for CircularRings {
    const NAME: &'static str = "circular_rings";
    type Settings = RingsSettings;
    type Params = RadialFieldParams;

    fn derive_params(s: &RingsSettings, format: Format) -> OpsResult<RadialFieldParams> {
        let shape = RadialShape::Rings {
            size: ensure_positive("size", s.size)?,
            color: check_color("color", s.color)?,
        };
        Ok(RadialFieldParams::new(
            center_or_default(s.center, format)?,
            check_rotation(s.rotate)?,
            shape,
        ))
    }

    fn required_channels(_params: &RadialFieldParams) -> ChannelSpec {
        ChannelSpec::GENERATOR
    }

    fn process_span(
        params: &RadialFieldParams,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome {
        generate(params, span, inputs, channels, out, abort)
    }
}
