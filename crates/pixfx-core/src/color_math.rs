//! Stateless color math shared by all kernels.
//!
//! - [`luminance`] - brightness scalar under a [`LuminanceMode`]
//! - [`lerp`] - blend from a luminance value toward a channel value
//! - [`clamp`] - range clamp that lets NaN through
//!
//! None of these functions sanitize their inputs. NaN and infinities
//! propagate according to IEEE-754.

use crate::pixel::Color3;
use std::fmt;
use std::str::FromStr;

/// Rec.709 luminance weights `[R, G, B]`.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// CCIR 601 luminance weights `[R, G, B]`.
pub const CCIR601_LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Formula used to collapse three channels into one brightness value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LuminanceMode {
    /// `0.2126 R + 0.7152 G + 0.0722 B`
    #[default]
    Rec709,
    /// `0.299 R + 0.587 G + 0.114 B`
    Ccir601,
    /// `(R + G + B) / 3`
    Average,
    /// `max(R, G, B)`
    Maximum,
    /// `min(R, G, B)`
    Minimum,
}

impl LuminanceMode {
    /// Every mode, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Rec709,
        Self::Ccir601,
        Self::Average,
        Self::Maximum,
        Self::Minimum,
    ];

    /// Short lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rec709 => "rec709",
            Self::Ccir601 => "ccir601",
            Self::Average => "average",
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
        }
    }
}

impl fmt::Display for LuminanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LuminanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace([' ', '_', '.'], "");
        match normalized.as_str() {
            "rec709" => Ok(Self::Rec709),
            "ccir601" | "rec601" => Ok(Self::Ccir601),
            "average" | "avg" => Ok(Self::Average),
            "maximum" | "max" => Ok(Self::Maximum),
            "minimum" | "min" => Ok(Self::Minimum),
            _ => Err(format!("unknown luminance mode '{s}'")),
        }
    }
}

/// Brightness of `c` under `mode`.
///
/// # Example
///
/// ```rust
/// use pixfx_core::{luminance, Color3, LuminanceMode};
///
/// let c = Color3::new(0.5, 0.3, 0.2);
/// assert!((luminance(c, LuminanceMode::Rec709) - 0.3353).abs() < 1e-4);
/// assert_eq!(luminance(c, LuminanceMode::Maximum), 0.5);
/// ```
#[inline]
pub fn luminance(c: Color3, mode: LuminanceMode) -> f32 {
    match mode {
        LuminanceMode::Rec709 => weighted(c, REC709_LUMA),
        LuminanceMode::Ccir601 => weighted(c, CCIR601_LUMA),
        LuminanceMode::Average => (c.r + c.g + c.b) / 3.0,
        LuminanceMode::Maximum => c.max_channel(),
        LuminanceMode::Minimum => c.min_channel(),
    }
}

#[inline]
fn weighted(c: Color3, w: [f32; 3]) -> f32 {
    c.r * w[0] + c.g * w[1] + c.b * w[2]
}

/// Blends from `y` toward `x` by `t`: `y + t * (x - y)`.
///
/// At the call sites `y` is a luminance value and `x` an original
/// channel, so `t = 0` yields gray and `t = 1` the untouched channel.
#[inline]
pub fn lerp(y: f32, x: f32, t: f32) -> f32 {
    y + t * (x - y)
}

/// Clamps `v` into `[lo, hi]`.
///
/// Requires `lo <= hi` (not checked). Unlike [`f32::clamp`] this never
/// panics and returns NaN unchanged.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}
