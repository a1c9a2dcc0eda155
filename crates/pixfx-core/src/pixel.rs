//! The [`Color3`] pixel value type.
//!
//! Every kernel in pixfx works on three-channel color values. Alpha and
//! other auxiliary channels never enter the color math; they are handled
//! by the row driver as plain per-channel planes.
//!
//! # Example
//!
//! ```rust
//! use pixfx_core::Color3;
//!
//! let bg = Color3::new(0.2, 0.3, 0.4);
//! let key = Color3::gray(0.1);
//!
//! let diff = bg - key;
//! assert!((diff.b - 0.3).abs() < 1e-6);
//! assert_eq!(diff.max_channel(), diff.b);
//! ```

use std::fmt;
use std::ops::{Add, Index, Mul, Neg, Sub};

/// An RGB triple of `f32` samples.
///
/// Immutable value type: all operations return a new color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Color3 {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl Color3 {
    /// All channels zero.
    pub const BLACK: Self = Self::gray(0.0);

    /// All channels one.
    pub const WHITE: Self = Self::gray(1.0);

    /// Creates a color from its three channels.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Creates a neutral color with every channel set to `v`.
    #[inline]
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Returns the channels as `[r, g, b]`.
    #[inline]
    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Creates a color from `[r, g, b]`.
    #[inline]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Applies `f` to each channel.
    #[inline]
    pub fn map<F: Fn(f32) -> f32>(self, f: F) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// Combines two colors channel by channel.
    #[inline]
    pub fn zip_map<F: Fn(f32, f32) -> f32>(self, other: Self, f: F) -> Self {
        Self::new(f(self.r, other.r), f(self.g, other.g), f(self.b, other.b))
    }

    /// Largest of the three channels.
    ///
    /// Always returns one of the channel values; a NaN in green or blue
    /// is skipped because comparisons against NaN are false.
    #[inline]
    pub fn max_channel(self) -> f32 {
        let mut m = self.r;
        if self.g > m {
            m = self.g;
        }
        if self.b > m {
            m = self.b;
        }
        m
    }

    /// Smallest of the three channels.
    #[inline]
    pub fn min_channel(self) -> f32 {
        let mut m = self.r;
        if self.g < m {
            m = self.g;
        }
        if self.b < m {
            m = self.b;
        }
        m
    }

    /// Returns `true` if all channels are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl From<[f32; 3]> for Color3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Color3> for [f32; 3] {
    #[inline]
    fn from(c: Color3) -> Self {
        c.to_array()
    }
}

impl Index<usize> for Color3 {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        match index {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            _ => panic!("Color3 index {index} out of range"),
        }
    }
}

impl Add for Color3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Sub for Color3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl Mul for Color3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.zip_map(rhs, |a, b| a * b)
    }
}

impl Mul<f32> for Color3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        self.map(|v| v * rhs)
    }
}

impl Neg for Color3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.map(|v| -v)
    }
}

impl fmt::Display for Color3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}
