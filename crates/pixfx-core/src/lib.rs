//! # pixfx-core
//!
//! Core types for the pixfx pixel kernels.
//!
//! - [`Color3`] - RGB value type the kernels compute with
//! - [`luminance`], [`lerp`], [`clamp`] - shared color math
//! - [`Channel`], [`ChannelSet`], [`ChannelLayout`] - layered channel model
//! - [`PixelSpan`] - columns `[x, r)` of one scanline
//! - [`Row`], [`RowSource`], [`Frame`] - planar pixel buffers
//!
//! ## Crate Structure
//!
//! ```text
//! pixfx-core (this crate)
//!    ^
//!    |
//!    +-- pixfx-ops (kernels, row driver, registry)
//!    +-- pixfx-bench
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/deserialize [`LuminanceMode`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod channel;
pub mod color_math;
pub mod error;
pub mod frame;
pub mod pixel;
pub mod row;
pub mod span;

pub use channel::{Channel, ChannelLayout, ChannelSet, Layer, MAX_CHANNELS};
pub use color_math::{clamp, lerp, luminance, LuminanceMode, CCIR601_LUMA, REC709_LUMA};
pub use error::{Error, Result};
pub use frame::{Format, Frame};
pub use pixel::Color3;
pub use row::{Row, RowSource};
pub use span::PixelSpan;

/// Prelude module for convenient imports.
///
/// ```
/// use pixfx_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::channel::{Channel, ChannelLayout, ChannelSet};
    pub use crate::color_math::{clamp, lerp, luminance, LuminanceMode};
    pub use crate::error::{Error, Result};
    pub use crate::frame::{Format, Frame};
    pub use crate::pixel::Color3;
    pub use crate::row::{Row, RowSource};
    pub use crate::span::PixelSpan;
}
