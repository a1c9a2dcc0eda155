//! Error types for pixfx-core operations.
//!
//! Kernels themselves are total functions and never fail. Errors only
//! arise when buffers, frames or channel layouts are assembled with
//! inconsistent shapes.
//!
//! # Usage
//!
//! ```rust
//! use pixfx_core::{Error, Result};
//!
//! fn check_plane(len: usize, width: u32, height: u32) -> Result<()> {
//!     let expected = width as usize * height as usize;
//!     if len != expected {
//!         return Err(Error::buffer_size(expected, len));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building frames, rows and channel layouts.
#[derive(Debug, Error)]
pub enum Error {
    /// A channel index does not exist in the layout.
    #[error("channel {channel} out of range for layout with {count} channels")]
    ChannelOutOfRange {
        /// Offending channel index
        channel: usize,
        /// Number of channels in the layout
        count: usize,
    },

    /// Layout would exceed the channel capacity of a [`crate::ChannelSet`].
    #[error("layout holds {count} channels, maximum is {max}")]
    TooManyChannels {
        /// Requested channel count
        count: usize,
        /// Maximum supported channel count
        max: usize,
    },

    /// A layer was declared twice or without channels.
    #[error("invalid layer '{name}': {reason}")]
    InvalidLayer {
        /// Layer name
        name: String,
        /// Why the layer was rejected
        reason: String,
    },

    /// Number of planes does not match the layout.
    #[error("channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Expected channel count
        expected: usize,
        /// Actual channel count
        got: usize,
    },

    /// Invalid frame dimensions.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Sample buffer has the wrong length.
    #[error("buffer size mismatch: expected {expected} samples, got {got}")]
    BufferSize {
        /// Expected number of samples
        expected: usize,
        /// Actual number of samples
        got: usize,
    },
}

impl Error {
    /// Creates an [`Error::ChannelOutOfRange`] error.
    #[inline]
    pub fn channel_out_of_range(channel: usize, count: usize) -> Self {
        Self::ChannelOutOfRange { channel, count }
    }

    /// Creates an [`Error::InvalidLayer`] error.
    #[inline]
    pub fn invalid_layer(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLayer {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::ChannelMismatch`] error.
    #[inline]
    pub fn channel_mismatch(expected: usize, got: usize) -> Self {
        Self::ChannelMismatch { expected, got }
    }

    /// Creates an [`Error::BufferSize`] error.
    #[inline]
    pub fn buffer_size(expected: usize, got: usize) -> Self {
        Self::BufferSize { expected, got }
    }

    /// Returns `true` if this error is about buffer or frame shape.
    #[inline]
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. } | Self::BufferSize { .. } | Self::ChannelMismatch { .. }
        )
    }
}
