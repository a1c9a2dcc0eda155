//! # pixfx-ops
//!
//! Pixel kernels for compositing and the driver that applies them to rows.
//!
//! # Kernels
//!
//! - [`keyer`] - additive/difference keyer with optional shadow and compensation
//! - [`vibrance`] - saturation weighted toward muted pixels
//! - [`contrast`] - pivot power-law contrast
//! - [`radial`] - angular ramp, rays and rings generators
//! - [`scroll`] - integer scroll with wrap-around
//! - [`toon`] - separable soften blur
//!
//! # Driving kernels
//!
//! Each kernel implements [`Effect`]: derive an immutable params snapshot
//! from settings, declare the inputs it needs, process one span. A
//! [`RowDriver`] runs an effect over spans of [`RowSource`](pixfx_core::RowSource)
//! inputs, [`render_frame`] runs it over a whole frame, and the
//! [`Registry`] builds drivers by name from YAML [`Preset`]s.
//!
//! # Example
//!
//! ```rust
//! use pixfx_core::{Channel, ChannelLayout, ChannelSet, Frame};
//! use pixfx_ops::keyer::{Keyer, KeyerSettings};
//! use pixfx_ops::{render_frame, RenderContext, RowDriver};
//!
//! let bg = Frame::filled(8, 8, ChannelLayout::rgba(), &[0.5, 0.5, 0.5, 1.0]).unwrap();
//! let screen = Frame::filled(8, 8, ChannelLayout::rgba(), &[0.3, 0.2, 0.1, 1.0]).unwrap();
//!
//! let settings = KeyerSettings { highlights: 1.0, ..Default::default() };
//! let keyer = RowDriver::<Keyer>::new(&settings, bg.format()).unwrap();
//!
//! let ctx = RenderContext::from_source(&bg).with_input(&screen);
//! let report = render_frame(&keyer, &ctx, ChannelSet::RGBA).unwrap();
//! assert!((report.frame.get(0, 0, Channel::RED) - 0.65).abs() < 1e-6);
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - render rows concurrently with Rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod driver;
mod effect;
mod error;
mod registry;
mod render;

pub mod contrast;
pub mod keyer;
pub mod radial;
pub mod scroll;
pub mod toon;
pub mod vibrance;

pub use driver::{Processor, RenderContext, RowDriver};
pub use effect::{AbortFlag, ChannelSpec, Effect, SpanBuffers, SpanOutcome};
pub use error::{OpsError, OpsResult};
pub use registry::{Preset, Registry};
pub use render::{render_frame, RenderReport};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::contrast::{Contrast, ContrastSettings};
    pub use crate::keyer::{Compensation, CompensationFormula, CompensationScope, Keyer, KeyerSettings};
    pub use crate::radial::{CircularRamp, CircularRays, CircularRings};
    pub use crate::scroll::{Scroll, ScrollSettings};
    pub use crate::toon::{Toon, ToonFilter, ToonSettings};
    pub use crate::vibrance::{Vibrance, VibranceSettings};
    pub use crate::{
        render_frame, AbortFlag, Effect, OpsError, OpsResult, Preset, Processor, Registry,
        RenderContext, RowDriver, SpanOutcome,
    };
}
