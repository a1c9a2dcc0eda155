//! Row driver: the adapter between a row scheduler and an [`Effect`].
//!
//! A [`RowDriver`] owns the derived parameters of one effect as an
//! immutable `Arc` snapshot. For each span it fetches the input rows the
//! effect needs, copies input 0 into the output so that untouched
//! channels pass through exactly, and hands the span to the kernel.
//!
//! # Example
//!
//! ```rust
//! use pixfx_core::{Channel, ChannelLayout, ChannelSet, Frame, PixelSpan, Row};
//! use pixfx_ops::contrast::{Contrast, ContrastSettings};
//! use pixfx_ops::{RenderContext, RowDriver};
//!
//! let frame = Frame::filled(4, 1, ChannelLayout::rgba(), &[0.36, 0.18, 0.09, 1.0]).unwrap();
//! let settings = ContrastSettings { exponents: [2.0, 2.0, 2.0, 1.0], ..Default::default() };
//! let driver = RowDriver::<Contrast>::new(&settings, frame.format()).unwrap();
//!
//! let ctx = RenderContext::from_source(&frame);
//! let span = PixelSpan::full_row(0, 4);
//! let mut out = Row::for_span(span);
//! driver.process_span(&ctx, span, ChannelSet::RGBA, &mut out).unwrap();
//! assert!((out.channel(Channel::RED)[0] - 0.72).abs() < 1e-6);
//! ```

use std::sync::Arc;

use pixfx_core::{ChannelLayout, ChannelSet, Format, PixelSpan, Row, RowSource};
use tracing::{debug, trace};

use crate::{AbortFlag, ChannelSpec, Effect, OpsError, OpsResult, SpanBuffers, SpanOutcome};

/// Inputs, layout and format of one render.
#[derive(Clone)]
pub struct RenderContext<'a> {
    inputs: Vec<&'a dyn RowSource>,
    layout: ChannelLayout,
    format: Format,
}

impl<'a> RenderContext<'a> {
    /// Creates a context with no inputs, for generators.
    pub fn new(format: Format, layout: ChannelLayout) -> Self {
        Self {
            inputs: Vec::new(),
            layout,
            format,
        }
    }

    /// Creates a context whose input 0, format and layout come from `source`.
    pub fn from_source(source: &'a dyn RowSource) -> Self {
        Self::new(
            Format::new(source.width(), source.height()),
            source.layout().clone(),
        )
        .with_input(source)
    }

    /// Appends an input.
    pub fn with_input(mut self, source: &'a dyn RowSource) -> Self {
        self.inputs.push(source);
        self
    }

    /// Input sources in order.
    pub fn inputs(&self) -> &[&'a dyn RowSource] {
        &self.inputs
    }

    /// Output channel layout.
    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Output format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Checks that every input matches the output format.
    pub fn check_inputs(&self) -> OpsResult<()> {
        for (i, src) in self.inputs.iter().enumerate() {
            if src.width() != self.format.width || src.height() != self.format.height {
                return Err(OpsError::SizeMismatch(format!(
                    "input {i} is {}x{}, output is {}x{}",
                    src.width(),
                    src.height(),
                    self.format.width,
                    self.format.height
                )));
            }
        }
        Ok(())
    }
}

/// Object-safe span processor, implemented by every [`RowDriver`].
pub trait Processor: Send + Sync {
    /// Effect name.
    fn name(&self) -> &'static str;

    /// Input negotiation of the effect.
    fn channel_spec(&self) -> ChannelSpec;

    /// Abort flag checked between spans and channel groups.
    fn abort_flag(&self) -> &AbortFlag;

    /// Processes `channels` of `span` into `out`.
    fn process_span(
        &self,
        ctx: &RenderContext<'_>,
        span: PixelSpan,
        channels: ChannelSet,
        out: &mut Row,
    ) -> OpsResult<SpanOutcome>;
}

/// Drives one [`Effect`] over spans.
pub struct RowDriver<E: Effect> {
    params: Arc<E::Params>,
    spec: ChannelSpec,
    abort: AbortFlag,
}

impl<E: Effect> RowDriver<E> {
    /// Derives parameters from `settings` for an output of `format`.
    pub fn new(settings: &E::Settings, format: Format) -> OpsResult<Self> {
        let params = E::derive_params(settings, format)?;
        debug!(effect = E::NAME, ?params, "derived params");
        Ok(Self::from_params(params))
    }

    /// Wraps already derived parameters.
    pub fn from_params(params: E::Params) -> Self {
        let spec = E::required_channels(&params);
        Self {
            params: Arc::new(params),
            spec,
            abort: AbortFlag::new(),
        }
    }

    /// Shares `abort` with this driver.
    pub fn with_abort_flag(mut self, abort: AbortFlag) -> Self {
        self.abort = abort;
        self
    }

    /// Current parameter snapshot.
    pub fn params(&self) -> &Arc<E::Params> {
        &self.params
    }

    /// Input negotiation for the current parameters.
    pub fn spec(&self) -> ChannelSpec {
        self.spec
    }

    /// Abort flag shared with whoever may cancel the render.
    pub fn abort_flag(&self) -> &AbortFlag {
        &self.abort
    }

    /// Re-derives parameters after a settings change.
    ///
    /// Takes `&mut self`, so no span can be in flight while the new
    /// snapshot is published.
    pub fn update(&mut self, settings: &E::Settings, format: Format) -> OpsResult<()> {
        let params = E::derive_params(settings, format)?;
        debug!(effect = E::NAME, ?params, "re-derived params");
        self.spec = E::required_channels(&params);
        self.params = Arc::new(params);
        Ok(())
    }

    /// Processes `channels` of `span` into `out`.
    ///
    /// `out` must cover the span columns.
    pub fn process_span(
        &self,
        ctx: &RenderContext<'_>,
        span: PixelSpan,
        channels: ChannelSet,
        out: &mut Row,
    ) -> OpsResult<SpanOutcome> {
        let needed = self.spec.inputs;
        if ctx.inputs().len() < needed {
            return Err(OpsError::MissingInput {
                effect: E::NAME,
                expected: needed,
                got: ctx.inputs().len(),
            });
        }
        if out.x() > span.x || out.r() < span.r {
            return Err(OpsError::SizeMismatch(format!(
                "output row [{}, {}) does not cover span [{}, {})",
                out.x(),
                out.r(),
                span.x,
                span.r
            )));
        }
        if self.abort.is_aborted() {
            return Ok(SpanOutcome::Aborted);
        }
        if span.is_empty() {
            return Ok(SpanOutcome::Completed);
        }

        let request = self.spec.request(channels, ctx.layout());
        let sources = &ctx.inputs()[..needed];
        let rows: Vec<Row> = sources
            .iter()
            .map(|src| src.fetch_row(span.y, span.x, span.r, request))
            .collect();
        if let Some(first) = rows.first() {
            out.copy_channels(first, request);
        }

        let buffers = SpanBuffers {
            rows: &rows,
            sources,
            layout: ctx.layout(),
        };
        let outcome = E::process_span(&self.params, span, &buffers, request, out, &self.abort);
        trace!(effect = E::NAME, y = span.y, x = span.x, r = span.r, ?outcome, "span");
        Ok(outcome)
    }
}

impl<E: Effect> Clone for RowDriver<E> {
    fn clone(&self) -> Self {
        Self {
            params: Arc::clone(&self.params),
            spec: self.spec,
            abort: self.abort.clone(),
        }
    }
}

impl<E: Effect> std::fmt::Debug for RowDriver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowDriver")
            .field("effect", &E::NAME)
            .field("params", &self.params)
            .field("spec", &self.spec)
            .finish()
    }
}

impl<E: Effect> Processor for RowDriver<E> {
    fn name(&self) -> &'static str {
        E::NAME
    }

    fn channel_spec(&self) -> ChannelSpec {
        self.spec
    }

    fn abort_flag(&self) -> &AbortFlag {
        RowDriver::abort_flag(self)
    }

    fn process_span(
        &self,
        ctx: &RenderContext<'_>,
        span: PixelSpan,
        channels: ChannelSet,
        out: &mut Row,
    ) -> OpsResult<SpanOutcome> {
        RowDriver::process_span(self, ctx, span, channels, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contrast::{Contrast, ContrastSettings};
    use crate::keyer::{Keyer, KeyerSettings};
    use crate::radial::{CircularRamp, RampSettings};
    use crate::vibrance::{Vibrance, VibranceSettings};
    use pixfx_core::{Channel, Frame};

    fn layered() -> ChannelLayout {
        ChannelLayout::rgba()
            .with_layer("depth", &["z"])
            .unwrap()
    }

    fn noise_frame(width: u32, height: u32, layout: ChannelLayout, seed: u32) -> Frame {
        let mut frame = Frame::new(width, height, layout.clone()).unwrap();
        let mut state = seed;
        for ch in layout.all().iter() {
            for v in frame.plane_mut(ch).unwrap() {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                *v = (state >> 8) as f32 / (1u32 << 24) as f32;
            }
        }
        frame
    }

    #[test]
    fn passthrough_is_exact() {
        let layout = layered();
        let depth = layout.find("depth.z").unwrap();
        let frame = noise_frame(16, 2, layout, 7);
        let settings = VibranceSettings {
            vibrance: 2.5,
            ..Default::default()
        };
        let driver = RowDriver::<Vibrance>::new(&settings, frame.format()).unwrap();
        let ctx = RenderContext::from_source(&frame);

        let span = PixelSpan::full_row(1, 16);
        let mut out = Row::for_span(span);
        let outcome = driver
            .process_span(&ctx, span, ChannelSet::RGBA.with(depth), &mut out)
            .unwrap();
        assert_eq!(outcome, SpanOutcome::Completed);

        let input = frame.fetch_row(1, 0, 16, ChannelSet::RGBA.with(depth));
        assert_eq!(out.channel(depth), input.channel(depth));
        assert_eq!(out.channel(Channel::ALPHA), input.channel(Channel::ALPHA));
        assert_ne!(out.channel(Channel::RED), input.channel(Channel::RED));
    }

    #[test]
    fn request_pulls_whole_triple() {
        let frame = noise_frame(8, 1, ChannelLayout::rgba(), 3);
        let settings = VibranceSettings {
            vibrance: 0.0,
            ..Default::default()
        };
        let driver = RowDriver::<Vibrance>::new(&settings, frame.format()).unwrap();
        let ctx = RenderContext::from_source(&frame);
        let span = PixelSpan::full_row(0, 8);
        let mut out = Row::for_span(span);
        driver
            .process_span(&ctx, span, Channel::GREEN.into(), &mut out)
            .unwrap();
        assert_eq!(out.channels(), ChannelSet::RGB);
    }

    #[test]
    fn keyer_needs_two_inputs() {
        let frame = noise_frame(4, 1, ChannelLayout::rgb(), 1);
        let driver = RowDriver::<Keyer>::new(&KeyerSettings::default(), frame.format()).unwrap();
        let ctx = RenderContext::from_source(&frame);
        let span = PixelSpan::full_row(0, 4);
        let mut out = Row::for_span(span);
        let err = driver
            .process_span(&ctx, span, ChannelSet::RGB, &mut out)
            .unwrap_err();
        assert!(matches!(err, OpsError::MissingInput { expected: 2, got: 1, .. }));

        let ctx = ctx.with_input(&frame);
        assert!(driver.process_span(&ctx, span, ChannelSet::RGB, &mut out).is_ok());
    }

    #[test]
    fn aborted_driver_writes_nothing() {
        let frame = noise_frame(4, 1, ChannelLayout::rgb(), 1);
        let driver = RowDriver::<Contrast>::new(&ContrastSettings::default(), frame.format()).unwrap();
        driver.abort_flag().abort();

        let ctx = RenderContext::from_source(&frame);
        let span = PixelSpan::full_row(0, 4);
        let mut out = Row::for_span(span);
        let outcome = driver
            .process_span(&ctx, span, ChannelSet::RGB, &mut out)
            .unwrap();
        assert!(outcome.is_aborted());
        assert!(out.channels().is_empty());
    }

    #[test]
    fn out_row_must_cover_span() {
        let ctx = RenderContext::new(Format::new(8, 8), ChannelLayout::rgba());
        let driver = RowDriver::<CircularRamp>::new(&RampSettings::default(), ctx.format()).unwrap();
        let mut out = Row::new(0, 4);
        let result = driver.process_span(&ctx, PixelSpan::new(0, 2, 6), ChannelSet::RGBA, &mut out);
        assert!(matches!(result, Err(OpsError::SizeMismatch(_))));
    }

    #[test]
    fn update_publishes_new_snapshot() {
        let format = Format::new(2, 2);
        let mut driver = RowDriver::<Contrast>::new(&ContrastSettings::default(), format).unwrap();
        let before = Arc::clone(driver.params());
        let settings = ContrastSettings {
            pivot: 0.5,
            ..Default::default()
        };
        driver.update(&settings, format).unwrap();
        assert_eq!(before.pivot, 0.18);
        assert_eq!(driver.params().pivot, 0.5);

        let bad = ContrastSettings {
            pivot: 0.0,
            ..Default::default()
        };
        assert!(driver.update(&bad, format).is_err());
        assert_eq!(driver.params().pivot, 0.5);
    }

    #[test]
    fn context_checks_sizes() {
        let a = Frame::new(4, 4, ChannelLayout::rgb()).unwrap();
        let b = Frame::new(4, 3, ChannelLayout::rgb()).unwrap();
        assert!(RenderContext::from_source(&a).check_inputs().is_ok());
        let ctx = RenderContext::from_source(&a).with_input(&b);
        assert!(matches!(ctx.check_inputs(), Err(OpsError::SizeMismatch(_))));
    }
}
