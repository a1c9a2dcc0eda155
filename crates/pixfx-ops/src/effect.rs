//! The [`Effect`] trait and the buffers passed to span processing.
//!
//! Every kernel in this crate is a unit struct implementing [`Effect`]:
//!
//! 1. [`Effect::derive_params`] turns user settings into an immutable
//!    params snapshot, validating ranges once.
//! 2. [`Effect::required_channels`] declares how many inputs the kernel
//!    reads and whether requested channels grow to full color triples.
//! 3. [`Effect::process_span`] computes one [`PixelSpan`] of output.
//!
//! The [`RowDriver`](crate::RowDriver) wires these together.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pixfx_core::{Channel, ChannelLayout, ChannelSet, Color3, Format, PixelSpan, Row, RowSource};
use serde::de::DeserializeOwned;

use crate::OpsResult;

/// A pixel kernel with its settings and derived parameters.
pub trait Effect: Send + Sync + 'static {
    /// Registry name.
    const NAME: &'static str;

    /// User-facing settings, deserialized from presets.
    type Settings: DeserializeOwned + Default + Debug + Send + Sync;

    /// Immutable snapshot derived from the settings.
    type Params: Debug + Send + Sync;

    /// Validates `settings` and computes cached constants.
    fn derive_params(settings: &Self::Settings, format: Format) -> OpsResult<Self::Params>;

    /// Inputs and channels the kernel needs.
    fn required_channels(params: &Self::Params) -> ChannelSpec;

    /// Writes `channels` of `span` into `out`.
    ///
    /// On entry `out` already holds a copy of input 0 for every requested
    /// channel, so channels the kernel leaves alone pass through.
    fn process_span(
        params: &Self::Params,
        span: PixelSpan,
        inputs: &SpanBuffers<'_>,
        channels: ChannelSet,
        out: &mut Row,
        abort: &AbortFlag,
    ) -> SpanOutcome;
}

/// Input negotiation for one effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Number of input images read per span.
    pub inputs: usize,
    /// Whether a requested channel pulls in its whole color triple.
    pub expand_triples: bool,
}

impl ChannelSpec {
    /// Generators: no inputs.
    pub const GENERATOR: Self = Self {
        inputs: 0,
        expand_triples: false,
    };

    /// One input, channels processed independently.
    pub const PER_CHANNEL: Self = Self {
        inputs: 1,
        expand_triples: false,
    };

    /// Creates a spec reading `inputs` images with triple expansion.
    pub const fn triples(inputs: usize) -> Self {
        Self {
            inputs,
            expand_triples: true,
        }
    }

    /// Channels to fetch from the inputs for a request of `channels`.
    pub fn request(&self, channels: ChannelSet, layout: &ChannelLayout) -> ChannelSet {
        let channels = channels & layout.all();
        if self.expand_triples {
            layout.add_brothers(channels)
        } else {
            channels
        }
    }
}

/// Input rows and sources for one span.
pub struct SpanBuffers<'a> {
    /// Row `span.y` of each input, covering the span columns.
    pub rows: &'a [Row],
    /// The inputs themselves, for kernels that need other rows.
    pub sources: &'a [&'a dyn RowSource],
    /// Channel layout shared by the inputs and the output.
    pub layout: &'a ChannelLayout,
}

impl SpanBuffers<'_> {
    /// Row of input `index`, if the effect reads that many inputs.
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }
}

/// How a span call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOutcome {
    /// Every pixel was written.
    Completed,
    /// The abort flag was raised; the span is partially written.
    Aborted,
}

impl SpanOutcome {
    /// Returns `true` for [`SpanOutcome::Aborted`].
    #[inline]
    pub fn is_aborted(self) -> bool {
        self == Self::Aborted
    }
}

/// Cooperative cancellation shared between a render and its caller.
///
/// Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    /// Creates a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Lowers the flag so the next render can run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Returns `true` once [`abort`](Self::abort) was called.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reads a color triple of `row` over the span columns.
pub(crate) fn read_triple(row: &Row, triple: [Channel; 3], span: PixelSpan) -> Vec<Color3> {
    let [r, g, b] = triple.map(|ch| row.channel_span(ch, span.x, span.r));
    r.iter()
        .zip(g)
        .zip(b)
        .map(|((&r, &g), &b)| Color3::new(r, g, b))
        .collect()
}

/// Writes `values` into a color triple of `out` over the span columns.
pub(crate) fn write_triple(out: &mut Row, triple: [Channel; 3], span: PixelSpan, values: &[Color3]) {
    for (i, ch) in triple.into_iter().enumerate() {
        let dst = out.writable_span(ch, span.x, span.r);
        for (d, c) in dst.iter_mut().zip(values) {
            *d = c[i];
        }
    }
}
