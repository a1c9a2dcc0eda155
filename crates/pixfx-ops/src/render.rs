//! Whole-frame rendering over a [`Processor`].
//!
//! Rows are independent, so with the `parallel` feature (default) they are
//! processed concurrently with Rayon; without it they run in order. Both
//! paths produce identical frames.

use pixfx_core::{ChannelSet, Frame, PixelSpan, Row};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{OpsResult, Processor, RenderContext, SpanOutcome};

/// Result of [`render_frame`].
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// Output frame; rows that were never processed are black.
    pub frame: Frame,
    /// Number of rows fully written.
    pub rows_completed: usize,
    /// Whether the render stopped early.
    pub aborted: bool,
}

/// Renders `channels` of every row of the context format.
///
/// Inputs must match the context format. If the processor's abort flag
/// is raised mid-render, rows already written are kept and the report is
/// marked aborted.
pub fn render_frame(
    processor: &dyn Processor,
    ctx: &RenderContext<'_>,
    channels: ChannelSet,
) -> OpsResult<RenderReport> {
    ctx.check_inputs()?;
    let format = ctx.format();
    let request = processor.channel_spec().request(channels, ctx.layout());
    debug!(
        effect = processor.name(),
        width = format.width,
        height = format.height,
        channels = request.len(),
        "render start"
    );

    let render_row = |y: u32| -> OpsResult<Option<(Row, SpanOutcome)>> {
        if processor.abort_flag().is_aborted() {
            return Ok(None);
        }
        let span = PixelSpan::full_row(y as i32, format.width);
        let mut row = Row::for_span(span);
        let outcome = processor.process_span(ctx, span, request, &mut row)?;
        Ok(Some((row, outcome)))
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Option<(Row, SpanOutcome)>> = (0..format.height)
        .into_par_iter()
        .map(render_row)
        .collect::<OpsResult<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Option<(Row, SpanOutcome)>> = (0..format.height)
        .map(render_row)
        .collect::<OpsResult<_>>()?;

    let mut frame = Frame::new(format.width, format.height, ctx.layout().clone())?;
    let mut rows_completed = 0;
    for (y, (row, outcome)) in rows
        .into_iter()
        .enumerate()
        .filter_map(|(y, r)| r.map(|r| (y, r)))
    {
        frame.write_row(y as i32, &row, request);
        if outcome == SpanOutcome::Completed {
            rows_completed += 1;
        }
    }

    let aborted = rows_completed < format.height as usize;
    if aborted {
        warn!(
            effect = processor.name(),
            rows_completed,
            height = format.height,
            "render aborted"
        );
    } else {
        debug!(effect = processor.name(), rows_completed, "render finished");
    }

    Ok(RenderReport {
        frame,
        rows_completed,
        aborted,
    })
}
