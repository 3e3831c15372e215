use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    compositor::context::CompositorContext,
    encode::sink::{FrameSink, SinkConfig},
    foundation::{
        core::{FrameIndex, FrameRGBA},
        error::{BarPathError, BarPathResult},
    },
    media::source::VideoSource,
};

/// Cooperative cancellation flag, checked once per rendered frame.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Receives every composited frame, including those shown after the output was finalized.
pub trait PreviewSink {
    fn show(&mut self, frame: &FrameRGBA) -> BarPathResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Frames written to the sink.
    pub frames_encoded: u64,
    /// Frames composited in total, preview replays included.
    pub frames_composited: u64,
}

/// Drive the compositor over the whole source once, streaming frames into `sink`.
///
/// The seed frame is skipped so frame indices line up with the tracker's numbering. When the
/// source runs out the sink is finalized; with a preview attached the source then loops until
/// `stop` is raised. Stopping before the sink was finalized aborts it and fails with
/// [`BarPathError::Cancelled`]. Any other error also aborts an unfinished sink.
#[tracing::instrument(skip_all)]
pub fn render_video(
    ctx: &mut CompositorContext,
    source: &mut dyn VideoSource,
    sink: &mut dyn FrameSink,
    preview: Option<&mut dyn PreviewSink>,
    stop: &StopSignal,
) -> BarPathResult<RenderOutcome> {
    let mut finalized = false;
    let result = render_loop(ctx, source, sink, preview, stop, &mut finalized);
    if result.is_err()
        && !finalized
        && let Err(e) = sink.abort()
    {
        tracing::warn!(error = %e, "failed to abort sink");
    }
    result
}

fn render_loop(
    ctx: &mut CompositorContext,
    source: &mut dyn VideoSource,
    sink: &mut dyn FrameSink,
    mut preview: Option<&mut dyn PreviewSink>,
    stop: &StopSignal,
    finalized: &mut bool,
) -> BarPathResult<RenderOutcome> {
    skip_seed_frame(source)?;

    let size = ctx.layout().window_size;
    sink.begin(SinkConfig {
        width: size,
        height: size,
        fps: source.info().fps,
        hflip: ctx.is_mirrored(),
    })?;

    let mut outcome = RenderOutcome::default();
    let mut frame_idx = 0u64;
    loop {
        if stop.is_stopped() {
            if *finalized {
                break;
            }
            tracing::warn!(frames = outcome.frames_encoded, "render cancelled");
            return Err(BarPathError::Cancelled);
        }

        let frame = match source.read_frame()? {
            Some(f) => f,
            None => {
                if !*finalized {
                    sink.end()?;
                    *finalized = true;
                    tracing::info!(frames = outcome.frames_encoded, "output finalized");
                }
                if preview.is_none() {
                    break;
                }
                skip_seed_frame(source)?;
                frame_idx = 0;
                match source.read_frame()? {
                    Some(f) => f,
                    None => break,
                }
            }
        };

        let recording = !*finalized;
        let composed = ctx.compose(frame_idx, &frame, recording)?;
        outcome.frames_composited += 1;
        if let Some(p) = preview.as_deref_mut() {
            p.show(&composed)?;
        }
        if recording {
            sink.push_frame(FrameIndex(outcome.frames_encoded), &composed)?;
            outcome.frames_encoded += 1;
        }
        frame_idx += 1;
    }

    Ok(outcome)
}

/// Rewind and consume the seed frame, so the next read is tracked frame 0.
fn skip_seed_frame(source: &mut dyn VideoSource) -> BarPathResult<()> {
    source.rewind()?;
    source
        .read_frame()?
        .ok_or_else(|| BarPathError::source_unavailable("could not read the first frame"))?;
    Ok(())
}
