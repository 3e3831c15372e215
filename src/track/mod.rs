//! Point tracking: follows the seeded barbell box through the video and records its centre.

pub mod template;

use image::RgbaImage;

use crate::{
    foundation::{
        core::{BoundingBox, TrajectoryPoint},
        error::{BarPathError, BarPathResult},
    },
    media::source::VideoSource,
};

pub use template::{TemplateTracker, TemplateTrackerOpts};

/// Single-object tracker seeded with a box on one frame and updated once per following frame.
pub trait PointTracker {
    fn init(&mut self, frame: &RgbaImage, seed: BoundingBox) -> BarPathResult<()>;
    /// Box for `frame`, or `None` when the object was not found.
    fn update(&mut self, frame: &RgbaImage) -> Option<BoundingBox>;
}

/// Seed `tracker` on the first frame of `source`, then track through the rest of the stream.
///
/// Tracked frames are numbered from 0 starting with the frame after the seed frame; frames
/// without a detection produce no point.
#[tracing::instrument(skip(source, tracker))]
pub fn track_points(
    source: &mut dyn VideoSource,
    tracker: &mut dyn PointTracker,
    seed: BoundingBox,
) -> BarPathResult<Vec<TrajectoryPoint>> {
    let first = source
        .read_frame()?
        .ok_or_else(|| BarPathError::source_unavailable("could not read the first frame"))?;
    validate_seed(seed, first.width(), first.height())?;
    tracker.init(&first, seed)?;

    let mut points = Vec::new();
    let mut frame_idx = 0u64;
    let mut misses = 0u64;
    while let Some(frame) = source.read_frame()? {
        match tracker.update(&frame) {
            Some(b) => {
                let (x, y) = b.center();
                points.push(TrajectoryPoint::new(x, y, frame_idx));
            }
            None => misses += 1,
        }
        frame_idx += 1;
    }

    tracing::info!(
        frames = frame_idx,
        points = points.len(),
        misses,
        "tracking finished"
    );
    Ok(points)
}

fn validate_seed(seed: BoundingBox, width: u32, height: u32) -> BarPathResult<()> {
    if seed.is_empty() {
        return Err(BarPathError::validation(format!(
            "seed box must have a positive size (got {}x{})",
            seed.width, seed.height
        )));
    }
    let (w, h) = (width as i64, height as i64);
    let (x0, y0) = (i64::from(seed.x), i64::from(seed.y));
    let (x1, y1) = (x0 + i64::from(seed.width), y0 + i64::from(seed.height));
    if x1 <= 0 || y1 <= 0 || x0 >= w || y0 >= h {
        return Err(BarPathError::validation(format!(
            "seed box {seed:?} lies outside the {width}x{height} frame"
        )));
    }
    Ok(())
}
