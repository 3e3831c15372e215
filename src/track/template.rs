use image::{GrayImage, RgbaImage};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};

use crate::{
    foundation::{
        core::BoundingBox,
        error::{BarPathError, BarPathResult},
    },
    track::PointTracker,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TemplateTrackerOpts {
    /// How far, in pixels, the box may move between consecutive frames.
    pub search_radius: u32,
    /// Best-match root-mean-square luma difference above which the frame counts as a miss.
    pub max_rms_diff: f64,
}

impl Default for TemplateTrackerOpts {
    fn default() -> Self {
        Self {
            search_radius: 24,
            max_rms_diff: 48.0,
        }
    }
}

/// Luma template matcher: finds the seed patch again by minimum sum of squared differences
/// within a window around the last position.
#[derive(Debug)]
pub struct TemplateTracker {
    opts: TemplateTrackerOpts,
    template: GrayImage,
    last: Option<BoundingBox>,
}

impl TemplateTracker {
    pub fn new(opts: TemplateTrackerOpts) -> Self {
        Self {
            opts,
            template: GrayImage::new(0, 0),
            last: None,
        }
    }
}

impl Default for TemplateTracker {
    fn default() -> Self {
        Self::new(TemplateTrackerOpts::default())
    }
}

/// Intersect `b` with a `width`x`height` frame.
fn clamp_box(b: BoundingBox, width: u32, height: u32) -> Option<BoundingBox> {
    let x0 = b.x.max(0);
    let y0 = b.y.max(0);
    let x1 = (b.x + b.width).min(width as i32);
    let y1 = (b.y + b.height).min(height as i32);
    (x1 > x0 && y1 > y0).then(|| BoundingBox::new(x0, y0, x1 - x0, y1 - y0))
}

fn luma_crop(frame: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    let patch = image::imageops::crop_imm(frame, x, y, width, height).to_image();
    image::imageops::grayscale(&patch)
}

impl PointTracker for TemplateTracker {
    fn init(&mut self, frame: &RgbaImage, seed: BoundingBox) -> BarPathResult<()> {
        let b = clamp_box(seed, frame.width(), frame.height()).ok_or_else(|| {
            BarPathError::validation(format!("seed box {seed:?} does not overlap the frame"))
        })?;
        self.template = luma_crop(
            frame,
            b.x as u32,
            b.y as u32,
            b.width as u32,
            b.height as u32,
        );
        self.last = Some(b);
        tracing::debug!(?b, "template tracker seeded");
        Ok(())
    }

    fn update(&mut self, frame: &RgbaImage) -> Option<BoundingBox> {
        let last = self.last?;
        let (tw, th) = self.template.dimensions();
        if tw == 0 || th == 0 || tw > frame.width() || th > frame.height() {
            return None;
        }

        // Candidate top-left corners, clamped so the template stays inside the frame.
        let r = i64::from(self.opts.search_radius);
        let max_x = i64::from(frame.width() - tw);
        let max_y = i64::from(frame.height() - th);
        let x0 = (i64::from(last.x) - r).clamp(0, max_x) as u32;
        let y0 = (i64::from(last.y) - r).clamp(0, max_y) as u32;
        let x1 = (i64::from(last.x) + r).clamp(0, max_x) as u32;
        let y1 = (i64::from(last.y) + r).clamp(0, max_y) as u32;

        let window = luma_crop(frame, x0, y0, x1 - x0 + tw, y1 - y0 + th);
        let scores = match_template(
            &window,
            &self.template,
            MatchTemplateMethod::SumOfSquaredErrors,
        );
        let best = find_extremes(&scores);

        let rms = (f64::from(best.min_value).max(0.0) / f64::from(tw * th)).sqrt();
        if rms > self.opts.max_rms_diff {
            tracing::trace!(rms, "template match below threshold");
            return None;
        }
        let (dx, dy) = best.min_value_location;
        let found = BoundingBox::new((x0 + dx) as i32, (y0 + dy) as i32, tw as i32, th as i32);
        self.last = Some(found);
        Some(found)
    }
}
