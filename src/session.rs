//! Upload session metadata: which part of a recording to analyze and where the barbell starts.

use std::path::{Path, PathBuf};

use crate::{
    foundation::{
        core::BoundingBox,
        error::{BarPathError, BarPathResult},
    },
    media::ffmpeg::TrimWindow,
};

/// Seed rectangle as picked on screen, in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BarbellArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BarbellArea {
    /// Rounded to whole pixels; the rounded box must keep a positive size.
    pub fn to_bbox(&self) -> BarPathResult<BoundingBox> {
        let fields = [self.x, self.y, self.width, self.height];
        if fields.iter().any(|v| !v.is_finite() || v.abs() > f64::from(i32::MAX)) {
            return Err(BarPathError::validation(format!(
                "barbell area has non-finite or out-of-range fields: {self:?}"
            )));
        }
        let b = BoundingBox::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as i32,
            self.height.round() as i32,
        );
        if b.is_empty() {
            return Err(BarPathError::validation(format!(
                "barbell area {self:?} is empty"
            )));
        }
        Ok(b)
    }
}

/// Sidecar JSON describing one uploaded recording. Unknown keys are ignored.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionMetadata {
    /// Seconds from the start of the recording.
    pub start_time: f64,
    pub end_time: f64,
    pub barbell_area: BarbellArea,
    /// Path of the recording, relative paths resolved against the metadata file's directory.
    pub video_url: String,
}

impl SessionMetadata {
    pub fn from_json_str(text: &str) -> BarPathResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| BarPathError::validation(format!("session json parse failed: {e}")))
    }

    pub fn from_json_path(path: &Path) -> BarPathResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read session metadata '{}'", path.display()))?;
        let mut md = Self::from_json_str(&text)?;
        let video = Path::new(&md.video_url);
        if video.is_relative()
            && let Some(dir) = path.parent()
        {
            md.video_url = dir.join(video).to_string_lossy().into_owned();
        }
        Ok(md)
    }

    pub fn trim_window(&self) -> BarPathResult<TrimWindow> {
        TrimWindow::new(self.start_time, Some(self.end_time))
    }

    pub fn seed_bbox(&self) -> BarPathResult<BoundingBox> {
        self.barbell_area.to_bbox()
    }

    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.video_url)
    }
}

/// `<dir>/<stem>-annotated.mp4` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "barpath".to_owned());
    input.with_file_name(format!("{stem}-annotated.mp4"))
}
