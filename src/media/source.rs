use image::RgbaImage;

use crate::foundation::{
    core::Fps,
    error::{BarPathError, BarPathResult},
};

#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Duration of the (possibly trimmed) stream; 0 when unknown.
    pub duration_sec: f64,
}

/// A forward-only stream of decoded frames that can restart from its first frame.
///
/// `read_frame` blocks until a frame is available and returns `Ok(None)` once the stream is
/// exhausted. Frames are straight-alpha RGBA8, `info().width` x `info().height`, top-down.
pub trait VideoSource {
    fn info(&self) -> &VideoSourceInfo;
    fn read_frame(&mut self) -> BarPathResult<Option<RgbaImage>>;
    fn rewind(&mut self) -> BarPathResult<()>;
}

impl<S: VideoSource + ?Sized> VideoSource for Box<S> {
    fn info(&self) -> &VideoSourceInfo {
        (**self).info()
    }

    fn read_frame(&mut self) -> BarPathResult<Option<RgbaImage>> {
        (**self).read_frame()
    }

    fn rewind(&mut self) -> BarPathResult<()> {
        (**self).rewind()
    }
}

/// In-memory source for tests and synthetic input.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    info: VideoSourceInfo,
    frames: Vec<RgbaImage>,
    cursor: usize,
}

impl FrameSequence {
    pub fn new(frames: Vec<RgbaImage>, fps: Fps) -> BarPathResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| BarPathError::source_unavailable("frame sequence is empty"))?;
        let (width, height) = first.dimensions();
        if frames.iter().any(|f| f.dimensions() != (width, height)) {
            return Err(BarPathError::validation(
                "frame sequence frames must share one size",
            ));
        }
        Ok(Self {
            info: VideoSourceInfo {
                width,
                height,
                fps,
                duration_sec: frames.len() as f64 * fps.frame_duration_secs(),
            },
            frames,
            cursor: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl VideoSource for FrameSequence {
    fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn read_frame(&mut self) -> BarPathResult<Option<RgbaImage>> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> BarPathResult<()> {
        self.cursor = 0;
        Ok(())
    }
}
