use crate::foundation::{
    core::{Fps, FrameIndex, FrameRGBA},
    error::BarPathResult,
};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Mirror every frame horizontally on output.
    pub hflip: bool,
}

/// Consumer of composited frames in output order.
///
/// `push_frame` is called with strictly increasing indices between `begin` and `end`. `abort`
/// discards whatever was produced so far.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> BarPathResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BarPathResult<()>;
    fn end(&mut self) -> BarPathResult<()>;
    fn abort(&mut self) -> BarPathResult<()> {
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> BarPathResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BarPathResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> BarPathResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) -> BarPathResult<()> {
        self.frames.clear();
        self.aborted = true;
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn begin(&mut self, cfg: SinkConfig) -> BarPathResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BarPathResult<()> {
        (**self).push_frame(idx, frame)
    }

    fn end(&mut self) -> BarPathResult<()> {
        (**self).end()
    }

    fn abort(&mut self) -> BarPathResult<()> {
        (**self).abort()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_records_lifecycle() {
        let mut sink = InMemorySink::new();
        let cfg = SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::new(30, 1).unwrap(),
            hflip: true,
        };
        sink.begin(cfg.clone()).unwrap();
        let frame = FrameRGBA {
            width: 2,
            height: 2,
            data: vec![0; 16],
            premultiplied: true,
        };
        sink.push_frame(FrameIndex(0), &frame).unwrap();
        sink.end().unwrap();

        assert_eq!(sink.config(), Some(&cfg));
        assert_eq!(sink.frames().len(), 1);
        assert!(sink.is_finished());
        assert!(!sink.is_aborted());

        sink.abort().unwrap();
        assert!(sink.frames().is_empty());
        assert!(sink.is_aborted());
    }
}
