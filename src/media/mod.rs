//! Video input: the `VideoSource` contract, an `ffmpeg` decoder and an in-memory source.

pub mod ffmpeg;
pub mod source;

pub use ffmpeg::{FfmpegVideoSource, TrimWindow, probe_video};
pub use source::{FrameSequence, VideoSource, VideoSourceInfo};
