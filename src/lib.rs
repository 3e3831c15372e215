//! Bench-press bar path analysis.
//!
//! A tracked barbell trajectory is split into descent and ascent, compared against a reference
//! path fitted to the rep's size, and summarised as six lateral deviation percentages. The same
//! run renders an annotated overlay video:
//!
//! - [`process_bar_path`] runs the whole thing against a video file using `ffmpeg`
//! - [`analyze_trajectory`] covers the measurement half for an already tracked trajectory
//! - [`BarPathRun`] drives tracking and rendering against caller-supplied sources and sinks
#![forbid(unsafe_code)]

pub mod analysis;
pub mod compositor;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod media;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod track;

pub use crate::analysis::{DeviationReport, Orientation};
pub use crate::compositor::{PreviewSink, StopSignal};
pub use crate::config::{AnalysisConfig, BenchTemplate, OverlayStyle};
pub use crate::encode::{FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig};
pub use crate::foundation::core::{
    BoundingBox, DeviationBucket, Fps, FrameIndex, FrameRGBA, Phase, Point, TrajectoryPoint,
};
pub use crate::foundation::error::{BarPathError, BarPathResult};
pub use crate::media::{FfmpegVideoSource, FrameSequence, TrimWindow, VideoSource};
pub use crate::pipeline::{
    BarPathRun, ProcessOptions, ProcessedVideoResult, TrajectoryAnalysis, analyze_trajectory,
    process_bar_path, process_bar_path_with,
};
pub use crate::session::SessionMetadata;
pub use crate::track::{PointTracker, TemplateTracker, TemplateTrackerOpts};
