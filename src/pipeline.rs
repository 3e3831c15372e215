use std::path::Path;

use crate::{
    analysis::{
        aggregate::{DeviationReport, aggregate_deviation},
        geometry::{CanvasLayout, ReferencePath},
        scan::measure_distances,
        segment::{Extrema, Orientation, SegmentedTrajectory, segment_trajectory},
    },
    compositor::{
        context::CompositorContext,
        run::{PreviewSink, RenderOutcome, StopSignal, render_video},
    },
    config::AnalysisConfig,
    encode::{
        ffmpeg::{FfmpegSink, FfmpegSinkOpts},
        sink::FrameSink,
    },
    foundation::{
        core::{BoundingBox, DeviationBucket, TrajectoryPoint},
        error::{BarPathError, BarPathResult},
    },
    media::{
        ffmpeg::{FfmpegVideoSource, TrimWindow},
        source::VideoSource,
    },
    render::raster::{ReferenceLayers, rasterize_reference},
    track::{PointTracker, TemplateTracker, TemplateTrackerOpts, track_points},
};

/// Path reported by a failed run.
pub const FAILED_PATH: &str = "Failed";
/// Longest output path, in bytes, echoed back in a result.
pub const MAX_OUTPUT_PATH_BYTES: usize = 255;

/// Outcome of one run, as reported to callers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProcessedVideoResult {
    pub succeeded: bool,
    /// ascent-start, ascent-middle, ascent-end, descent-start, descent-middle, descent-end.
    pub averages: [f64; 6],
    pub output_path: String,
}

impl ProcessedVideoResult {
    pub fn failed() -> Self {
        Self {
            succeeded: false,
            averages: [0.0; 6],
            output_path: FAILED_PATH.to_owned(),
        }
    }

    pub fn success(report: &DeviationReport, output_path: &Path) -> Self {
        Self {
            succeeded: true,
            averages: report.as_array(),
            output_path: bounded_path(&output_path.to_string_lossy()),
        }
    }

    pub fn average(&self, bucket: DeviationBucket) -> f64 {
        self.averages[bucket.index()]
    }
}

fn bounded_path(s: &str) -> String {
    if s.len() <= MAX_OUTPUT_PATH_BYTES {
        return s.to_owned();
    }
    let mut end = MAX_OUTPUT_PATH_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_owned()
}

/// Everything derived from a tracked trajectory before any video is rendered.
#[derive(Debug)]
pub struct TrajectoryAnalysis {
    /// Segmented trajectory in template orientation.
    pub trajectory: SegmentedTrajectory,
    pub orientation: Orientation,
    pub layout: CanvasLayout,
    pub path: ReferencePath,
    pub layers: ReferenceLayers,
    pub report: DeviationReport,
}

/// Reject trajectories whose extents are too small or too far from square.
pub fn check_trajectory_bounds(extrema: &Extrema, cfg: &AnalysisConfig) -> BarPathResult<()> {
    let raw = extrema.vertical_extent();
    let height = f64::from(raw + raw.rem_euclid(2));
    let width = f64::from(extrema.horizontal_extent());
    let ratio = cfg.max_aspect_ratio;
    let min = f64::from(cfg.min_extent_px);

    if height > width * ratio || width > height * ratio {
        return Err(BarPathError::trajectory_rejected(format!(
            "trajectory is {width}x{height} px, aspect ratio outside 1/{ratio}..{ratio}"
        )));
    }
    if width < min || height < min {
        return Err(BarPathError::trajectory_rejected(format!(
            "trajectory is {width}x{height} px, smaller than {min} px"
        )));
    }
    Ok(())
}

/// Segment, normalise, fit, rasterize and measure a tracked trajectory.
///
/// `frame_width` is the source width, used to mirror trajectories that descend toward +x.
#[tracing::instrument(skip(points, cfg), fields(points = points.len()))]
pub fn analyze_trajectory(
    points: &[TrajectoryPoint],
    frame_width: u32,
    cfg: &AnalysisConfig,
) -> BarPathResult<TrajectoryAnalysis> {
    cfg.validate()?;
    if points.is_empty() {
        return Err(BarPathError::trajectory_rejected(
            "the tracker produced no points",
        ));
    }

    let (trajectory, orientation) = segment_trajectory(points)?.normalized(frame_width);
    tracing::info!(
        descent = trajectory.descent.len(),
        ascent = trajectory.ascent.len(),
        ?orientation,
        "trajectory segmented"
    );
    if let Err(e) = check_trajectory_bounds(&trajectory.extrema, cfg) {
        tracing::warn!(error = %e, "trajectory rejected");
        return Err(e);
    }

    let layout = CanvasLayout::new(&trajectory.extrema, cfg)?;
    let path = ReferencePath::fit(&cfg.template, &layout)?;
    let layers = rasterize_reference(&path, &layout, &cfg.style)?;

    let descent = measure_distances(&layers.descent.read_back(), &trajectory.descent, &layout);
    let ascent = measure_distances(&layers.ascent.read_back(), &trajectory.ascent, &layout);
    let report = aggregate_deviation(&ascent, &descent, &path, &layout, cfg.outlier_sigma)?;
    tracing::info!(averages = ?report.as_array(), "deviation measured");

    Ok(TrajectoryAnalysis {
        trajectory,
        orientation,
        layout,
        path,
        layers,
        report,
    })
}

/// Result of a complete run against explicit collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineOutput {
    pub report: DeviationReport,
    pub orientation: Orientation,
    pub tracked_points: usize,
    pub render: RenderOutcome,
}

/// Track, analyze and render against caller-supplied collaborators.
pub struct BarPathRun<'a> {
    pub source: &'a mut dyn VideoSource,
    pub tracker: &'a mut dyn PointTracker,
    pub sink: &'a mut dyn FrameSink,
    pub preview: Option<&'a mut dyn PreviewSink>,
    pub stop: StopSignal,
}

impl BarPathRun<'_> {
    #[tracing::instrument(skip(self, cfg))]
    pub fn run(self, seed: BoundingBox, cfg: &AnalysisConfig) -> BarPathResult<PipelineOutput> {
        let frame_width = self.source.info().width;
        let points = track_points(self.source, self.tracker, seed)?;
        let tracked_points = points.len();

        let analysis = analyze_trajectory(&points, frame_width, cfg)?;
        let TrajectoryAnalysis {
            trajectory,
            orientation,
            layout,
            layers,
            report,
            ..
        } = analysis;

        let mut ctx = CompositorContext::new(
            layout,
            layers,
            &trajectory.descent,
            &trajectory.ascent,
            cfg.style.clone(),
            orientation.is_mirrored(),
        )?;
        let render = render_video(&mut ctx, self.source, self.sink, self.preview, &self.stop)?;

        Ok(PipelineOutput {
            report,
            orientation,
            tracked_points,
            render,
        })
    }
}

/// Options for [`process_bar_path_with`].
#[derive(Clone, Debug, Default)]
pub struct ProcessOptions {
    pub config: AnalysisConfig,
    pub trim: TrimWindow,
    pub tracker: TemplateTrackerOpts,
    pub stop: StopSignal,
}

/// Analyze `input` with the default configuration and write the annotated video to `output`.
pub fn process_bar_path(input: &Path, output: &Path, seed: BoundingBox) -> ProcessedVideoResult {
    process_bar_path_with(input, output, seed, &ProcessOptions::default())
}

/// [`process_bar_path`] with explicit options. Any failure yields
/// [`ProcessedVideoResult::failed`]; a partially encoded output is removed.
#[tracing::instrument(skip(opts), fields(input = %input.display(), output = %output.display()))]
pub fn process_bar_path_with(
    input: &Path,
    output: &Path,
    seed: BoundingBox,
    opts: &ProcessOptions,
) -> ProcessedVideoResult {
    let preexisting = output.exists();
    match try_process(input, output, seed, opts) {
        Ok(out) => {
            tracing::info!(
                points = out.tracked_points,
                frames = out.render.frames_encoded,
                "bar path processed"
            );
            ProcessedVideoResult::success(&out.report, output)
        }
        Err(e) => {
            tracing::error!(error = %e, "bar path processing failed");
            if !preexisting
                && output.exists()
                && let Err(rm) = std::fs::remove_file(output)
            {
                tracing::warn!(error = %rm, "could not remove partial output");
            }
            ProcessedVideoResult::failed()
        }
    }
}

fn try_process(
    input: &Path,
    output: &Path,
    seed: BoundingBox,
    opts: &ProcessOptions,
) -> BarPathResult<PipelineOutput> {
    let mut source = FfmpegVideoSource::open(input, opts.trim)?;
    let mut tracker = TemplateTracker::new(opts.tracker);
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(output));
    BarPathRun {
        source: &mut source,
        tracker: &mut tracker,
        sink: &mut sink,
        preview: None,
        stop: opts.stop.clone(),
    }
    .run(seed, &opts.config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<TrajectoryPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| TrajectoryPoint::new(x, y, i as u64))
            .collect()
    }

    #[test]
    fn failed_result_is_the_sentinel() {
        let r = ProcessedVideoResult::failed();
        assert!(!r.succeeded);
        assert_eq!(r.averages, [0.0; 6]);
        assert_eq!(r.output_path, "Failed");
    }

    #[test]
    fn output_path_is_bounded_on_a_char_boundary() {
        let long = format!("/tmp/{}", "é".repeat(200));
        let r = ProcessedVideoResult::success(&DeviationReport([1.0; 6]), Path::new(&long));
        assert!(r.output_path.len() <= MAX_OUTPUT_PATH_BYTES);
        assert!(long.starts_with(&r.output_path));
        assert_eq!(r.average(DeviationBucket::DescentEnd), 1.0);

        let short = ProcessedVideoResult::success(&DeviationReport([0.0; 6]), Path::new("a.mp4"));
        assert_eq!(short.output_path, "a.mp4");
    }

    #[test]
    fn bounds_reject_narrow_and_tiny_paths() {
        let cfg = AnalysisConfig::default();
        let narrow = Extrema::of(&pts(&[(100, 0), (90, 200)])).unwrap();
        assert!(matches!(
            check_trajectory_bounds(&narrow, &cfg),
            Err(BarPathError::TrajectoryRejected(_))
        ));
        let wide = Extrema::of(&pts(&[(300, 0), (90, 100)])).unwrap();
        assert!(check_trajectory_bounds(&wide, &cfg).is_err());
        let tiny = Extrema::of(&pts(&[(20, 0), (0, 20)])).unwrap();
        assert!(check_trajectory_bounds(&tiny, &cfg).is_err());
        let ok = Extrema::of(&pts(&[(150, 0), (50, 120)])).unwrap();
        check_trajectory_bounds(&ok, &cfg).unwrap();
    }

    #[test]
    fn empty_trajectory_is_rejected() {
        let err = analyze_trajectory(&[], 640, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, BarPathError::TrajectoryRejected(_)));
    }

    #[test]
    fn missing_input_fails_cleanly() {
        let out = std::env::temp_dir().join("barpath-missing-input-test.mp4");
        let r = process_bar_path(
            Path::new("/no/such/barpath/input.mp4"),
            &out,
            BoundingBox::new(0, 0, 10, 10),
        );
        assert_eq!(r, ProcessedVideoResult::failed());
        assert!(!out.exists());
    }
}
