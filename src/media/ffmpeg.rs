use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
};

use image::RgbaImage;

use crate::{
    foundation::{
        core::Fps,
        error::{BarPathError, BarPathResult},
    },
    media::source::{VideoSource, VideoSourceInfo},
};

/// Portion of the input to analyze, in seconds from the start of the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrimWindow {
    pub start_sec: f64,
    pub end_sec: Option<f64>,
}

impl TrimWindow {
    pub fn new(start_sec: f64, end_sec: Option<f64>) -> BarPathResult<Self> {
        let w = Self { start_sec, end_sec };
        w.validate()?;
        Ok(w)
    }

    pub fn validate(&self) -> BarPathResult<()> {
        if !(self.start_sec.is_finite() && self.start_sec >= 0.0) {
            return Err(BarPathError::validation(format!(
                "trim start must be a non-negative number (got {})",
                self.start_sec
            )));
        }
        if let Some(end) = self.end_sec
            && !(end.is_finite() && end > self.start_sec)
        {
            return Err(BarPathError::validation(format!(
                "trim end ({end}) must be after trim start ({})",
                self.start_sec
            )));
        }
        Ok(())
    }

    pub fn duration_sec(&self) -> Option<f64> {
        self.end_sec.map(|end| end - self.start_sec)
    }

    pub fn is_full(&self) -> bool {
        self.start_sec == 0.0 && self.end_sec.is_none()
    }
}

/// Stream metadata from `ffprobe`, dimensions as decoded (display rotation applied).
pub fn probe_video(source_path: &Path) -> BarPathResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeSideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeTags {
        rotate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        tags: Option<ProbeTags>,
        #[serde(default)]
        side_data_list: Vec<ProbeSideData>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| BarPathError::source_unavailable(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BarPathError::source_unavailable(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| BarPathError::evaluation(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| BarPathError::source_unavailable("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| BarPathError::source_unavailable("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| BarPathError::source_unavailable("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| BarPathError::source_unavailable("invalid video r_frame_rate"))?;
    let fps = Fps::new(fps_num, fps_den)?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let rotation = video_stream
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .or_else(|| {
            video_stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.parse::<f64>().ok())
        })
        .unwrap_or(0.0);
    let (width, height) = if is_quarter_turn(rotation) {
        (height, width)
    } else {
        (width, height)
    };

    Ok(VideoSourceInfo {
        width,
        height,
        fps,
        duration_sec,
    })
}

fn is_quarter_turn(degrees: f64) -> bool {
    let d = degrees.rem_euclid(180.0);
    (d - 90.0).abs() < 1.0
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

/// Decodes a video file frame by frame through an `ffmpeg` rawvideo pipe.
pub struct FfmpegVideoSource {
    path: PathBuf,
    trim: TrimWindow,
    info: VideoSourceInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegVideoSource {
    #[tracing::instrument(skip(trim))]
    pub fn open(path: &Path, trim: TrimWindow) -> BarPathResult<Self> {
        trim.validate()?;
        if !path.is_file() {
            return Err(BarPathError::source_unavailable(format!(
                "input video '{}' does not exist",
                path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(BarPathError::source_unavailable(
                "ffmpeg is required for video decoding, but was not found on PATH",
            ));
        }

        let mut info = probe_video(path)?;
        if info.width == 0 || info.height == 0 {
            return Err(BarPathError::source_unavailable(
                "video has zero width or height",
            ));
        }
        let remaining = (info.duration_sec - trim.start_sec).max(0.0);
        info.duration_sec = trim.duration_sec().map_or(remaining, |d| d.min(remaining));

        let mut source = Self {
            path: path.to_path_buf(),
            trim,
            info,
            child: None,
            stdout: None,
            stderr_drain: None,
        };
        source.spawn()?;
        tracing::info!(
            width = source.info.width,
            height = source.info.height,
            fps = source.info.fps.as_f64(),
            "opened video source"
        );
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spawn(&mut self) -> BarPathResult<()> {
        self.kill();

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args(["-v", "error"]);
        if self.trim.start_sec > 0.0 {
            cmd.args(["-ss", &format!("{:.6}", self.trim.start_sec)]);
        }
        cmd.arg("-i").arg(&self.path);
        if let Some(d) = self.trim.duration_sec() {
            cmd.args(["-t", &format!("{d:.6}")]);
        }
        cmd.args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"]);

        let mut child = cmd.spawn().map_err(|e| {
            BarPathError::source_unavailable(format!("failed to spawn ffmpeg decoder: {e}"))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BarPathError::evaluation("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| BarPathError::evaluation("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdout = Some(stdout);
        self.stderr_drain = Some(stderr_drain);
        Ok(())
    }

    fn frame_len(&self) -> usize {
        self.info.width as usize * self.info.height as usize * 4
    }

    /// Wait for the decoder after its stream ended and surface a failure exit.
    fn finish(&mut self) -> BarPathResult<()> {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|e| {
            BarPathError::evaluation(format!("failed to wait for ffmpeg decoder: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| BarPathError::evaluation("ffmpeg stderr drain thread panicked"))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if !status.success() {
            return Err(BarPathError::source_unavailable(format!(
                "ffmpeg decoder exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }

    fn kill(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

impl VideoSource for FfmpegVideoSource {
    fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn read_frame(&mut self) -> BarPathResult<Option<RgbaImage>> {
        let len = self.frame_len();
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = stdout.read(&mut buf[filled..]).map_err(|e| {
                BarPathError::source_unavailable(format!("failed to read decoded frame: {e}"))
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled < len {
            if filled > 0 {
                tracing::warn!(bytes = filled, expected = len, "dropping truncated final frame");
            }
            self.finish()?;
            return Ok(None);
        }

        RgbaImage::from_raw(self.info.width, self.info.height, buf)
            .map(Some)
            .ok_or_else(|| BarPathError::evaluation("decoded frame buffer has the wrong size"))
    }

    fn rewind(&mut self) -> BarPathResult<()> {
        tracing::debug!(path = %self.path.display(), "rewinding video source");
        self.spawn()
    }
}

impl Drop for FfmpegVideoSource {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}

fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
