mod common;

use std::{path::Path, process::Command};

use barpath::{
    FfmpegSink, FfmpegSinkOpts, FfmpegVideoSource, Fps, FrameIndex, FrameRGBA, FrameSink,
    SinkConfig, TrimWindow, VideoSource, media::probe_video, process_bar_path,
};

fn ffmpeg_tools_available() -> bool {
    barpath::media::ffmpeg::is_ffmpeg_on_path() && barpath::media::ffmpeg::is_ffprobe_on_path()
}

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::path::PathBuf::from("target").join("media_ffmpeg").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn synth_testsrc(path: &Path, seconds: u32) -> anyhow::Result<()> {
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x48:rate=10",
            "-t",
            &seconds.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-c:v",
            "libx264",
        ])
        .arg(path)
        .status()?;
    anyhow::ensure!(status.success(), "ffmpeg failed creating {}", path.display());
    Ok(())
}

fn count_frames(source: &mut FfmpegVideoSource) -> usize {
    let mut n = 0;
    while let Some(frame) = source.read_frame().unwrap() {
        assert_eq!(frame.dimensions(), (64, 48));
        n += 1;
    }
    n
}

#[test]
fn decodes_rewinds_and_trims() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }
    let dir = scratch_dir("decode");
    let clip = dir.join("testsrc.mp4");
    synth_testsrc(&clip, 2).unwrap();

    let info = probe_video(&clip).unwrap();
    assert_eq!((info.width, info.height), (64, 48));
    assert_eq!(info.fps, Fps::new(10, 1).unwrap());

    let mut full = FfmpegVideoSource::open(&clip, TrimWindow::default()).unwrap();
    assert_eq!(count_frames(&mut full), 20);
    full.rewind().unwrap();
    assert_eq!(count_frames(&mut full), 20);

    let trim = TrimWindow::new(0.5, Some(1.5)).unwrap();
    let mut trimmed = FfmpegVideoSource::open(&clip, trim).unwrap();
    assert!((trimmed.info().duration_sec - 1.0).abs() < 1e-6);
    let n = count_frames(&mut trimmed);
    assert!((9..=11).contains(&n), "{n}");
}

#[test]
fn annotates_a_synthetic_rep_end_to_end() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }
    let dir = scratch_dir("rep");
    let clip = dir.join("rep.mp4");
    let out = dir.join("rep-annotated.mp4");
    let _ = std::fs::remove_file(&out);

    // Encode the synthetic rep to a real file first.
    let mut source = common::rep_video(false);
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&clip));
    sink.begin(SinkConfig {
        width: common::FRAME_W,
        height: common::FRAME_H,
        fps: source.info().fps,
        hflip: false,
    })
    .unwrap();
    let mut idx = 0;
    while let Some(frame) = source.read_frame().unwrap() {
        let frame = FrameRGBA {
            width: frame.width(),
            height: frame.height(),
            data: frame.into_raw(),
            premultiplied: false,
        };
        sink.push_frame(FrameIndex(idx), &frame).unwrap();
        idx += 1;
    }
    sink.end().unwrap();

    let result = process_bar_path(&clip, &out, common::seed_box(false));
    assert!(result.succeeded, "{result:?}");
    assert_eq!(result.output_path, out.to_string_lossy());
    assert!(result.averages.iter().all(|v| v.is_finite()));

    let info = probe_video(&out).unwrap();
    assert_eq!((info.width, info.height), (290, 290));
}

#[test]
fn failed_run_leaves_no_output() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }
    let dir = scratch_dir("reject");
    let clip = dir.join("testsrc.mp4");
    let out = dir.join("testsrc-annotated.mp4");
    let _ = std::fs::remove_file(&out);
    synth_testsrc(&clip, 1).unwrap();

    // A 40 px box in a 48 px tall frame cannot travel far enough to look like a rep.
    let result = process_bar_path(&clip, &out, barpath::BoundingBox::new(4, 4, 40, 40));
    assert!(!result.succeeded);
    assert_eq!(result.output_path, "Failed");
    assert!(!out.exists());
}
