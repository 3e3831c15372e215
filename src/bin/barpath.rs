use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use barpath::{
    AnalysisConfig, BoundingBox, ProcessOptions, SessionMetadata, TrimWindow,
    process_bar_path_with, session::default_output_path,
};

#[derive(Parser, Debug)]
#[command(name = "barpath", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track the barbell, measure its deviation and write an annotated MP4 (requires `ffmpeg`).
    Analyze(AnalyzeArgs),
    /// Print the effective analysis configuration as JSON.
    Template(TemplateArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input video.
    #[arg(long = "in", required_unless_present = "meta", conflicts_with = "meta")]
    in_path: Option<PathBuf>,

    /// Session metadata JSON (trim window, barbell area and video path).
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Output MP4 path. Defaults to `<input stem>-annotated.mp4` next to the input.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Barbell seed box on the first analyzed frame.
    #[arg(
        long,
        num_args = 4,
        value_names = ["X", "Y", "W", "H"],
        allow_negative_numbers = true,
        required_unless_present = "meta"
    )]
    bbox: Option<Vec<i32>>,

    /// Analysis configuration JSON; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip this many seconds of input.
    #[arg(long)]
    trim_start: Option<f64>,

    /// Stop reading input at this many seconds.
    #[arg(long)]
    trim_end: Option<f64>,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Configuration JSON to merge over the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BARPATH_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Analyze(args) => cmd_analyze(args),
        Command::Template(args) => cmd_template(args),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::from_json_path(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn cmd_analyze(args: AnalyzeArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_ref())?;
    let session = args
        .meta
        .as_ref()
        .map(|p| {
            SessionMetadata::from_json_path(p)
                .with_context(|| format!("load session metadata '{}'", p.display()))
        })
        .transpose()?;

    let input = match (&args.in_path, &session) {
        (Some(p), _) => p.clone(),
        (None, Some(md)) => md.input_path(),
        (None, None) => anyhow::bail!("either --in or --meta is required"),
    };

    let seed = match (&args.bbox, &session) {
        (Some(v), _) => match v.as_slice() {
            &[x, y, w, h] => BoundingBox::new(x, y, w, h),
            _ => anyhow::bail!("--bbox takes exactly four values"),
        },
        (None, Some(md)) => md.seed_bbox()?,
        (None, None) => anyhow::bail!("either --bbox or --meta is required"),
    };

    let mut trim = match &session {
        Some(md) => md.trim_window()?,
        None => TrimWindow::default(),
    };
    if let Some(start) = args.trim_start {
        trim.start_sec = start;
    }
    if args.trim_end.is_some() {
        trim.end_sec = args.trim_end;
    }
    trim.validate().context("invalid trim window")?;

    let out = args.out.unwrap_or_else(|| default_output_path(&input));
    let opts = ProcessOptions {
        config,
        trim,
        ..ProcessOptions::default()
    };

    let result = process_bar_path_with(&input, &out, seed, &opts);
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serialize result")?
    );
    if !result.succeeded {
        eprintln!("analysis of '{}' failed", input.display());
        return Ok(ExitCode::FAILURE);
    }
    eprintln!("wrote {}", out.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_template(args: TemplateArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_ref())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("serialize config")?
    );
    Ok(ExitCode::SUCCESS)
}
