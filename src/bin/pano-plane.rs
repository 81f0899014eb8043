use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pano_plane::{Interpolation, JobConfig, JobResult, OutputFormat, ProgressUpdate};

#[derive(Parser, Debug)]
#[command(name = "pano-plane", version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project sampled frames of a 360° video (requires `ffmpeg` and `ffprobe` on PATH).
    Video(JobArgs),
    /// Project a single equirectangular image.
    Still(JobArgs),
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Input video or panorama image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Job JSON; flags given on the command line override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma separated yaw angles in degrees, e.g. `0,90,180,270`.
    #[arg(long)]
    yaw: Option<String>,

    /// Pitch in degrees (1-179, 90 = horizon).
    #[arg(long)]
    pitch: Option<f64>,

    /// Field of view in degrees (0-180, exclusive).
    #[arg(long)]
    fov: Option<f64>,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Project every n-th frame.
    #[arg(long)]
    interval: Option<u64>,

    /// Output image format: jpg or png.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Worker threads for projection.
    #[arg(long)]
    workers: Option<usize>,

    /// Write one `yaw_<angle>` directory per view.
    #[arg(long)]
    organize_by_yaw: bool,

    /// Resampling kernel: nearest, bilinear or bicubic.
    #[arg(long)]
    interpolation: Option<Interpolation>,

    /// Sampled frames in flight at once.
    #[arg(long)]
    pipeline_depth: Option<usize>,

    /// JPEG quality (1-100).
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Print the effective job JSON to stdout and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (args, still) = match cli.cmd {
        Command::Video(args) => (args, false),
        Command::Still(args) => (args, true),
    };

    let config = job_config(&args)?;
    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let mut last_percent = -1.0f64;
    let mut progress = |u: &ProgressUpdate| {
        if u.percent - last_percent >= 1.0 || u.state.is_terminal() {
            last_percent = u.percent;
            tracing::debug!(
                state = ?u.state,
                percent = u.percent,
                sampled = u.sampled_count,
                "progress"
            );
        }
    };

    let result = if still {
        pano_plane::run_still(&config, &mut progress)
    } else {
        pano_plane::run(&config, &mut progress)
    }
    .with_context(|| format!("projecting '{}'", config.source_path.display()))?;

    print_summary(&result, &config);
    Ok(())
}

fn job_config(args: &JobArgs) -> anyhow::Result<JobConfig> {
    let mut cfg = match &args.config {
        Some(path) => JobConfig::from_path(path)?,
        None => JobConfig::default(),
    };

    cfg.source_path = args.in_path.clone();
    cfg.output_dir = args.out_dir.clone();
    if let Some(yaw) = &args.yaw {
        cfg.yaw_angles_degrees = pano_plane::parse_yaw_list(yaw)?;
    }
    if let Some(v) = args.pitch {
        cfg.pitch_degrees = v;
    }
    if let Some(v) = args.fov {
        cfg.fov_degrees = v;
    }
    if let Some(v) = args.width {
        cfg.output_width = v;
    }
    if let Some(v) = args.height {
        cfg.output_height = v;
    }
    if let Some(v) = args.interval {
        cfg.frame_interval = v;
    }
    if let Some(v) = args.format {
        cfg.output_format = v;
    }
    if let Some(v) = args.workers {
        cfg.num_workers = v;
    }
    if args.organize_by_yaw {
        cfg.organize_by_yaw = true;
    }
    if let Some(v) = args.interpolation {
        cfg.interpolation = v;
    }
    if let Some(v) = args.pipeline_depth {
        cfg.pipeline_depth = v;
    }
    if let Some(v) = args.jpeg_quality {
        cfg.jpeg_quality = v;
    }
    Ok(cfg)
}

fn print_summary(result: &JobResult, config: &JobConfig) {
    eprintln!(
        "{:?}: processed {} frames ({} images), {} errors, {:.2}s elapsed -> {}",
        result.state,
        result.processed_count,
        result.outputs_written,
        result.error_count,
        result.elapsed_seconds,
        config.output_dir.display()
    );
}
