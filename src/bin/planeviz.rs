use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use planeviz::{
    BoundingBox, ColormapName, CpuRenderer, Dataset, FfmpegSink, FfmpegSinkOpts, FramePipeline,
    FrameSink, Fps, Iteration, MemorySource, MovieSession, PipelineConfig, Plane,
    PngSequenceSink, ResampleMethod, Resolution, RunConfig, save_png,
};

#[derive(Parser, Debug)]
#[command(name = "planeviz", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one iteration as a PNG.
    Frame(FrameArgs),
    /// Render every selected iteration into an MP4 (requires `ffmpeg` on PATH) or a PNG sequence.
    Movie(MovieArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Iteration to render; the first available one when omitted.
    #[arg(long)]
    iteration: Option<u64>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct MovieArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Output path: `.mp4` encodes with ffmpeg, anything else is a directory of numbered PNGs.
    #[arg(long)]
    out: PathBuf,

    /// Frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// First iteration to include.
    #[arg(long)]
    min_iteration: Option<u64>,

    /// Last iteration to include.
    #[arg(long)]
    max_iteration: Option<u64>,

    /// Keep one iteration out of this many.
    #[arg(long)]
    every: Option<usize>,
}

/// Inputs shared by both subcommands. Flags override values read from `--config`.
#[derive(Args, Debug)]
struct RunArgs {
    /// Dataset JSON with the plane fields (and optional horizons).
    #[arg(long)]
    dataset: PathBuf,

    /// Run configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Plane to plot (xy, xz or yz).
    #[arg(long)]
    plane: Option<Plane>,

    /// Variable to plot.
    #[arg(long)]
    variable: Option<String>,

    /// Variable prefix to draw the field lines of.
    #[arg(long)]
    vector_variable: Option<String>,

    /// Lower-left corner of the plotted region.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    origin: Option<Vec<f64>>,

    /// Upper-right corner of the plotted region.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    corner: Option<Vec<f64>>,

    /// Samples per axis.
    #[arg(long)]
    resolution: Option<usize>,

    /// Mask values smaller than this one.
    #[arg(long, allow_negative_numbers = true)]
    mask_value: Option<f64>,

    /// Plot log10 of the variable.
    #[arg(long)]
    logscale: bool,

    /// Take the absolute value before any log.
    #[arg(long)]
    absolute: bool,

    /// Minimum of the color scale (a log if --logscale is set).
    #[arg(long, allow_negative_numbers = true)]
    vmin: Option<f64>,

    /// Maximum of the color scale (a log if --logscale is set).
    #[arg(long, allow_negative_numbers = true)]
    vmax: Option<f64>,

    /// Color map (inferno, viridis or gray).
    #[arg(long)]
    colormap: Option<ColormapName>,

    /// Interpolate snapshots bilinearly instead of taking the nearest sample.
    #[arg(long)]
    multilinear_interpolate: bool,

    /// Draw a colorbar.
    #[arg(long)]
    colorbar: bool,

    /// Overlay horizon outlines from the dataset.
    #[arg(long)]
    horizons: bool,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

const DEFAULT_ORIGIN: [f64; 2] = [-50.0, -50.0];
const DEFAULT_CORNER: [f64; 2] = [50.0, 50.0];
const DEFAULT_RESOLUTION: usize = 500;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Movie(args) => cmd_movie(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = run_config(&args.run)?;
    let source = load_source(&args.run.dataset)?;
    let session = session(&source, &cfg)?;

    let iteration = match args.iteration {
        Some(it) => Iteration(it),
        None => session
            .pipeline()
            .iterations()
            .next()
            .context("dataset has no iterations in the selected window")?,
    };
    let mut renderer = CpuRenderer::new(&cfg.style)?;
    let frame = session.render_iteration(&mut renderer, iteration)?;
    save_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_movie(args: MovieArgs) -> anyhow::Result<()> {
    let mut cfg = run_config(&args.run)?;
    if let Some(fps) = args.fps {
        cfg.fps = Fps::new(fps, 1)?;
    }
    let window = &mut cfg.pipeline.window;
    if let Some(min) = args.min_iteration {
        window.min = Some(Iteration(min));
    }
    if let Some(max) = args.max_iteration {
        window.max = Some(Iteration(max));
    }
    if let Some(every) = args.every {
        window.every = every;
    }
    cfg.validate()?;

    let source = load_source(&args.run.dataset)?;
    let session = session(&source, &cfg)?;
    let mut renderer = CpuRenderer::new(&cfg.style)?;

    let is_mp4 = args
        .out
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
    let mut sink: Box<dyn FrameSink> = if is_mp4 {
        Box::new(FfmpegSink::new(FfmpegSinkOpts {
            bg_rgba: cfg.style.background,
            ..FfmpegSinkOpts::new(&args.out)
        }))
    } else {
        Box::new(PngSequenceSink::new(&args.out))
    };
    let stats = session.render_range(&mut renderer, sink.as_mut(), cfg.fps)?;

    eprintln!(
        "wrote {} ({} frames)",
        args.out.display(),
        stats.frames_rendered
    );
    Ok(())
}

fn load_source(path: &Path) -> anyhow::Result<MemorySource> {
    let dataset = Dataset::from_path(path)?;
    let source = dataset
        .into_source()
        .with_context(|| format!("build source from '{}'", path.display()))?;
    Ok(source)
}

fn session<'a>(source: &'a MemorySource, cfg: &RunConfig) -> anyhow::Result<MovieSession<'a>> {
    let mut pipeline = FramePipeline::setup(source, cfg.pipeline.clone())?;
    if cfg.pipeline.overlays {
        pipeline = pipeline.with_overlays(source);
    }
    Ok(MovieSession::new(pipeline, cfg.style.clone())?)
}

/// Load `--config` (or start from defaults) and apply the command-line overrides.
fn run_config(args: &RunArgs) -> anyhow::Result<RunConfig> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::from_path(path)?,
        None => {
            let variable = args
                .variable
                .clone()
                .context("--variable is required without --config")?;
            let vector_variable = args
                .vector_variable
                .clone()
                .context("--vector-variable is required without --config")?;
            RunConfig {
                pipeline: PipelineConfig::new(
                    Plane::Xy,
                    variable,
                    vector_variable,
                    BoundingBox::new(DEFAULT_ORIGIN, DEFAULT_CORNER)?,
                    Resolution::square(DEFAULT_RESOLUTION)?,
                ),
                style: Default::default(),
                fps: Fps::default(),
            }
        }
    };

    let p = &mut cfg.pipeline;
    if let Some(plane) = args.plane {
        p.plane = plane;
    }
    if let Some(v) = &args.variable {
        p.variable = v.clone();
    }
    if let Some(v) = &args.vector_variable {
        p.vector_variable = v.clone();
    }
    if let Some(origin) = &args.origin {
        p.bbox.origin = pair(origin, "--origin")?;
    }
    if let Some(corner) = &args.corner {
        p.bbox.extent = pair(corner, "--corner")?;
    }
    if let Some(n) = args.resolution {
        p.resolution = Resolution::square(n)?;
    }
    if args.mask_value.is_some() {
        p.mask_threshold = args.mask_value;
    }
    p.transform.absolute |= args.absolute;
    p.transform.log10 |= args.logscale;
    if args.multilinear_interpolate {
        p.resample = ResampleMethod::Multilinear;
    }
    p.overlays |= args.horizons;

    let s = &mut cfg.style;
    if let Some(w) = args.width {
        s.canvas.width = w;
    }
    if let Some(h) = args.height {
        s.canvas.height = h;
    }
    if let Some(name) = args.colormap {
        s.color_map.colormap = name;
    }
    if args.vmin.is_some() {
        s.color_map.vmin = args.vmin;
    }
    if args.vmax.is_some() {
        s.color_map.vmax = args.vmax;
    }
    s.color_map.colorbar |= args.colorbar;
    s.color_map.log_scale |= cfg.pipeline.transform.log10;

    cfg.validate()?;
    Ok(cfg)
}

fn pair(v: &[f64], flag: &str) -> anyhow::Result<[f64; 2]> {
    match v {
        [a, b] => Ok([*a, *b]),
        _ => anyhow::bail!("{flag} takes exactly two values"),
    }
}
