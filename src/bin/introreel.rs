use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use introreel::{BackgroundStyle, CaptionStyle, PipelineConfig, PipelineInputs};

#[derive(Parser, Debug)]
#[command(name = "introreel", version, about = "Render a personal intro video")]
struct Cli {
    /// Portrait photo (JPEG or PNG).
    #[arg(long)]
    photo: PathBuf,

    /// Voice recording (WAV, MP3, M4A, FLAC, OGG).
    #[arg(long)]
    audio: PathBuf,

    /// UTF-8 intro script.
    #[arg(long)]
    text: PathBuf,

    /// Output `.mp4` path, or a directory to place `<name>_intro.mp4` in.
    #[arg(long)]
    output: PathBuf,

    /// Name shown in the title and used for the default output file name.
    #[arg(long)]
    name: Option<String>,

    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pre-rendered talking-head video to use instead of the photo.
    #[arg(long)]
    lipsync_video: Option<PathBuf>,

    /// External face detector: takes the photo path, prints a JSON box or `null`.
    #[arg(long)]
    face_detector: Option<PathBuf>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long, value_enum)]
    background: Option<BackgroundArg>,

    #[arg(long, value_enum)]
    captions: Option<CaptionsArg>,

    /// Skill to highlight (repeatable).
    #[arg(long = "skill")]
    skills: Vec<String>,

    #[arg(long, default_value_t = false)]
    no_ken_burns: bool,

    #[arg(long, default_value_t = false)]
    no_mouth: bool,

    /// Render the frame at this time (seconds) to a PNG next to the output instead of a video.
    #[arg(long)]
    preview_at: Option<f64>,

    /// Debug logging (overridden by `RUST_LOG`).
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackgroundArg {
    Gradient,
    Drift,
    Neural,
}

impl From<BackgroundArg> for BackgroundStyle {
    fn from(v: BackgroundArg) -> Self {
        match v {
            BackgroundArg::Gradient => Self::Gradient,
            BackgroundArg::Drift => Self::Drift,
            BackgroundArg::Neural => Self::Neural,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CaptionsArg {
    Stacked,
    LowerThird,
}

impl From<CaptionsArg> for CaptionStyle {
    fn from(v: CaptionsArg) -> Self {
        match v {
            CaptionsArg::Stacked => Self::Stacked,
            CaptionsArg::LowerThird => Self::LowerThird,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = build_config(&cli)?;
    let output = introreel::resolve_output_path(&cli.output, cli.name.as_deref());
    let inputs = PipelineInputs {
        photo: cli.photo.clone(),
        audio: cli.audio.clone(),
        text: cli.text.clone(),
        output,
    };

    if let Some(at) = cli.preview_at {
        let png = inputs.output.with_extension("png");
        let written = introreel::render_preview(&inputs, &cfg, at, &png)
            .with_context(|| format!("render preview at {at}s"))?;
        eprintln!("wrote {}", written.display());
        return Ok(());
    }

    let video = introreel::run(&inputs, &cfg).context("render intro video")?;
    eprintln!(
        "wrote {} ({}x{} @ {} fps, {} frames, {:.2}s)",
        video.path.display(),
        video.width,
        video.height,
        video.fps.num,
        video.frames,
        video.duration_secs
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(name) = &cli.name {
        cfg = cfg.with_name(name);
    }
    if let Some(p) = &cli.lipsync_video {
        cfg.lipsync_video = Some(p.clone());
    }
    if let Some(p) = &cli.face_detector {
        cfg.face_detector = Some(p.clone());
    }
    if let Some(fps) = cli.fps {
        cfg.fps = fps;
    }
    if let Some(w) = cli.width {
        cfg.width = w;
    }
    if let Some(h) = cli.height {
        cfg.height = h;
    }
    if let Some(bg) = cli.background {
        cfg.background_style = bg.into();
    }
    if let Some(c) = cli.captions {
        cfg.caption_style = c.into();
    }
    if !cli.skills.is_empty() {
        cfg.skill_highlights = cli.skills.clone();
    }
    if cli.no_ken_burns {
        cfg.ken_burns_enabled = false;
    }
    if cli.no_mouth {
        cfg.mouth_animation_enabled = false;
    }

    cfg.validate()?;
    Ok(cfg)
}
