use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imgcmp", version, about = "Compare WebP renditions across quality levels")]
struct Cli {
    /// More log output (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcode an image to WebP at evenly spaced quality levels.
    Sweep(SweepArgs),
    /// Try to load every engine and report which are available.
    Engines(EnginesArgs),
}

#[derive(Parser, Debug)]
struct SweepArgs {
    /// Input image (png, jpg, jpeg, gif or webp).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the MIME type inferred from the file extension.
    #[arg(long)]
    mime: Option<String>,

    /// Number of quality levels, 1 to 10. Defaults to the config value.
    #[arg(long)]
    steps: Option<u8>,

    /// Encode losslessly.
    #[arg(long)]
    lossless: bool,

    /// libwebp preset, by name or code. Ignored by the ffmpeg engine.
    #[arg(long)]
    preset: Option<imgcmp::WebpPreset>,

    /// Engine selection. Overrides the config value.
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Directory to write renditions to. Nothing is written when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct EnginesArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Comparator config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// `ffmpeg` executable. Overrides the config value.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineArg {
    Auto,
    Ffmpeg,
    Libwebp,
}

impl From<EngineArg> for imgcmp::EngineChoice {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Auto => imgcmp::EngineChoice::Auto,
            EngineArg::Ffmpeg => imgcmp::EngineChoice::Ffmpeg,
            EngineArg::Libwebp => imgcmp::EngineChoice::Libwebp,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Sweep(args) => cmd_sweep(args).await,
        Command::Engines(args) => cmd_engines(args).await,
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "imgcmp=info",
        1 => "imgcmp=debug",
        _ => "imgcmp=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(common: &CommonArgs) -> anyhow::Result<imgcmp::ComparatorConfig> {
    let mut config = match &common.config {
        Some(path) => imgcmp::ComparatorConfig::from_path(path)?,
        None => imgcmp::ComparatorConfig::default(),
    };
    if let Some(ffmpeg) = &common.ffmpeg {
        config.ffmpeg_path = ffmpeg.clone();
    }
    Ok(config)
}

fn open_source(path: &Path, mime: Option<&str>) -> anyhow::Result<imgcmp::SourceImage> {
    let source = match mime {
        Some(raw) => {
            imgcmp::SourceImage::from_path_with_mime(path, imgcmp::ImageMimeType::parse(raw)?)?
        }
        None => imgcmp::SourceImage::from_path(path)?,
    };
    Ok(source)
}

async fn cmd_sweep(args: SweepArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(engine) = args.engine {
        config.engine = engine.into();
    }
    let steps = args.steps.unwrap_or(config.default_step_count);

    let source = open_source(&args.in_path, args.mime.as_deref())?;
    let comparator = imgcmp::Comparator::new(config)?;
    let request = imgcmp::SweepRequest::new(source, steps)
        .lossless(args.lossless)
        .preset(args.preset);

    let mut report = comparator.run(request).await?;
    report.sort_by_quality();

    if let Some(dir) = &args.out {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        for r in &report.results {
            let path = dir.join(&r.name);
            std::fs::write(&path, &r.output)
                .with_context(|| format!("write webp '{}'", path.display()))?;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for r in &report.results {
            println!("{}  {:.2} kb  {} %", r.name, r.size_kb(), r.quality);
        }
    }

    if report.failed() > 0 {
        eprintln!("{} of {} points failed", report.failed(), report.requested);
    }
    if let Some(dir) = &args.out {
        eprintln!("wrote {} files to {}", report.results.len(), dir.display());
    }
    Ok(())
}

async fn cmd_engines(args: EnginesArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    match imgcmp::ffmpeg_version(&config.ffmpeg_path).await {
        Ok(version) => println!("{}: {version}", config.ffmpeg_path.display()),
        Err(e) => println!("{}: {e}", config.ffmpeg_path.display()),
    }
    let loader = imgcmp::EngineLoader::system(&config);
    for variant in imgcmp::EngineVariant::ALL {
        match loader.get_engine(variant).await {
            Ok(engine) => println!(
                "{variant}: available (presets: {})",
                if engine.supports_preset() { "yes" } else { "no" }
            ),
            Err(e) => println!("{variant}: unavailable ({e})"),
        }
    }
    Ok(())
}
