use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "capstamp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw the cap with an explicit placement.
    Apply(ApplyArgs),
    /// Draw the cap where the head heuristic puts it.
    Auto(AutoArgs),
    /// Print the auto-detected placement as JSON.
    Detect(DetectArgs),
    /// Print a data URI for a file.
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input picture.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Compositor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cap graphic (SVG or raster) overriding the built-in one.
    #[arg(long)]
    cap: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Cap width as a fraction of the canvas (clamped to the configured range).
    #[arg(long, default_value_t = 0.6)]
    scale: f64,

    /// Horizontal shift in canvas widths.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset_x: f64,

    /// Cap top edge in canvas heights; negative lifts it above the picture.
    #[arg(long, default_value_t = -0.35, allow_hyphen_values = true)]
    offset_y: f64,
}

#[derive(Args, Debug)]
struct AutoArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct DetectArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// File to encode.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Auto(args) => cmd_auto(args),
        Command::Detect(args) => cmd_detect(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn make_compositor(common: &CommonArgs) -> anyhow::Result<capstamp::Compositor> {
    let mut opts = match &common.config {
        Some(path) => capstamp::CompositorOpts::from_json_path(path)?,
        None => capstamp::CompositorOpts::default(),
    };
    if let Some(cap) = &common.cap {
        opts.cap_path = Some(cap.clone());
    }
    Ok(capstamp::Compositor::new(opts)?)
}

fn read_source(
    compositor: &capstamp::Compositor,
    path: &Path,
) -> anyhow::Result<capstamp::SourceImage> {
    let source = capstamp::SourceImage::from_path(path)?;
    compositor
        .check_upload(&source)
        .with_context(|| format!("reject '{}'", path.display()))?;
    Ok(source)
}

fn write_png(path: &Path, png: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, png).with_context(|| format!("write png '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let compositor = make_compositor(&args.common)?;
    let source = read_source(&compositor, &args.common.in_path)?;

    let params = compositor.opts().clamp_placement(capstamp::PlacementParams::new(
        args.scale,
        args.offset_x,
        args.offset_y,
    ));
    let result = compositor.composite_with_placement(&source.bytes, params)?;
    write_png(&args.out, &result.png)
}

fn cmd_auto(args: AutoArgs) -> anyhow::Result<()> {
    let compositor = make_compositor(&args.common)?;
    let source = read_source(&compositor, &args.common.in_path)?;

    let result = compositor.composite_auto(&source.bytes)?;
    tracing::info!(placement = ?result.placement, side = result.side(), "auto placement applied");
    write_png(&args.out, &result.png)
}

fn cmd_detect(args: DetectArgs) -> anyhow::Result<()> {
    let compositor = make_compositor(&args.common)?;
    let source = read_source(&compositor, &args.common.in_path)?;

    let params = compositor.detect_placement(&source.bytes)?;
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let source = capstamp::SourceImage::from_path(&args.in_path)?;
    source
        .check(capstamp::MAX_UPLOAD_BYTES)
        .with_context(|| format!("reject '{}'", args.in_path.display()))?;
    let uri = capstamp::preview::data_uri_with_mime(&source.bytes, &source.media_type);
    println!("{uri}");
    Ok(())
}
