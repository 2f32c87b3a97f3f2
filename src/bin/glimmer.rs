use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glimmer", version)]
struct Cli {
    /// Log more (`-v` info, `-vv` debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG after simulating some time.
    Frame(FrameArgs),
    /// Render a numbered PNG sequence with a scripted hover.
    Sequence(SequenceArgs),
    /// List the font families that a config resolves to.
    Fonts(FontsArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Reveal config JSON. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the config text.
    #[arg(long)]
    text: Option<String>,

    /// Extra font files to register.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Viewport as WIDTHxHEIGHT in logical pixels.
    #[arg(long, default_value = "1280x800", value_parser = parse_viewport)]
    viewport: (f32, f32),

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Seed for the particle scatter.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Simulation frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Simulated seconds before capturing.
    #[arg(long, default_value_t = 2.0)]
    time: f64,

    /// Hover for the whole simulation.
    #[arg(long)]
    hover: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of frames to write.
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Seconds at which the pointer enters.
    #[arg(long)]
    hover_at: Option<f64>,

    /// Seconds at which the pointer leaves.
    #[arg(long)]
    leave_at: Option<f64>,

    /// Output directory for `frame_00000.png` files.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct FontsArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sequence(args) => cmd_sequence(args),
        Command::Fonts(args) => cmd_fonts(args),
    }
}

fn parse_viewport(s: &str) -> Result<(f32, f32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: f32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: f32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if !(w > 0.0 && h > 0.0) {
        return Err("viewport sides must be > 0".to_string());
    }
    Ok((w, h))
}

fn load_config(common: &CommonArgs) -> anyhow::Result<glimmer::RevealConfig> {
    let mut cfg = match &common.config {
        Some(path) => glimmer::RevealConfig::from_json_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => glimmer::RevealConfig::default(),
    };
    if let Some(text) = &common.text {
        cfg.text = text.clone();
    }
    cfg.font_files.extend(common.fonts.iter().cloned());
    cfg.validate().context("validate config")?;
    Ok(cfg)
}

fn make_reveal(common: &CommonArgs) -> anyhow::Result<glimmer::TextReveal> {
    if !(common.fps.is_finite() && common.fps > 0.0) {
        anyhow::bail!("--fps must be > 0");
    }
    let cfg = load_config(common)?;
    let (w, h) = common.viewport;
    let viewport = glimmer::Viewport::new(w, h, common.dpr);
    let reveal = glimmer::TextReveal::with_fonts(cfg, viewport)
        .context("create text reveal")?
        .with_seed(common.seed);
    Ok(reveal)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut host = glimmer::HeadlessHost::new();
    let mut reveal = make_reveal(&args.common)?;
    reveal.mount(&mut host);
    reveal.attach_surface();
    if args.hover {
        reveal.pointer_enter();
    }

    let fps = args.common.fps;
    let frames = (args.time.max(0.0) * fps).ceil() as u64;
    for i in 0..=frames {
        reveal.frame(i as f64 / fps);
    }

    write_surface(&reveal, &args.out)?;
    reveal.teardown(&mut host);
    eprintln!(
        "wrote {} ({} particles)",
        args.out.display(),
        reveal.last_stats().particles
    );
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut host = glimmer::HeadlessHost::new();
    let mut reveal = make_reveal(&args.common)?;
    reveal.mount(&mut host);
    reveal.attach_surface();

    let fps = args.common.fps;
    let mut hovering = false;
    for i in 0..args.frames {
        let t = i as f64 / fps;
        let want_hover = args.hover_at.is_some_and(|at| t >= at)
            && !args.leave_at.is_some_and(|at| t >= at);
        if want_hover != hovering {
            if want_hover {
                reveal.pointer_enter();
            } else {
                reveal.pointer_leave();
            }
            hovering = want_hover;
        }
        reveal.frame(t);
        write_surface(&reveal, &args.out_dir.join(format!("frame_{i:05}.png")))?;
    }

    reveal.teardown(&mut host);
    eprintln!("wrote {} frames to {}", args.frames, args.out_dir.display());
    Ok(())
}

fn cmd_fonts(args: FontsArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let book = glimmer::FontBook::from_config(&cfg);
    if book.is_empty() {
        anyhow::bail!("no fonts could be loaded");
    }
    eprintln!("registered families:");
    for name in book.family_names() {
        eprintln!("  {name}");
    }
    match book.resolve(&cfg.font_family) {
        Some(font) => eprintln!("'{}' resolves to '{}'", cfg.font_family, font.family),
        None => eprintln!("'{}' does not resolve", cfg.font_family),
    }
    Ok(())
}

fn write_surface(reveal: &glimmer::TextReveal, out: &Path) -> anyhow::Result<()> {
    let surface = reveal
        .surface()
        .context("no surface attached (zero-sized viewport?)")?;
    let frame = surface.to_frame();

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}
