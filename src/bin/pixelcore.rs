use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pixelcore::foundation::colorspace::transform_image_colorspace;
use pixelcore::foundation::math::{scale_char_to_quantum, scale_quantum_to_char};
use pixelcore::{
    ChannelMask, Colorspace, CompositeArgs, CompositeOp, CompositeOptions, CompositeParams,
    Endian, Image, PixelPacket, QUANTUM_MAX, QuantumFormat, QuantumLayout, QuantumProfile,
    RowThreading,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pixelcore", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a raw sample buffer into a PNG.
    Decode(DecodeArgs),
    /// Composite one PNG onto another.
    Composite(CompositeCmdArgs),
    /// List the compositing operators.
    Ops,
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Raw input buffer.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Pixels per row.
    #[arg(long)]
    width: usize,

    /// Number of rows.
    #[arg(long)]
    height: usize,

    /// Channel layout (rgb, rgba, gray, cmyk, index, ...).
    #[arg(long, default_value = "rgb")]
    layout: QuantumLayout,

    /// Bits per sample.
    #[arg(long)]
    depth: Option<u32>,

    /// Byte order.
    #[arg(long, value_enum)]
    endian: Option<Endian>,

    /// Sample format.
    #[arg(long, value_enum)]
    format: Option<QuantumFormat>,

    /// JSON profile; flags given on the command line override its fields.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CompositeCmdArgs {
    /// Canvas image.
    #[arg(long)]
    canvas: PathBuf,

    /// Source image.
    #[arg(long)]
    source: PathBuf,

    /// Operator name.
    #[arg(long, default_value = "over")]
    op: CompositeOp,

    /// Operator arguments, e.g. "50" or "60,40".
    #[arg(long)]
    args: Option<CompositeArgs>,

    /// Source offset, e.g. "+10+5" or "-3+0".
    #[arg(long, default_value = "+0+0", allow_hyphen_values = true)]
    geometry: String,

    /// Channels for unsynced operators.
    #[arg(long)]
    channels: Option<ChannelMask>,

    /// Blend channels independently.
    #[arg(long, default_value_t = false)]
    no_sync: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// JSON options; flags given on the command line override its fields.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PIXELCORE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Decode(args) => cmd_decode(args),
        Command::Composite(args) => cmd_composite(args),
        Command::Ops => {
            for op in CompositeOp::ALL {
                println!("{op}");
            }
            Ok(())
        }
    }
}

fn cmd_decode(args: DecodeArgs) -> anyhow::Result<()> {
    let mut profile = match &args.profile {
        Some(path) => read_json::<QuantumProfile>(path)?,
        None => QuantumProfile::default(),
    };
    if let Some(depth) = args.depth {
        profile.depth = depth;
    }
    if let Some(endian) = args.endian {
        profile.endian = endian;
    }
    if let Some(format) = args.format {
        profile.format = format;
    }

    let buffer = std::fs::read(&args.in_path)
        .with_context(|| format!("read raw buffer '{}'", args.in_path.display()))?;

    let mut image = Image::new(args.width, args.height)?;
    if args.layout.requires_cmyk() {
        image = image.with_colorspace(Colorspace::Cmyk);
    }
    if args.layout.is_indexed() {
        image = image.with_colormap(gray_ramp(profile.depth));
    }

    let outcome = pixelcore::decode_image(&mut image, &buffer, &profile, args.layout)
        .with_context(|| format!("decode '{}' as {}", args.in_path.display(), args.layout))?;
    for d in &outcome.diagnostics {
        eprintln!("{:?}: {}", d.severity, d.message);
    }

    write_png(&image, &args.out)?;
    eprintln!("wrote {} ({} bytes consumed)", args.out.display(), outcome.consumed);
    Ok(())
}

fn cmd_composite(args: CompositeCmdArgs) -> anyhow::Result<()> {
    let mut canvas = read_png(&args.canvas)?;
    let source = read_png(&args.source)?;
    let (x, y) = parse_geometry(&args.geometry)?;

    let mut options = match &args.options {
        Some(path) => read_json::<CompositeOptions>(path)?,
        None => CompositeOptions::default(),
    };
    if let Some(channels) = args.channels {
        if !args.op.honors_channel_mask() {
            tracing::warn!(op = %args.op, "operator ignores --channels");
        }
        options.channels = channels;
    }
    if args.no_sync {
        options.sync = false;
    }
    if args.threads.is_some() {
        options.threading = RowThreading {
            parallel: true,
            threads: args.threads,
        };
    }

    let params = CompositeParams::from_args(args.op, args.args.as_ref())?;
    let report = pixelcore::composite_image(&mut canvas, &source, args.op, &params, x, y, &options)
        .with_context(|| format!("composite with '{}'", args.op))?;
    for d in &report.diagnostics {
        eprintln!("{:?}: {}", d.severity, d.message);
    }
    if !report.status {
        anyhow::bail!(
            "composite '{}' failed on {} of {} rows",
            args.op,
            report.rows_skipped,
            report.rows_total
        );
    }

    write_png(&canvas, &args.out)?;
    eprintln!(
        "wrote {} ({} of {} rows composited)",
        args.out.display(),
        report.rows_processed,
        report.rows_total
    );
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read json '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse json '{}'", path.display()))
}

fn read_png(path: &Path) -> anyhow::Result<Image> {
    let rgba = image::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = rgba.dimensions();
    let pixels = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            PixelPacket {
                red: scale_char_to_quantum(r),
                green: scale_char_to_quantum(g),
                blue: scale_char_to_quantum(b),
                opacity: QUANTUM_MAX - scale_char_to_quantum(a),
            }
        })
        .collect();
    Ok(Image::from_pixels(w as usize, h as usize, pixels)?)
}

fn write_png(img: &Image, path: &Path) -> anyhow::Result<()> {
    let rgb = transform_image_colorspace(img, Colorspace::Rgb);
    let mut data = Vec::with_capacity(rgb.pixels.len() * 4);
    for p in &rgb.pixels {
        let alpha = if rgb.matte { p.alpha() } else { QUANTUM_MAX };
        data.extend_from_slice(&[
            scale_quantum_to_char(p.red),
            scale_quantum_to_char(p.green),
            scale_quantum_to_char(p.blue),
            scale_quantum_to_char(alpha),
        ]);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &data,
        u32::try_from(img.columns).context("image width exceeds u32")?,
        u32::try_from(img.rows).context("image height exceeds u32")?,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

/// Gray palette spanning the index range of `depth`, capped at 65536 entries.
fn gray_ramp(depth: u32) -> Vec<PixelPacket> {
    let entries = 1usize << depth.clamp(1, 16);
    let top = (entries - 1) as f64;
    (0..entries)
        .map(|i| {
            let v = (f64::from(QUANTUM_MAX) * i as f64 / top).round() as u16;
            PixelPacket::gray(v)
        })
        .collect()
}

fn parse_geometry(s: &str) -> anyhow::Result<(isize, isize)> {
    let bad = || anyhow::anyhow!("invalid geometry '{s}', expected e.g. +10-4");
    let s = s.trim();
    let split = s
        .char_indices()
        .skip(1)
        .find(|(_, c)| matches!(c, '+' | '-'))
        .map(|(i, _)| i)
        .ok_or_else(bad)?;
    let (xs, ys) = s.split_at(split);
    let x = xs.trim_start_matches('+').parse::<isize>().map_err(|_| bad())?;
    let y = ys.trim_start_matches('+').parse::<isize>().map_err(|_| bad())?;
    Ok((x, y))
}
