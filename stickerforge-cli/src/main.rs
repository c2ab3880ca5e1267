//! Stickerforge CLI Tool
//!
//! Command-line interface for sticker asset preparation: video → GIF
//! conversion under a size budget, batch letterbox resizing, and
//! fixed-aspect cropping.

use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use stickerforge_compose::{crop_still, encode_still, resize_still, StillFormat};
use stickerforge_core::{
    default_ladder, parse_color, CompressionStep, CropRegion, FitMode, GifOptions, SampleSpan,
    DEFAULT_BUDGET_BYTES,
};
use stickerforge_gif::{
    convert_video_to_gif, transcode_to_budget, FfmpegSource, FrameSource, ProgressPrinter,
};

#[derive(Parser)]
#[command(name = "stickerforge")]
#[command(about = "Stickerforge - meme sticker asset preparation toolkit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a video into a sticker GIF, by default compressing until it
    /// fits a size budget
    Gif(GifArgs),

    /// Batch-resize images onto a fixed canvas
    Resize(ResizeArgs),

    /// Crop an image to a fixed canvas (centered unless a region is given)
    Crop(CropArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum FitArg {
    Stretch,
    Contain,
}

impl From<FitArg> for FitMode {
    fn from(value: FitArg) -> Self {
        match value {
            FitArg::Stretch => FitMode::Stretch,
            FitArg::Contain => FitMode::Contain,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SpanArg {
    First,
    Full,
}

impl From<SpanArg> for SampleSpan {
    fn from(value: SpanArg) -> Self {
        match value {
            SpanArg::First => SampleSpan::First,
            SpanArg::Full => SampleSpan::Full,
        }
    }
}

#[derive(Args)]
struct GifArgs {
    /// Input video file path
    input: PathBuf,

    /// Output GIF file path
    #[arg(short, long)]
    output: PathBuf,

    /// Size budget in KB for the compression ladder
    #[arg(long, default_value_t = DEFAULT_BUDGET_BYTES / 1024)]
    budget_kb: usize,

    /// JSON file with a custom compression ladder
    #[arg(long)]
    ladder: Option<PathBuf>,

    /// Run one conversion with the explicit options below instead of the
    /// budget ladder
    #[arg(long)]
    single: bool,

    /// Output width (single mode)
    #[arg(long)]
    width: Option<u32>,

    /// Output height (single mode)
    #[arg(long)]
    height: Option<u32>,

    /// Width bound when no explicit size is given (single mode)
    #[arg(long)]
    max_width: Option<u32>,

    /// Height bound when no explicit size is given (single mode)
    #[arg(long)]
    max_height: Option<u32>,

    /// How the source maps onto the canvas (single mode)
    #[arg(long, value_enum, default_value = "stretch")]
    fit: FitArg,

    /// Capture frame rate (single mode)
    #[arg(long, default_value = "10")]
    fps: f64,

    /// Output clip length in seconds (single mode)
    #[arg(long)]
    duration_sec: Option<f64>,

    /// Part of the source to sample from (single mode)
    #[arg(long, value_enum, default_value = "first")]
    span: SpanArg,

    /// Quantizer sampling interval, 1-30, lower is better (single mode)
    #[arg(long, default_value = "10")]
    quality: u8,

    /// Letterbox fill color, e.g. '#ffffff' (contain fit only)
    #[arg(long)]
    fill: Option<String>,

    /// Palette quantization worker threads
    #[arg(long, default_value = "2")]
    workers: usize,
}

#[derive(Args)]
struct ResizeArgs {
    /// Input image files
    inputs: Vec<PathBuf>,

    /// Output canvas width
    #[arg(long)]
    width: u32,

    /// Output canvas height
    #[arg(long)]
    height: u32,

    /// Stretch instead of letterboxing
    #[arg(long)]
    stretch: bool,

    /// Letterbox fill color, e.g. '#ffffff' or 'transparent'
    #[arg(long)]
    fill: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Package the results into a zip archive instead of a directory
    #[arg(long)]
    zip: Option<PathBuf>,
}

#[derive(Args)]
struct CropArgs {
    /// Input image file
    input: PathBuf,

    /// Output canvas width
    #[arg(long)]
    width: u32,

    /// Output canvas height
    #[arg(long)]
    height: u32,

    /// Manual crop region as 'x,y,width,height' in source pixels
    #[arg(long)]
    region: Option<String>,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Gif(args) => run_gif(args),
        Commands::Resize(args) => run_resize(args),
        Commands::Crop(args) => run_crop(args),
    }
}

fn run_gif(args: GifArgs) -> Result<()> {
    let fill = args
        .fill
        .as_deref()
        .map(parse_color)
        .transpose()
        .context("Invalid fill color")?;

    println!("Converting video: {}", args.input.display());
    let mut source = FfmpegSource::open(&args.input).context("Failed to open video source")?;
    let info = source.info();
    println!(
        "Video info: {}x{}, {:.2} s",
        info.width, info.height, info.duration_sec
    );

    let printer = RefCell::new(ProgressPrinter::new("converting", 5));
    let bytes = if args.single {
        let options = GifOptions {
            width: args.width,
            height: args.height,
            max_width: args.max_width,
            max_height: args.max_height,
            fit: args.fit.into(),
            fps: args.fps,
            target_duration_sec: args.duration_sec,
            sample_span: args.span.into(),
            quality: args.quality,
            workers: args.workers,
            fill,
        };
        convert_video_to_gif(&mut source, &options, &mut |p| {
            printer.borrow_mut().update(p);
        })
        .context("GIF conversion failed")?
    } else {
        let ladder = match &args.ladder {
            Some(path) => load_ladder(path)?,
            None => default_ladder(),
        };
        transcode_to_budget(
            &mut source,
            &ladder,
            args.budget_kb * 1024,
            args.workers,
            |attempt, total| {
                println!("Converting GIF (compression attempt {attempt}/{total})...");
                printer.borrow_mut().start_phase("converting");
            },
            &mut |p| {
                printer.borrow_mut().update(p);
            },
        )
        .context("GIF conversion failed")?
    };

    std::fs::write(&args.output, &bytes).context("Failed to write output file")?;
    println!(
        "Successfully wrote {} ({} KB)",
        args.output.display(),
        bytes.len() / 1024
    );
    Ok(())
}

fn run_resize(args: ResizeArgs) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("No input images given");
    }
    let fill = args
        .fill
        .as_deref()
        .map(parse_color)
        .transpose()
        .context("Invalid fill color")?;

    let mut outputs: Vec<(String, Vec<u8>)> = Vec::new();
    for input in &args.inputs {
        let image = image::open(input)
            .with_context(|| format!("Failed to open image '{}'", input.display()))?
            .to_rgba8();
        let resized = resize_still(&image, args.width, args.height, !args.stretch, fill)?;
        let format = StillFormat::for_source(input);
        let bytes = encode_still(&resized, format)?;

        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
        let name = format!(
            "{}_{}x{}.{}",
            stem,
            args.width,
            args.height,
            format.extension()
        );
        outputs.push((name, bytes));
    }

    if let Some(zip_path) = &args.zip {
        write_zip(zip_path, &outputs)?;
        println!(
            "Packaged {} images into {}",
            outputs.len(),
            zip_path.display()
        );
    } else {
        std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;
        for (name, bytes) in &outputs {
            let path = args.output.join(name);
            std::fs::write(&path, bytes)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn run_crop(args: CropArgs) -> Result<()> {
    let image = image::open(&args.input)
        .with_context(|| format!("Failed to open image '{}'", args.input.display()))?
        .to_rgba8();
    let region = args.region.as_deref().map(parse_region).transpose()?;

    let cropped = crop_still(&image, args.width, args.height, region)?;
    let format = StillFormat::for_source(&args.input);
    let bytes = encode_still(&cropped, format)?;

    std::fs::write(&args.output, &bytes).context("Failed to write output file")?;
    println!(
        "Wrote {} ({}x{})",
        args.output.display(),
        args.width,
        args.height
    );
    Ok(())
}

fn load_ladder(path: &Path) -> Result<Vec<CompressionStep>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ladder file '{}'", path.display()))?;
    let ladder: Vec<CompressionStep> =
        serde_json::from_str(&text).context("Failed to parse ladder JSON")?;
    if ladder.is_empty() {
        bail!("Ladder file contains no steps");
    }
    Ok(ladder)
}

fn parse_region(text: &str) -> Result<CropRegion> {
    let parts: Vec<u32> = text
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .context("Invalid crop region, expected 'x,y,width,height'")?;
    if parts.len() != 4 {
        bail!("Invalid crop region, expected 'x,y,width,height'");
    }
    Ok(CropRegion::new(parts[0], parts[1], parts[2], parts[3]))
}

fn write_zip(path: &Path, files: &[(String, Vec<u8>)]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create archive '{}'", path.display()))?;
    let mut archive = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, bytes) in files {
        archive.start_file(name.as_str(), options)?;
        archive.write_all(bytes)?;
    }
    archive.finish()?;
    Ok(())
}
