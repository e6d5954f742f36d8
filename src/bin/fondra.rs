use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{RngCore as _, SeedableRng};

use fondra::{
    BatchOptions, BatchTask, GenerationConfig, GenerationPipeline, ImageRgb, Pattern, run_batch,
};

#[derive(Parser, Debug)]
#[command(name = "fondra", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single background image as a PNG.
    Generate(GenerateArgs),
    /// Render a batch of randomized backgrounds in parallel.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Image width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Optional config JSON; command-line flags override its dimensions.
    #[arg(long = "config")]
    config_path: Option<PathBuf>,

    /// Gradient pattern name (unknown names fall back to four_corner).
    #[arg(long)]
    pattern: Option<String>,

    /// Determinism seed.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Number of images to render.
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Output directory for the PNGs.
    #[arg(long)]
    out_dir: PathBuf,

    /// Image width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Worker threads (defaults to core count, capped at 8).
    #[arg(long)]
    workers: Option<usize>,

    /// Batch seed; task i renders with seed + i.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn read_config_json(path: &Path) -> anyhow::Result<GenerationConfig> {
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let r = BufReader::new(f);
    let config: GenerationConfig =
        serde_json::from_reader(r).with_context(|| "parse config JSON")?;
    Ok(config)
}

fn save_png(img: &ImageRgb, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &img.data,
        img.width,
        img.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = match &args.config_path {
        Some(path) => read_config_json(path)?,
        None => GenerationConfig::new(args.width, args.height),
    };
    if args.config_path.is_some() {
        config.width = args.width;
        config.height = args.height;
    }
    if let Some(name) = &args.pattern {
        config.pattern = Some(Pattern::from_name(name));
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let img = GenerationPipeline::new(config)?.run()?;
    save_png(&img, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let tasks: Vec<BatchTask> = (0..args.count)
        .map(|index| {
            let mut config = GenerationConfig::randomized(args.width, args.height, &mut rng);
            config.seed = Some(match args.seed {
                Some(seed) => seed.wrapping_add(index as u64),
                None => rng.next_u64(),
            });
            let dest = args
                .out_dir
                .join(format!("{}_{index:04}.png", config.style.as_str()))
                .display()
                .to_string();
            BatchTask {
                config,
                dest,
                index,
            }
        })
        .collect();

    let options = BatchOptions {
        workers: args.workers,
        ..Default::default()
    };
    let (reports, stats) = run_batch(tasks, &options, |done, total| {
        eprintln!("rendered {done}/{total}");
    })?;

    for report in &reports {
        match &report.outcome {
            Ok(img) => save_png(img, Path::new(&report.dest))?,
            Err(err) => eprintln!("task {} failed: {err}", report.index),
        }
    }

    eprintln!(
        "batch finished: {}/{} ok, {} failed",
        stats.completed, stats.total, stats.failed
    );
    Ok(())
}
