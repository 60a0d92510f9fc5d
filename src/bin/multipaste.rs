use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use multipaste::{
    Element, Image, ImageBatch, ImageShape, MultiPaste, PasteArgs, PasteBackend, PasteOpts,
    PasteThreading, convert_sat,
};

#[derive(Parser, Debug)]
#[command(name = "multipaste", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a batch and write one PNG per sample.
    Compose(ComposeArgs),
    /// Print output shapes and scratch sizes for a batch as JSON.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct EngineArgs {
    /// Execution backend.
    #[arg(long, value_enum, default_value_t = BackendArg::Launch)]
    backend: BackendArg,

    /// Run on the calling thread only.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Block rows for the launch backend.
    #[arg(long, default_value_t = 32)]
    block_rows: usize,

    /// Block columns (flattened elements) for the launch backend.
    #[arg(long, default_value_t = 256)]
    block_cols: usize,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input batch JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `sample_NNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input batch JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Scheduled,
    Launch,
}

/// Batch file: input PNGs (relative to the file) plus the paste arguments.
#[derive(serde::Deserialize, Debug)]
struct BatchFile {
    inputs: Vec<PathBuf>,
    /// Channels to decode every input to (1, 3 or 4).
    #[serde(default = "default_channels")]
    channels: usize,
    #[serde(flatten)]
    args: PasteArgs,
}

fn default_channels() -> usize {
    4
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let batch = read_batch(&args.in_path)?;
    let root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let inputs = load_inputs(root, &batch)?;

    let mut engine = MultiPaste::new(engine_opts(&args.engine))?;
    let outputs = engine.paste(&inputs, &batch.args)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let images = match &outputs {
        ImageBatch::U8(v) => v.clone(),
        ImageBatch::I16(v) => to_u8(v),
        ImageBatch::I32(v) => to_u8(v),
        ImageBatch::F32(v) => to_u8(v),
    };
    for (i, img) in images.iter().enumerate() {
        let path = args.out_dir.join(format!("sample_{i:04}.png"));
        if img.shape.is_empty() {
            eprintln!("skipped {} (empty canvas)", path.display());
            continue;
        }
        write_png(&path, img)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let batch = read_batch(&args.in_path)?;
    let root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let shapes = batch
        .inputs
        .iter()
        .map(|p| {
            let path = root.join(p);
            let (width, height) = image::image_dimensions(&path)
                .with_context(|| format!("read image header '{}'", path.display()))?;
            Ok(ImageShape::new(height as usize, width as usize, batch.channels))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let engine = MultiPaste::new(engine_opts(&args.engine))?;
    let setup = engine.setup(multipaste::ElementType::U8, &shapes, &batch.args)?;
    let req = setup.requirements();
    let lens = [
        req.scratch.sample_descs.len(),
        req.scratch.grid_cells.len(),
        req.scratch.work_blocks.len(),
    ];
    let scratch = req
        .scratch
        .entries()
        .into_iter()
        .zip(lens)
        .map(|((name, bytes), len)| {
            (
                name.to_owned(),
                serde_json::json!({ "entries": len, "bytes": bytes }),
            )
        })
        .collect::<serde_json::Map<_, _>>();
    let report = serde_json::json!({
        "backend": setup.backend(),
        "output_type": req.output_type,
        "output_shapes": req.output_shapes,
        "scratch": scratch,
        "scratch_bytes": req.scratch.total_bytes(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn engine_opts(args: &EngineArgs) -> PasteOpts {
    PasteOpts {
        backend: match args.backend {
            BackendArg::Scheduled => PasteBackend::Scheduled,
            BackendArg::Launch => PasteBackend::Launch,
        },
        threading: PasteThreading {
            parallel: !args.sequential,
            threads: args.threads,
        },
        block: multipaste::BlockShape {
            rows: args.block_rows,
            cols: args.block_cols,
        },
        validate_grids: false,
    }
}

fn read_batch(path: &Path) -> anyhow::Result<BatchFile> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read batch '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse batch '{}'", path.display()))
}

fn load_inputs(root: &Path, batch: &BatchFile) -> anyhow::Result<ImageBatch> {
    let images = batch
        .inputs
        .iter()
        .map(|p| {
            let path = root.join(p);
            let img = image::open(&path)
                .with_context(|| format!("decode image '{}'", path.display()))?;
            let (width, height) = (img.width() as usize, img.height() as usize);
            let data = match batch.channels {
                1 => img.into_luma8().into_raw(),
                3 => img.into_rgb8().into_raw(),
                4 => img.into_rgba8().into_raw(),
                n => anyhow::bail!("unsupported channel count {n} (expected 1, 3 or 4)"),
            };
            Ok(Image::new(ImageShape::new(height, width, batch.channels), data)?)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(ImageBatch::U8(images))
}

fn to_u8<T: Element>(images: &[Image<T>]) -> Vec<Image<u8>> {
    images
        .iter()
        .map(|img| Image {
            shape: img.shape,
            data: img.data.iter().map(|&v| convert_sat(v)).collect(),
        })
        .collect()
}

fn write_png(path: &Path, img: &Image<u8>) -> anyhow::Result<()> {
    let color = match img.shape.channels {
        1 => image::ColorType::L8,
        3 => image::ColorType::Rgb8,
        4 => image::ColorType::Rgba8,
        n => anyhow::bail!("cannot write {n}-channel image as png"),
    };
    let width = u32::try_from(img.shape.width).context("output width exceeds u32")?;
    let height = u32::try_from(img.shape.height).context("output height exceeds u32")?;
    image::save_buffer_with_format(
        path,
        &img.data,
        width,
        height,
        color,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
