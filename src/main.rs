use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use letterbox::export::OverlayRenderer;
use letterbox::ocr::{OcrEngine, RecordedOcr, SourceImage, TesseractCli};
use letterbox::pipeline::{
    build_document, export_document, reconcile_output, ExportFormat, PipelineConfig,
};
use letterbox::reconcile::{PositionalReconciler, Reconciliation};
use letterbox::server::{serve, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "letterbox")]
#[command(
    version,
    about = "Overlay OCR text on its source image, character by character",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct OcrArgs {
    /// Tesseract language(s), e.g. `eng` or `nld+eng`
    #[arg(short, long, default_value = "eng")]
    lang: String,

    /// Directory holding the tessdata language files
    #[arg(long)]
    tessdata: Option<PathBuf>,
}

impl OcrArgs {
    fn engine(&self) -> TesseractCli {
        TesseractCli::new()
            .with_lang(self.lang.clone())
            .with_tessdata_dir(self.tessdata.clone())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run tesseract on an image and write the reconciled layout
    Render {
        /// Input image path
        image: PathBuf,

        /// Output directory (default: ./<image_name>_letterbox)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format(s) to generate
        #[arg(short, long, value_enum, default_values_t = vec![Format::Html, Format::Json])]
        format: Vec<Format>,

        #[command(flatten)]
        ocr: OcrArgs,

        /// Box entries to scan ahead after a mismatch (0 = drop and move on)
        #[arg(long, default_value_t = 0)]
        lookahead: usize,

        /// Only print errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Reconcile a recorded text file and box file without running OCR
    Reconcile {
        /// Recognized text, as written by `tesseract <img> <base>`
        #[arg(long)]
        text: PathBuf,

        /// Box file, as written by `tesseract <img> <base> makebox`
        #[arg(long)]
        boxes: PathBuf,

        /// Image name recorded in the layout (default: text file stem + .png)
        #[arg(long)]
        image_name: Option<String>,

        /// Engine version recorded in the layout
        #[arg(long, default_value = "recorded")]
        engine_version: String,

        /// Output directory (default: ./<text_stem>_letterbox)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format(s) to generate
        #[arg(short, long, value_enum, default_values_t = vec![Format::Json])]
        format: Vec<Format>,

        #[arg(long, default_value_t = 0)]
        lookahead: usize,

        #[arg(short, long)]
        quiet: bool,
    },

    /// Serve the overlay page and the source image over HTTP
    Serve {
        /// Directory served under /files/
        #[arg(long, default_value = "files")]
        files: PathBuf,

        /// Image inside the files directory to recognize on every request
        #[arg(long)]
        image: String,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:1234")]
        addr: SocketAddr,

        #[command(flatten)]
        ocr: OcrArgs,

        #[arg(long, default_value_t = 0)]
        lookahead: usize,
    },

    /// Show the OCR engine version and, optionally, an image's size
    Info {
        /// Image to inspect
        image: Option<PathBuf>,

        #[command(flatten)]
        ocr: OcrArgs,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    Json,
    Html,
    Text,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ExportFormat::Json,
            Format::Html => ExportFormat::Html,
            Format::Text => ExportFormat::Text,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            image,
            output,
            format,
            ocr,
            lookahead,
            quiet,
        } => render_image(image, output, format, ocr, lookahead, quiet),
        Commands::Reconcile {
            text,
            boxes,
            image_name,
            engine_version,
            output,
            format,
            lookahead,
            quiet,
        } => reconcile_recorded(
            text,
            boxes,
            image_name,
            engine_version,
            output,
            format,
            lookahead,
            quiet,
        ),
        Commands::Serve {
            files,
            image,
            addr,
            ocr,
            lookahead,
        } => serve_http(files, image, addr, ocr, lookahead),
        Commands::Info { image, ocr } => show_info(image, ocr),
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    PathBuf::from(format!("{stem}_letterbox"))
}

fn render_image(
    image: PathBuf,
    output: Option<PathBuf>,
    formats: Vec<Format>,
    ocr: OcrArgs,
    lookahead: usize,
    quiet: bool,
) -> Result<()> {
    if !image.is_file() {
        anyhow::bail!("Input image does not exist: {}", image.display());
    }

    let output_dir = output.unwrap_or_else(|| default_output(&image));

    if !quiet {
        println!("[*] Processing: {}", image.display());
        println!("[*] Output: {}", output_dir.display());
        println!("[*] Language: {}", ocr.lang);
    }

    let config = PipelineConfig::new(image.clone()).with_lookahead(lookahead);
    let reconciliation = build_document(&config, &ocr.engine())
        .with_context(|| format!("Failed to process image: {}", image.display()))?;

    // overlay.html lands in the output dir; load the image from where it lives
    let image_dir = image
        .canonicalize()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.display().to_string()))
        .unwrap_or_else(|| ".".to_string());
    let renderer = OverlayRenderer::new(format!("file://{image_dir}"));

    finish(&reconciliation, &output_dir, &formats, &renderer, quiet)
}

#[allow(clippy::too_many_arguments)]
fn reconcile_recorded(
    text: PathBuf,
    boxes: PathBuf,
    image_name: Option<String>,
    engine_version: String,
    output: Option<PathBuf>,
    formats: Vec<Format>,
    lookahead: usize,
    quiet: bool,
) -> Result<()> {
    let image_name = image_name.unwrap_or_else(|| {
        let stem = text
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());
        format!("{stem}.png")
    });
    let output_dir = output.unwrap_or_else(|| default_output(&text));

    if !quiet {
        println!("[*] Text: {}", text.display());
        println!("[*] Boxes: {}", boxes.display());
        println!("[*] Output: {}", output_dir.display());
    }

    let recorded = RecordedOcr::new(text, boxes).with_engine_version(engine_version);
    let ocr_output = recorded.load(&image_name)?;
    let reconciler = PositionalReconciler::new().with_lookahead(lookahead);
    let reconciliation = reconcile_output(&reconciler, &ocr_output)?;

    finish(&reconciliation, &output_dir, &formats, &OverlayRenderer::new("."), quiet)
}

fn finish(
    reconciliation: &Reconciliation,
    output_dir: &Path,
    formats: &[Format],
    renderer: &OverlayRenderer,
    quiet: bool,
) -> Result<()> {
    let formats: Vec<ExportFormat> = formats.iter().copied().map(ExportFormat::from).collect();
    export_document(reconciliation, output_dir, &formats, renderer)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    if !quiet {
        let document = &reconciliation.document;
        println!(
            "[+] {} line(s), {} character(s) placed",
            document.lines.len(),
            document.char_count()
        );
        for mismatch in &reconciliation.mismatches {
            let outcome = if mismatch.resynced {
                "skipped box"
            } else {
                "omitted"
            };
            println!(
                "  [!] line {} column {}: text has '{}', box has '{}' ({outcome})",
                mismatch.line, mismatch.column, mismatch.expected, mismatch.found
            );
        }
        println!("\n[✓] Done! Results saved to: {}", output_dir.display());
    }

    Ok(())
}

fn serve_http(
    files: PathBuf,
    image: String,
    addr: SocketAddr,
    ocr: OcrArgs,
    lookahead: usize,
) -> Result<()> {
    if !files.is_dir() {
        anyhow::bail!("Files directory does not exist: {}", files.display());
    }

    let config = ServerConfig::new(files, image)
        .with_addr(addr)
        .with_lookahead(lookahead);
    let engine = Arc::new(ocr.engine());

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(serve(config, engine))
}

fn show_info(image: Option<PathBuf>, ocr: OcrArgs) -> Result<()> {
    let engine = ocr.engine();
    let version = engine.version()?;

    println!("OCR Engine");
    println!("==========");
    println!("Version: {}", version);
    println!("Language: {}", engine.lang());

    if let Some(path) = image {
        let image = SourceImage::open(&path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?;
        let (width, height) = image.dimensions();
        println!();
        println!("Image: {}", path.display());
        println!("Size: {}x{}", width, height);
    }

    Ok(())
}
