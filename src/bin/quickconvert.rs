//! CLI binary for quickconvert.
//!
//! `serve` runs the HTTP service; `convert` and `qr` run a single
//! conversion locally and print where the artifact went.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use quickconvert::server;
use quickconvert::{
    convert_paths, generate, ConversionKind, ConversionOutput, LogoOutcome, QrOutcome,
    ServiceConfig,
};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the web service on $PORT (default 5000)
  quickconvert serve

  # Convert one file
  quickconvert convert --type "pdf to word" report.pdf -o out/

  # Bundle several files
  quickconvert convert --type zip a.txt b.png c.pdf

  # QR code with a centred logo
  quickconvert qr https://example.com --logo logo.png -o example_qr.png

CONVERSION TYPES:
  PDF TO WORD, WORD TO PDF, PPT TO PDF, EXCEL TO PDF, PDF TO IMAGE,
  IMAGE TO PDF, TEXT TO PDF, WORD TO TEXT, ZIP, LINK TO QR CODE
  (case-insensitive; '-', '_' and '+' may replace spaces)

ENVIRONMENT VARIABLES:
  PORT                      Listening port for `serve`
  QUICKCONVERT_UPLOAD_DIR   Staging directory for uploads
  QUICKCONVERT_OUTPUT_DIR   Directory for produced files
  QUICKCONVERT_LOGO         Default QR logo
  QUICKCONVERT_OFFICE_BIN   LibreOffice executable (default: libreoffice)
  QUICKCONVERT_PDFIUM_LIB   Directory holding libpdfium
  RUST_LOG                  Overrides the log filter
"#;

/// File conversion service and command-line converter.
#[derive(Parser, Debug)]
#[command(
    name = "quickconvert",
    version,
    about = "Convert PDF, Word, PowerPoint, Excel, image and text files; make logo-badged QR codes",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "QUICKCONVERT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "QUICKCONVERT_QUIET")]
    quiet: bool,

    /// Print the result as JSON.
    #[arg(long, global = true, env = "QUICKCONVERT_JSON")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Convert local files.
    Convert(ConvertArgs),
    /// Generate a QR code PNG from a link.
    Qr(QrArgs),
}

/// Settings shared by every subcommand.
#[derive(Args, Debug)]
struct ServiceArgs {
    /// Directory where uploads are staged.
    #[arg(long, env = "QUICKCONVERT_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Default logo for QR codes when none is uploaded.
    #[arg(long = "logo", env = "QUICKCONVERT_LOGO")]
    logo: Option<PathBuf>,

    /// LibreOffice executable used for office → PDF.
    #[arg(long, env = "QUICKCONVERT_OFFICE_BIN", default_value = "libreoffice")]
    office_bin: String,

    /// Seconds before a LibreOffice run is killed.
    #[arg(long, env = "QUICKCONVERT_OFFICE_TIMEOUT", default_value_t = 120)]
    office_timeout: u64,

    /// Directory holding the pdfium shared library.
    #[arg(long, env = "QUICKCONVERT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Longest edge, in pixels, of PDF page renders.
    #[arg(long, env = "QUICKCONVERT_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "QUICKCONVERT_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Interface to bind.
    #[arg(long, env = "QUICKCONVERT_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Directory for produced files.
    #[arg(long, env = "QUICKCONVERT_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Keep produced files after they have been sent.
    #[arg(long, env = "QUICKCONVERT_RETAIN_OUTPUTS")]
    retain_outputs: bool,

    /// Maximum upload size in MiB.
    #[arg(long, env = "QUICKCONVERT_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Conversion type, e.g. "pdf to word" or PDF-TO-IMAGE.
    #[arg(short = 't', long = "type")]
    kind: ConversionKind,

    /// Input files. Only ZIP uses more than the first.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory.
    #[arg(short, long, env = "QUICKCONVERT_OUTPUT_DIR", default_value = ".")]
    output: PathBuf,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args, Debug)]
struct QrArgs {
    /// Link or text to encode. Empty encodes the fallback URL.
    payload: String,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    service: ServiceArgs,
}

impl ServiceArgs {
    fn config(&self, output_dir: PathBuf) -> Result<quickconvert::ServiceConfigBuilder> {
        let mut builder = ServiceConfig::builder()
            .upload_dir(&self.upload_dir)
            .output_dir(output_dir)
            .office_binary(self.office_bin.clone())
            .office_timeout_secs(self.office_timeout)
            .max_rendered_pixels(self.max_pixels)
            .jpeg_quality(self.jpeg_quality);
        if let Some(ref logo) = self.logo {
            if !logo.exists() {
                bail!("Default logo not found: {}", logo.display());
            }
            builder = builder.default_logo(logo);
        }
        if let Some(ref dir) = self.pdfium_lib {
            builder = builder.pdfium_library_path(dir);
        }
        Ok(builder)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback a one-shot conversion needs, so
    // library INFO logs are only shown for `serve` or with --verbose.
    let is_serve = matches!(cli.command, Command::Serve(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || (!is_serve && !cli.json) {
        "error"
    } else {
        "info,tower_http=debug"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let show_progress = !cli.quiet && !cli.json;
    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args, show_progress, cli.json, cli.quiet).await,
        Command::Qr(args) => run_qr(args, show_progress, cli.json, cli.quiet).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args
        .service
        .config(args.output_dir.clone())?
        .retain_outputs(args.retain_outputs)
        .max_upload_bytes(args.max_upload_mb.max(1) * 1024 * 1024)
        .build()
        .context("Invalid configuration")?;
    let addr = SocketAddr::new(args.host, args.port);
    server::serve(config, addr)
        .await
        .with_context(|| format!("Server on {addr} failed"))
}

async fn run_convert(args: ConvertArgs, show_progress: bool, json: bool, quiet: bool) -> Result<()> {
    let config = args
        .service
        .config(args.output.clone())?
        .build()
        .context("Invalid configuration")?;

    let spinner = show_progress.then(|| spinner(&args.kind.to_string()));
    let result = convert_paths(args.kind, &args.files, None, &config).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let output = result.with_context(|| format!("{} failed", args.kind))?;

    report_conversion(&output, json, quiet)
}

async fn run_qr(args: QrArgs, show_progress: bool, json: bool, quiet: bool) -> Result<()> {
    let output_dir = args
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = args
        .service
        .config(output_dir.clone())?
        .build()
        .context("Invalid configuration")?;
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let spinner = show_progress.then(|| spinner("QR code"));
    let start = Instant::now();
    let payload = args.payload.trim().to_string();
    let output_path = args.output.clone();
    let logo = config.default_logo.clone();
    let style = config.qr.clone();
    let result = tokio::task::spawn_blocking(move || {
        generate(&payload, logo.as_deref(), &output_path, &style)
    })
    .await
    .context("QR task panicked")?;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let outcome = result.context("QR generation failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise output")?
        );
    } else if !quiet {
        eprintln!(
            "{}  {}x{} px, version {}  {}ms  →  {}",
            green("✔"),
            outcome.width,
            outcome.height,
            outcome.version,
            start.elapsed().as_millis(),
            bold(&args.output.display().to_string()),
        );
        report_logo(&outcome);
    }
    Ok(())
}

fn report_conversion(output: &ConversionOutput, json: bool, quiet: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(output).context("Failed to serialise output")?
        );
        return Ok(());
    }
    if !quiet {
        eprintln!(
            "{}  {}  {}  {}ms  →  {}",
            green("✔"),
            output.kind,
            dim(&format!("{} bytes", output.size_bytes)),
            output.duration_ms,
            bold(&output.path.display().to_string()),
        );
        if let Some(ref qr) = output.qr {
            report_logo(qr);
        }
    }
    Ok(())
}

fn report_logo(outcome: &QrOutcome) {
    match &outcome.logo {
        LogoOutcome::Failed(e) => eprintln!("   {} logo not embedded: {}", red("✗"), e),
        LogoOutcome::Skipped { path } => {
            eprintln!("   {} logo {} not found", dim("–"), path.display())
        }
        LogoOutcome::Embedded(badge) => eprintln!(
            "   {} logo {}x{} in a {}x{} badge",
            dim("◆"),
            badge.logo_width,
            badge.logo_height,
            badge.width,
            badge.height
        ),
        LogoOutcome::None => {}
    }
}

fn spinner(label: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Converting");
    bar.set_message(label.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
