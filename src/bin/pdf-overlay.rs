//! CLI binary for pdf-overlay.
//!
//! A thin shim over the library crate: `serve` runs the HTTP API, `stamp`
//! processes files and URLs directly, `inspect` prints document metadata.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_overlay::{
    inspect, stamp_batch, stamp_to_file, HeaderTemplate, OverlayConfig, ProgressCallback,
    Recipient, ServerConfig, StampProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Batch progress bar. Files finish out of order, so each line names its
/// input rather than a position.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Stamping");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl StampProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Stamping {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, input: &str, _total: usize) {
        self.bar.set_message(input.to_string());
    }

    fn on_file_complete(&self, input: &str, _total: usize, bytes_written: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            input,
            dim(&format!("{:.1} KiB", bytes_written as f64 / 1024.0)),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, input: &str, _total: usize, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), input, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_files.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} file(s) stamped",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) stamped  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API on 0.0.0.0:8000
  pdf-overlay serve

  # Upload a document
  curl -X POST http://localhost:8000/process-pdf/ \
    -F "pdf_file=@relatorio.pdf" -F "nome=Maria Silva" -F "telefone=11 91234-5678" \
    -o modified_relatorio.pdf

  # Stamp a local file (writes modified_relatorio.pdf)
  pdf-overlay stamp relatorio.pdf --name "Maria Silva" --phone "11 91234-5678"

  # Stamp several files into a directory
  pdf-overlay stamp a.pdf b.pdf https://example.com/c.pdf --name Ana --phone 123 --output-dir out/

  # Custom header layout
  pdf-overlay serve --template header.json

  # Document metadata as JSON
  pdf-overlay inspect relatorio.pdf --json

TEMPLATE FILE:
  {"blocks": [{"font": "helvetica-bold", "size": 14, "lines": ["Title"], "gap_after": 36},
              {"font": "helvetica", "size": 12, "lines": ["Nome: {name}", "Data: {date}"]}]}
  Placeholders: {name} {phone} {date}

ENVIRONMENT VARIABLES:
  PDF_OVERLAY_HOST         Bind address for `serve` (default 0.0.0.0)
  PDF_OVERLAY_PORT         Port for `serve` (default 8000)
  PDF_OVERLAY_TEMPLATE     Header template JSON file
  PDF_OVERLAY_TIMEZONE     IANA zone for {date} (default America/Sao_Paulo)
  RUST_LOG                 Overrides -v / -q
"#;

/// Stamp a personalised header onto the cover page of PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-overlay",
    version,
    about = "Stamp a personalised header onto the cover page of PDF documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF_OVERLAY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF_OVERLAY_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Bind address.
        #[arg(long, env = "PDF_OVERLAY_HOST", default_value = "0.0.0.0")]
        host: String,

        /// TCP port.
        #[arg(long, env = "PDF_OVERLAY_PORT", default_value_t = 8000)]
        port: u16,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "PDF_OVERLAY_MAX_UPLOAD_MB", default_value_t = 25,
              value_parser = clap::value_parser!(u64).range(1..=1024))]
        max_upload_mb: u64,

        #[command(flatten)]
        overlay: OverlayArgs,
    },

    /// Stamp local files or URLs.
    Stamp {
        /// Local PDF file paths or HTTP/HTTPS URLs.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Recipient name ({name}).
        #[arg(long)]
        name: String,

        /// Recipient phone number ({phone}).
        #[arg(long)]
        phone: String,

        /// Output file (single input only).
        #[arg(short, long, conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Directory for `modified_<name>` outputs. Default: current directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of files stamped at once.
        #[arg(short, long, env = "PDF_OVERLAY_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// HTTP download timeout in seconds.
        #[arg(long, env = "PDF_OVERLAY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,

        /// Disable progress bar.
        #[arg(long, env = "PDF_OVERLAY_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        overlay: OverlayArgs,
    },

    /// Print PDF metadata.
    Inspect {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,

        /// HTTP download timeout in seconds.
        #[arg(long, env = "PDF_OVERLAY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,
    },
}

/// Header options shared by `serve` and `stamp`.
#[derive(Args, Debug)]
struct OverlayArgs {
    /// JSON header template file.
    #[arg(long, env = "PDF_OVERLAY_TEMPLATE")]
    template: Option<PathBuf>,

    /// IANA time zone for the {date} placeholder.
    #[arg(long, env = "PDF_OVERLAY_TIMEZONE", default_value = "America/Sao_Paulo")]
    timezone: String,

    /// strftime pattern for the {date} placeholder.
    #[arg(long, env = "PDF_OVERLAY_DATE_FORMAT", default_value = "%d/%m/%Y")]
    date_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // `serve` logs requests at INFO; `stamp` relies on the progress bar.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        match cli.command {
            Command::Serve { .. } => "info,tower_http=info",
            _ => "warn",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            host,
            port,
            max_upload_mb,
            overlay,
        } => {
            let config = build_config(&overlay, None, 1, 120)?;
            let server = ServerConfig {
                host,
                port,
                max_upload_bytes: (max_upload_mb * 1024 * 1024) as usize,
            };
            pdf_overlay::server::serve(server, config)
                .await
                .context("HTTP server failed")?;
        }

        Command::Stamp {
            inputs,
            name,
            phone,
            output,
            output_dir,
            concurrency,
            download_timeout,
            no_progress,
            overlay,
        } => {
            let recipient = Recipient::new(name, phone);

            if let Some(output_path) = output {
                if inputs.len() > 1 {
                    anyhow::bail!("--output takes a single input; use --output-dir for several");
                }
                let config = build_config(&overlay, None, concurrency, download_timeout)?;
                let stats = stamp_to_file(&inputs[0], &output_path, &recipient, &config)
                    .await
                    .context("Stamping failed")?;
                if !cli.quiet {
                    eprintln!(
                        "{}  {} line(s)  {} page(s)  {}ms  →  {}",
                        green("✔"),
                        stats.lines_drawn,
                        stats.page_count,
                        stats.duration_ms,
                        bold(&output_path.display().to_string()),
                    );
                    if stats.dropped_chars > 0 {
                        eprintln!(
                            "   {} character(s) not representable in the header fonts were dropped",
                            cyan(&stats.dropped_chars.to_string())
                        );
                    }
                }
                return Ok(());
            }

            let show_progress = !cli.quiet && !no_progress && inputs.len() > 1;
            let progress_cb: Option<ProgressCallback> = if show_progress {
                let cb = CliProgressCallback::new();
                Some(cb as Arc<dyn StampProgressCallback>)
            } else {
                None
            };
            let config = build_config(&overlay, progress_cb, concurrency, download_timeout)?;
            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("."));

            let batch = stamp_batch(&inputs, &output_dir, &recipient, &config)
                .await
                .context("Stamping failed")?;

            if !cli.quiet && !show_progress {
                for item in &batch.items {
                    match (&item.output_path, &item.error) {
                        (Some(path), None) => {
                            eprintln!("{}  {}  →  {}", green("✔"), item.input, bold(&path.display().to_string()))
                        }
                        (_, Some(e)) => eprintln!("{}  {}", red("✘"), e),
                        _ => {}
                    }
                }
            }
            if batch.failed() > 0 {
                anyhow::bail!("{}/{} input(s) failed", batch.failed(), batch.items.len());
            }
        }

        Command::Inspect {
            input,
            json,
            download_timeout,
        } => {
            let meta = inspect(&input, download_timeout)
                .await
                .context("Failed to inspect PDF")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
                );
            } else {
                println!("File:         {}", input);
                if let Some(ref t) = meta.title {
                    println!("Title:        {}", t);
                }
                if let Some(ref a) = meta.author {
                    println!("Author:       {}", a);
                }
                if let Some(ref s) = meta.subject {
                    println!("Subject:      {}", s);
                }
                println!("Pages:        {}", meta.page_count);
                println!("PDF Version:  {}", meta.pdf_version);
                println!("Encrypted:    {}", meta.is_encrypted);
                if let Some(ref p) = meta.producer {
                    println!("Producer:     {}", p);
                }
                if let Some(ref c) = meta.creator {
                    println!("Creator:      {}", c);
                }
            }
        }
    }

    Ok(())
}

/// Map CLI args to `OverlayConfig`.
fn build_config(
    args: &OverlayArgs,
    progress: Option<ProgressCallback>,
    concurrency: usize,
    download_timeout: u64,
) -> Result<OverlayConfig> {
    let mut builder = OverlayConfig::builder()
        .timezone(args.timezone.clone())
        .date_format(args.date_format.clone())
        .concurrency(concurrency)
        .download_timeout_secs(download_timeout);

    if let Some(ref path) = args.template {
        let template = HeaderTemplate::from_json_file(path)
            .with_context(|| format!("Failed to load header template from {:?}", path))?;
        builder = builder.template(template);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
