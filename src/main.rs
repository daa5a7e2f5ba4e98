//! PDF title patching CLI.
//!
//! Replaces a literal string on the first page of every PDF in a directory
//! and writes the results to an output directory.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use retitle::config::{DEFAULT_ACCENT, DEFAULT_NEW_TEXT, DEFAULT_OLD_TEXT};
use retitle::{
    extract_text_from_pdf, first_page_text, BatchRunner, FallbackOrder, FallbackPipeline,
    ReplacementConfig, Rgb, StrategyId,
};

/// PDF title patcher
///
/// Replaces text on the first page of each PDF in a directory, trying
/// several methods in turn. Use the 'extract' subcommand to inspect a file.
#[derive(Parser)]
#[command(name = "retitle")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory containing the PDF files to patch
    #[arg(short, long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Output directory (defaults to <input-dir>/processed)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Method to start with; later methods are tried if it fails
    /// (clean, minimal, direct, overlay, precise, standard, simple)
    #[arg(short, long, default_value = "clean", conflicts_with = "simple")]
    method: StrategyId,

    /// Try only the selected method, with no fallback
    #[arg(long)]
    only: bool,

    /// Only draw the watermark (same as --method simple)
    #[arg(long)]
    simple: bool,

    /// Text to replace
    #[arg(long, default_value = DEFAULT_OLD_TEXT)]
    old_text: String,

    /// Replacement text
    #[arg(long, default_value = DEFAULT_NEW_TEXT)]
    new_text: String,

    /// Colour of replaced text (#rrggbb)
    #[arg(long, default_value = DEFAULT_ACCENT)]
    accent: String,

    /// Number of files processed in parallel
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Also write the log to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the visible text of the first page (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Text of the whole document as extracted by pdf-extract
        #[arg(long)]
        raw: bool,
    },
}

/// Command handler.
struct Handler {
    verbose: bool,
}

impl Handler {
    fn process(&self, cli: &Cli, input_dir: &Path) -> Result<()> {
        let output_dir = cli
            .output_dir
            .clone()
            .unwrap_or_else(|| input_dir.join("processed"));
        let accent = Rgb::from_hex(&cli.accent).context("Invalid --accent")?;
        let config =
            ReplacementConfig::new(cli.old_text.clone(), cli.new_text.clone()).with_accent(accent);
        config.validate().context("Invalid replacement settings")?;

        let method = if cli.simple {
            StrategyId::Simple
        } else {
            cli.method
        };
        let order = if cli.only {
            FallbackOrder::only(method)
        } else {
            FallbackOrder::starting_at(method)
        };

        if self.verbose {
            println!("Input:  {}", input_dir.display());
            println!("Output: {}", output_dir.display());
            let methods: Vec<String> = order.ids().iter().map(ToString::to_string).collect();
            println!("Methods: {}", methods.join(" → "));
        }

        let runner =
            BatchRunner::new(FallbackPipeline::new(), config, order).with_jobs(cli.jobs);
        let summary = runner
            .run(input_dir, &output_dir)
            .with_context(|| format!("Cannot process {}", input_dir.display()))?;

        if self.verbose {
            for (path, outcome) in &summary.outcomes {
                match outcome.strategy_used {
                    Some(id) => println!("  {} → {}", path.display(), id),
                    None => println!(
                        "  {} → failed ({})",
                        path.display(),
                        outcome.reason.as_deref().unwrap_or("unknown")
                    ),
                }
            }
        }

        if summary.total() == 0 {
            println!("⚠ No PDF files found in {}", input_dir.display());
        } else {
            println!(
                "✓ {} successful, {} failed → {}",
                summary.succeeded,
                summary.failed,
                output_dir.display()
            );
        }
        Ok(())
    }

    /// Extracts text from a PDF.
    fn extract(&self, input: &Path, output: Option<&Path>, raw: bool) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let text = if raw {
            extract_text_from_pdf(input)
        } else {
            first_page_text(input)
        }
        .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }

        Ok(())
    }
}

/// Installs the global subscriber: stderr, plus `log_file` when given.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let handler = Handler {
        verbose: cli.verbose,
    };

    match &cli.command {
        Some(Commands::Extract { input, output, raw }) => {
            handler.extract(input, output.as_deref(), *raw)?;
        }
        None => {
            let input_dir = cli
                .input_dir
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--input-dir is required"))?;
            handler.process(&cli, input_dir)?;
        }
    }

    Ok(())
}
