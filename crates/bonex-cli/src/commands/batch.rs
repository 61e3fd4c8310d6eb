//! Batch processing command for multiple receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::{stream, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use bonex_core::models::config::BonexConfig;
use bonex_core::models::receipt::Receipt;
use bonex_core::receipt::LineClassifier;

use super::process::{self, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    receipt: Option<Receipt>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = Arc::new(process::load_config(config_path)?);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let parser = Arc::new(LineClassifier::with_config(config.parser.clone()));

    // Bounded worker pool; results arrive in completion order. One
    // document's failure becomes a marker, never a batch abort.
    let mut results: Vec<ProcessResult> = stream::iter(files)
        .map(|path| {
            let parser = Arc::clone(&parser);
            let config = Arc::clone(&config);
            let pb = overall_pb.clone();
            async move {
                let job_path = path.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    parse_one(&job_path, &parser, &config)
                })
                .await;
                pb.inc(1);
                match joined {
                    Ok(result) => result,
                    Err(e) => ProcessResult {
                        path,
                        receipt: None,
                        error: Some(format!("worker failed: {}", e)),
                        processing_time_ms: 0,
                    },
                }
            }
        })
        .buffer_unordered(args.jobs.max(1))
        .collect()
        .await;

    overall_pb.finish_with_message("Complete");

    // Stable report order regardless of completion order
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let successful: Vec<_> = results.iter().filter(|r| r.receipt.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        if let (Some(receipt), Some(output_dir)) = (&result.receipt, &args.output_dir) {
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("receipt");

            let extension = match args.format {
                OutputFormat::Json => "json",
                OutputFormat::Csv => "csv",
                OutputFormat::Text => "txt",
            };

            let output_path = output_dir.join(format!("{}.{}", output_name, extension));
            let content = process::format_receipt(receipt, args.format)?;

            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Parse one document; extraction failures become a per-document marker.
fn parse_one(path: &Path, parser: &LineClassifier, config: &BonexConfig) -> ProcessResult {
    let file_start = Instant::now();

    match process::read_lines(path, config) {
        Ok(lines) => {
            let parsed = parser.parse_lines(&process::source_id(path), &lines);
            for warning in &parsed.warnings {
                warn!("{}: {}", path.display(), warning);
            }
            ProcessResult {
                path: path.to_path_buf(),
                receipt: Some(parsed.receipt),
                error: None,
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            }
        }
        Err(e) => {
            warn!("Failed to process {}: {}", path.display(), e);
            ProcessResult {
                path: path.to_path_buf(),
                receipt: None,
                error: Some(e.to_string()),
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            }
        }
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "date",
        "time",
        "items",
        "declared_total",
        "computed_total",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(receipt) = &result.receipt {
            wtr.write_record([
                filename,
                "success",
                &receipt
                    .date
                    .map(|d| d.format("%d.%m.%y").to_string())
                    .unwrap_or_default(),
                &receipt
                    .time
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_default(),
                &receipt.items.len().to_string(),
                &receipt
                    .declared_total
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                &receipt.computed_total.to_string(),
                &receipt.metadata.warnings.join("; "),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
