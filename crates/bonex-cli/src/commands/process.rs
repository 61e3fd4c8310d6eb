//! Process command - parse a single receipt file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use bonex_core::models::config::BonexConfig;
use bonex_core::models::receipt::Receipt;
use bonex_core::pdf::{LineSource, PdfExtractor};
use bonex_core::receipt::LineClassifier;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF receipt or plain-text line dump)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print parse warnings
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON receipt record
    Json,
    /// One CSV row per item
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let lines = read_lines(&args.input, &config)?;
    let source_id = source_id(&args.input);
    let parser = LineClassifier::with_config(config.parser.clone());
    let parsed = parser.parse_lines(&source_id, &lines);

    if args.show_warnings && !parsed.warnings.is_empty() {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &parsed.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_receipt(&parsed.receipt, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Wrote {} to {}",
            style("✓").green(),
            source_id,
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Source identifier for a receipt: the file name.
pub(crate) fn source_id(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("receipt")
        .to_string()
}

/// Load configuration from an explicit path or fall back to defaults.
pub(crate) fn load_config(config_path: Option<&str>) -> anyhow::Result<BonexConfig> {
    match config_path {
        Some(path) => Ok(BonexConfig::from_file(Path::new(path))?),
        None => Ok(BonexConfig::default()),
    }
}

/// Read the ordered line stream of one document. PDFs go through the
/// text-extraction collaborator; .txt files are consumed as pre-extracted
/// line dumps.
pub(crate) fn read_lines(path: &Path, config: &BonexConfig) -> anyhow::Result<Vec<String>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor = PdfExtractor::new();
            extractor.load(&data)?;

            let text = extractor.extract_text()?;
            if text.trim().len() < config.pdf.min_text_length {
                anyhow::bail!("No text extracted from PDF");
            }

            Ok(extractor.lines()?)
        }
        "txt" => {
            let text = fs::read_to_string(path)?;
            Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect())
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Render one receipt in the requested output format.
pub(crate) fn format_receipt(receipt: &Receipt, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
        OutputFormat::Csv => format_receipt_csv(receipt),
        OutputFormat::Text => Ok(format_receipt_text(receipt)),
    }
}

/// Flatten a receipt to one CSV row per item.
fn format_receipt_csv(receipt: &Receipt) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "file",
        "date",
        "time",
        "item_name",
        "quantity",
        "unit_price",
        "total_price",
        "receipt_total",
    ])?;

    let date = receipt
        .date
        .map(|d| d.format("%d.%m.%y").to_string())
        .unwrap_or_default();
    let time = receipt
        .time
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default();

    for item in &receipt.items {
        wtr.write_record([
            receipt.source_id.as_str(),
            date.as_str(),
            time.as_str(),
            item.name.as_str(),
            &item.quantity.to_string(),
            &item.unit_price.to_string(),
            &item.total_price.to_string(),
            &receipt.computed_total.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_receipt_text(receipt: &Receipt) -> String {
    let mut output = String::new();

    output.push_str(&format!("Receipt: {}\n", receipt.source_id));
    match (&receipt.date, &receipt.time) {
        (Some(date), Some(time)) => {
            output.push_str(&format!(
                "Date: {} {}\n",
                date.format("%d.%m.%y"),
                time.format("%H:%M")
            ));
        }
        (Some(date), None) => {
            output.push_str(&format!("Date: {}\n", date.format("%d.%m.%y")));
        }
        _ => {}
    }
    output.push('\n');

    output.push_str("Items:\n");
    for item in &receipt.items {
        output.push_str(&format!(
            "  {} x {:>8}  {}\n",
            item.quantity, item.total_price, item.name
        ));
    }
    output.push('\n');

    if let Some(declared) = receipt.declared_total {
        output.push_str(&format!("Declared total: {}\n", declared));
    }
    output.push_str(&format!("Computed total: {}\n", receipt.computed_total));

    for warning in &receipt.metadata.warnings {
        output.push_str(&format!("Warning: {}\n", warning));
    }

    output
}
