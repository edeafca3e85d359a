//! Extract command - pull fields out of a single PDF.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use fieldex_core::review::assess;
use fieldex_core::{ExtractionPipeline, FieldSet, PageRecord};

use super::output::{format_records, OutputFormat};
use super::{build_collaborator, load_config, load_fields, Engine};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// JSON file with field descriptors (default: configured fields)
    #[arg(long)]
    fields: Option<PathBuf>,

    /// OCR engine
    #[arg(short, long, value_enum, default_value = "document-ai")]
    engine: Engine,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pages per OCR request (overrides config)
    #[arg(long)]
    chunk_size: Option<u32>,

    /// Show a plausibility score for each page
    #[arg(long)]
    show_confidence: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(chunk_size) = args.chunk_size {
        config.chunking.chunk_size = chunk_size;
        config.validate()?;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let fields = load_fields(args.fields.as_deref(), &config)?;
    let collaborator = build_collaborator(args.engine, &config)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Loading PDF...");

    let data = fs::read(&args.input)?;

    pb.set_message(format!("Recognizing with {}...", collaborator.name()));
    let pipeline = ExtractionPipeline::new(config, collaborator);
    let result = pipeline.run_with_report(&data, &fields).await;
    pb.finish_and_clear();

    let (records, report) = result?;
    debug!("Run report: {:?}", report);

    if report.chunks_failed > 0 {
        eprintln!(
            "{} {} of {} chunks failed; their pages are missing from the output",
            style("!").yellow(),
            report.chunks_failed,
            report.chunks_submitted
        );
    }

    let output = format_records(&records, &fields, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        print_confidence(&records, &fields);
        eprintln!(
            "{} {} of {} pages kept in {}ms",
            style("ℹ").blue(),
            report.pages_kept,
            report.page_count,
            report.elapsed_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_confidence(records: &[PageRecord], fields: &FieldSet) {
    eprintln!();
    for record in records {
        let assessment = assess(record, fields);
        eprintln!(
            "{} Page {}: confidence {:.1}%",
            style("ℹ").blue(),
            record.page,
            assessment.score
        );
        for note in &assessment.notes {
            eprintln!("    - {}", style(note).yellow());
        }
    }
}
