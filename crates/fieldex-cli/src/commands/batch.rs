//! Batch processing command for multiple PDF files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use fieldex_core::{ExtractionPipeline, FieldSet, PageRecord};

use super::output::{format_records, OutputFormat};
use super::{build_collaborator, load_config, load_fields, Engine};

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

    /// JSON file with field descriptors (default: configured fields)
    #[arg(long)]
    fields: Option<PathBuf>,

    /// OCR engine
    #[arg(short, long, value_enum, default_value = "document-ai")]
    engine: Engine,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    records: Option<Vec<PageRecord>>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let fields = load_fields(args.fields.as_deref(), &config)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
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

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let collaborator = build_collaborator(args.engine, &config)?;
    let pipeline = ExtractionPipeline::new(config, collaborator);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        match process_file(&pipeline, &path, &fields).await {
            Ok(records) => {
                write_output(&args, &path, &records, &fields)?;
                results.push(FileResult {
                    path,
                    records: Some(records),
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        records: None,
                        error: Some(error_msg),
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results, &fields)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileResult> = results.iter().filter(|r| r.error.is_some()).collect();
    let pages: usize = results
        .iter()
        .filter_map(|r| r.records.as_ref())
        .map(|r| r.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files ({} pages with data) in {:?}",
        style("✓").green(),
        results.len(),
        pages,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
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

async fn process_file(
    pipeline: &ExtractionPipeline,
    path: &Path,
    fields: &FieldSet,
) -> anyhow::Result<Vec<PageRecord>> {
    let data = fs::read(path)?;
    let records = pipeline.run(&data, fields).await?;
    debug!("{}: {} pages with data", path.display(), records.len());
    Ok(records)
}

fn write_output(args: &BatchArgs, path: &Path, records: &[PageRecord], fields: &FieldSet) -> anyhow::Result<()> {
    let Some(output_dir) = &args.output_dir else {
        return Ok(());
    };

    let output_name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
    let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

    fs::write(&output_path, format_records(records, fields, args.format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

/// One row per extracted page: `filename,status,page,<labels...>,error`.
fn write_summary(path: &Path, results: &[FileResult], fields: &FieldSet) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let column_count = fields.enabled().count();

    let mut header = vec!["filename", "status", "page"];
    header.extend(fields.enabled().map(|f| f.label.as_str()));
    header.push("error");
    wtr.write_record(&header)?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        match &result.records {
            Some(records) if !records.is_empty() => {
                for record in records {
                    let mut row = vec![filename.to_string(), "success".to_string(), record.page.to_string()];
                    row.extend(
                        fields
                            .enabled()
                            .map(|f| record.get(&f.key).map(|v| v.to_string()).unwrap_or_default()),
                    );
                    row.push(String::new());
                    wtr.write_record(&row)?;
                }
            }
            Some(_) => {
                let mut row = vec![filename.to_string(), "no_data".to_string(), String::new()];
                row.extend(std::iter::repeat_n(String::new(), column_count + 1));
                wtr.write_record(&row)?;
            }
            None => {
                let mut row = vec![filename.to_string(), "error".to_string(), String::new()];
                row.extend(std::iter::repeat_n(String::new(), column_count));
                row.push(result.error.clone().unwrap_or_default());
                wtr.write_record(&row)?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldex_core::{ExtractedValue, FieldValues};

    #[test]
    fn test_summary_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let mut values = FieldValues::new();
        values.push("referenceNo", ExtractedValue::Found("CO-1".to_string()));
        values.push("date", ExtractedValue::Found("2024-01-15".to_string()));
        values.push("grossWeight", ExtractedValue::ExtractionFailed);

        let results = vec![
            FileResult {
                path: PathBuf::from("a.pdf"),
                records: Some(vec![PageRecord::new(2, values)]),
                error: None,
            },
            FileResult {
                path: PathBuf::from("b.pdf"),
                records: None,
                error: Some("PDF error: PDF has no pages".to_string()),
            },
            FileResult {
                path: PathBuf::from("c.pdf"),
                records: Some(Vec::new()),
                error: None,
            },
        ];

        write_summary(&path, &results, &FieldSet::default()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "filename,status,page,Reference No,Date,Gross Weight,error");
        assert_eq!(lines[1], "a.pdf,success,2,CO-1,2024-01-15,EXTRACTION_FAILED,");
        assert_eq!(lines[2], "b.pdf,error,,,,,PDF error: PDF has no pages");
        assert_eq!(lines[3], "c.pdf,no_data,,,,,");
    }
}
