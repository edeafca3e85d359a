//! Split command - write the chunks a document would be submitted as.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use fieldex_core::PdfChunker;

use super::load_config;

/// Arguments for the split command.
#[derive(Args)]
pub struct SplitArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Directory for the chunk files
    #[arg(short, long, required = true)]
    output_dir: PathBuf,

    /// Pages per chunk (overrides config)
    #[arg(long)]
    chunk_size: Option<u32>,
}

pub async fn run(args: SplitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(chunk_size) = args.chunk_size {
        config.chunking.chunk_size = chunk_size;
        config.validate()?;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let data = fs::read(&args.input)?;
    let chunker = PdfChunker::load(&data)?;
    fs::create_dir_all(&args.output_dir)?;

    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    let mut written = 0;
    for chunk in chunker.chunks(config.chunking.chunk_size) {
        let chunk = chunk?;
        let path = args.output_dir.join(format!(
            "{}-{}-{}.pdf",
            stem,
            chunk.range.first_page(),
            chunk.range.last_page()
        ));
        fs::write(&path, &chunk.bytes)?;
        debug!("Wrote chunk {} to {}", chunk.index, path.display());
        written += 1;
    }

    println!(
        "{} Split {} pages into {} chunks in {}",
        style("✓").green(),
        chunker.page_count(),
        written,
        args.output_dir.display()
    );

    Ok(())
}
