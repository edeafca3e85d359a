//! Subcommands and the setup they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod fields;
pub mod output;
pub mod split;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use fieldex_core::models::config::FieldexConfig;
use fieldex_core::ocr::{DocumentAiClient, EmbeddedTextRecognizer, OcrCollaborator};
use fieldex_core::FieldSet;

/// Which OCR collaborator recognizes chunk text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Engine {
    /// Google Document AI OCR processor
    DocumentAi,
    /// Text layer embedded in the PDF (no OCR)
    Embedded,
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fieldex")
        .join("config.json")
}

/// The `-c` path when given, else the default path.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration a run should use.
///
/// An explicit path must exist. Without one, the default file is used when
/// present and built-in defaults otherwise.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<FieldexConfig> {
    let config = match explicit {
        Some(path) => FieldexConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                FieldexConfig::from_file(&path)?
            } else {
                FieldexConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

/// Descriptors from a JSON file, or the configured defaults.
pub fn load_fields(path: Option<&Path>, config: &FieldexConfig) -> anyhow::Result<FieldSet> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read fields file {}: {}", path.display(), e))?;
            Ok(FieldSet::from_json(&json)?)
        }
        None => Ok(config.extraction.fields()),
    }
}

/// Build the collaborator for the selected engine.
pub fn build_collaborator(engine: Engine, config: &FieldexConfig) -> anyhow::Result<Arc<dyn OcrCollaborator>> {
    let collaborator: Arc<dyn OcrCollaborator> = match engine {
        Engine::DocumentAi => Arc::new(DocumentAiClient::from_config(&config.ocr)?),
        Engine::Embedded => Arc::new(EmbeddedTextRecognizer::new()),
    };
    debug!("Using OCR collaborator: {}", collaborator.name());
    Ok(collaborator)
}
