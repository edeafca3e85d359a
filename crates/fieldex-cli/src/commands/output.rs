//! Rendering extracted records as JSON, CSV or text.

use fieldex_core::{FieldSet, PageRecord};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for outputs written to disk.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_records(records: &[PageRecord], fields: &FieldSet, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => format_csv(records, fields),
        OutputFormat::Text => Ok(format_text(records, fields)),
    }
}

/// Header `page` followed by the label of each enabled field.
pub fn format_csv(records: &[PageRecord], fields: &FieldSet) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["page"];
    header.extend(fields.enabled().map(|f| f.label.as_str()));
    wtr.write_record(&header)?;

    for record in records {
        let mut row = vec![record.page.to_string()];
        row.extend(
            fields
                .enabled()
                .map(|f| record.get(&f.key).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(records: &[PageRecord], fields: &FieldSet) -> String {
    if records.is_empty() {
        return "No fields extracted.\n".to_string();
    }

    let width = fields.enabled().map(|f| f.label.chars().count()).max().unwrap_or(0);
    let mut output = String::new();

    for record in records {
        output.push_str(&format!("Page {}\n", record.page));
        for field in fields.enabled() {
            let value = record.get(&field.key).map(|v| v.to_string()).unwrap_or_default();
            output.push_str(&format!("  {:<width$}  {}\n", field.label, value, width = width));
        }
        output.push('\n');
    }

    output
}
