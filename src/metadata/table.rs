use serde_json::Value;
use std::io::Read;
use std::path::Path;

use super::MetadataContainer;
use crate::error::{ErrorCode, ErrorExt, LabflowError, Result};

impl MetadataContainer {
    /// Load a CSV file, or TSV when the extension is `.tsv`/`.txt`.
    ///
    /// The first column holds sample names and the header names the
    /// variables. Empty cells are left unset, except on a row with no values
    /// at all, which holds null for every variable.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") | Some("txt") => b'\t',
            _ => b',',
        };
        let file = std::fs::File::open(path)
            .to_config_error(format!("Failed to open metadata file {}", path.display()))?;
        Self::from_reader(file, delimiter)
            .map_err(|e| e.with_context(format!("Reading {}", path.display())))
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .to_config_error("Invalid metadata header")?
            .clone();
        if headers.len() < 2 {
            return Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "Metadata needs a sample column and at least one variable column",
            ));
        }

        let mut container = MetadataContainer::new();
        for record in reader.records() {
            let record = record.to_config_error("Invalid metadata row")?;
            let Some(sample) = record.get(0).filter(|s| !s.is_empty()) else {
                continue;
            };
            let cells: Vec<(&str, &str)> = headers.iter().zip(record.iter()).skip(1).collect();
            if cells.iter().all(|(_, cell)| cell.is_empty()) {
                // Keep the sample listed even though it has no values.
                for (variable, _) in &cells {
                    container.set(variable, sample, Value::Null);
                }
                continue;
            }
            for (variable, cell) in cells {
                if !cell.is_empty() {
                    container.set(variable, sample, Value::String(cell.to_string()));
                }
            }
        }
        Ok(container)
    }

    /// Header (`sample` then the variables) and one row per sample. Missing
    /// values render as empty cells.
    pub fn to_table(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let mut header = vec!["sample".to_string()];
        header.extend(self.variables().map(str::to_string));

        let rows = self
            .sample_view()
            .iter()
            .map(|(sample, values)| {
                let mut row = vec![sample.clone()];
                row.extend(values.values().map(cell_text));
                row
            })
            .collect();
        (header, rows)
    }
}

/// Plain text for a table cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
