use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ConfigGenerator, GeneratorContext};
use crate::error::{ErrorExt, Result};
use crate::metadata::cell_text;

/// Rows of text with an optional header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

pub type TableTransform = Arc<dyn Fn(&GeneratorContext) -> Result<Table> + Send + Sync>;

/// Delimited text file built from a caller-supplied transform.
#[derive(Clone)]
pub struct TableGenerator {
    file_name: PathBuf,
    delimiter: u8,
    header: bool,
    transform: TableTransform,
}

impl TableGenerator {
    pub fn new<F>(file_name: impl Into<PathBuf>, transform: F) -> Self
    where
        F: Fn(&GeneratorContext) -> Result<Table> + Send + Sync + 'static,
    {
        Self {
            file_name: file_name.into(),
            delimiter: b'\t',
            header: true,
            transform: Arc::new(transform),
        }
    }

    /// The metadata matrix, one row per sample.
    pub fn metadata(file_name: impl Into<PathBuf>) -> Self {
        Self::new(file_name, |context| {
            let (header, rows) = context.metadata.to_table();
            Ok(Table {
                header: Some(header),
                rows,
            })
        })
    }

    /// One row per staged sample: sample name, source dataset, the staged path
    /// of every collected type, then every metadata variable.
    pub fn sample_sheet(file_name: impl Into<PathBuf>) -> Self {
        Self::new(file_name, |context| Ok(sample_sheet(context)))
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Whether the transform's header row is written.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl ConfigGenerator for TableGenerator {
    fn file_name(&self) -> &Path {
        &self.file_name
    }

    fn render(&self, context: &GeneratorContext) -> Result<Vec<u8>> {
        let table = (self.transform)(context)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if self.header {
            if let Some(header) = &table.header {
                writer
                    .write_record(header)
                    .to_config_error("Failed to write table header")?;
            }
        }
        for row in &table.rows {
            writer
                .write_record(row)
                .to_config_error("Table rows must all have the same number of fields")?;
        }
        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .to_config_error("Failed to finish table")
    }
}

impl std::fmt::Debug for TableGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableGenerator")
            .field("file_name", &self.file_name)
            .field("delimiter", &(self.delimiter as char))
            .field("header", &self.header)
            .finish()
    }
}

fn sample_sheet(context: &GeneratorContext) -> Table {
    let types: Vec<&str> = context.files.types().collect();
    let variables: Vec<&str> = context.metadata.variables().collect();

    let samples: BTreeSet<&str> = context
        .files
        .sample_names()
        .into_iter()
        .chain(context.samples.iter().map(|(sample, _)| sample))
        .collect();

    let mut header = vec!["sample".to_string(), "dataset".to_string()];
    header.extend(types.iter().map(|t| t.to_string()));
    header.extend(variables.iter().map(|v| v.to_string()));

    let rows = samples
        .into_iter()
        .map(|sample| {
            let mut row = vec![
                sample.to_string(),
                context.samples.get(sample).unwrap_or_default().to_string(),
            ];
            row.extend(types.iter().map(|data_type| {
                context
                    .files
                    .get(data_type, sample)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            }));
            row.extend(variables.iter().map(|variable| {
                context
                    .metadata
                    .value(*variable, sample)
                    .map(cell_text)
                    .unwrap_or_default()
            }));
            row
        })
        .collect();

    Table {
        header: Some(header),
        rows,
    }
}
