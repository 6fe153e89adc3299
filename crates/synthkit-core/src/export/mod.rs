//! # Exporters
//!
//! One open buffered file per table, scoped to that table's generation.
//! Rows are written strictly in acceptance order; `finish` flushes before
//! the file handle drops.

pub mod csv;
pub mod json;
pub mod sql;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, SynthKitError};
use crate::generate::row::Row;

/// The supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Jsonl,
    Sql,
}

impl OutputFormat {
    /// File name for a table in this format.
    pub fn file_name(&self, table: &str) -> String {
        match self {
            OutputFormat::Csv => format!("{}.csv", table),
            OutputFormat::Jsonl => format!("{}.jsonl", table),
            OutputFormat::Sql => format!("{}.sql", table),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Sql => write!(f, "sql"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SynthKitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "jsonl" | "json" => Ok(OutputFormat::Jsonl),
            "sql" => Ok(OutputFormat::Sql),
            other => Err(SynthKitError::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// A per-table sink for finished rows.
pub trait Exporter {
    /// Append one row, rendering each declared column in order.
    fn write_row(&mut self, row: &Row) -> Result<()>;

    /// Flush buffered output. Must be called before the exporter drops.
    fn finish(&mut self) -> Result<()>;
}

/// Open the exporter for `table` in `dir`, writing `columns` in order.
pub fn open_exporter(
    format: OutputFormat,
    dir: &Path,
    table: &str,
    columns: Vec<String>,
) -> Result<Box<dyn Exporter>> {
    let path = dir.join(format.file_name(table));
    Ok(match format {
        OutputFormat::Csv => Box::new(csv::CsvExporter::create(&path, columns)?),
        OutputFormat::Jsonl => Box::new(json::JsonlExporter::create(&path, columns)?),
        OutputFormat::Sql => Box::new(sql::SqlExporter::create(&path, table, columns)?),
    })
}

pub(crate) fn output_error(message: impl Into<String>) -> impl FnOnce(std::io::Error) -> SynthKitError {
    let message = message.into();
    move |source| SynthKitError::Output { message, source }
}
