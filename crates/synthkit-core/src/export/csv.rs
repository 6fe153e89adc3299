use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::export::{output_error, Exporter};
use crate::generate::row::Row;

/// Writes `<table>.csv`: one header row of declared column names, then one
/// line per record. Temporals render as ISO-8601, nulls as empty fields.
pub struct CsvExporter {
    writer: BufWriter<File>,
    columns: Vec<String>,
}

impl CsvExporter {
    pub fn create(path: &Path, columns: Vec<String>) -> Result<Self> {
        let file = File::create(path)
            .map_err(output_error(format!("creating {}", path.display())))?;
        let mut writer = BufWriter::new(file);
        let header = columns
            .iter()
            .map(|c| csv_escape(c))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{}", header).map_err(output_error("writing CSV header"))?;
        Ok(Self { writer, columns })
    }
}

impl Exporter for CsvExporter {
    fn write_row(&mut self, row: &Row) -> Result<()> {
        let fields = self
            .columns
            .iter()
            .map(|col| {
                row.get(col)
                    .map(|v| csv_escape(&v.to_csv_field()))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.writer, "{}", fields).map_err(output_error("writing CSV row"))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(output_error("flushing CSV"))
    }
}

/// Quote a field if it contains a comma, quote, or newline.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
