use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::export::{output_error, Exporter};
use crate::generate::row::Row;

/// Writes `<table>.jsonl`: one JSON object per line with fields in declared
/// column order, null fields as JSON null, temporals as ISO-8601 strings.
///
/// Lines are assembled by hand (with `serde_json` doing the escaping) so
/// the declared column order is preserved; a serde map would sort keys.
pub struct JsonlExporter {
    writer: BufWriter<File>,
    columns: Vec<String>,
}

impl JsonlExporter {
    pub fn create(path: &Path, columns: Vec<String>) -> Result<Self> {
        let file = File::create(path)
            .map_err(output_error(format!("creating {}", path.display())))?;
        Ok(Self {
            writer: BufWriter::new(file),
            columns,
        })
    }
}

impl Exporter for JsonlExporter {
    fn write_row(&mut self, row: &Row) -> Result<()> {
        let mut line = String::from("{");
        for (idx, col) in self.columns.iter().enumerate() {
            if idx > 0 {
                line.push_str(", ");
            }
            let value = row
                .get(col)
                .map(|v| v.to_json())
                .unwrap_or(serde_json::Value::Null);
            line.push_str(&serde_json::Value::String(col.clone()).to_string());
            line.push_str(": ");
            line.push_str(&value.to_string());
        }
        line.push('}');
        writeln!(self.writer, "{}", line).map_err(output_error("writing JSONL row"))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(output_error("flushing JSONL"))
    }
}
