use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::export::{output_error, Exporter};
use crate::generate::row::Row;

/// Writes `<table>.sql`: one `INSERT INTO <table> (<cols>) VALUES (…);`
/// per row. Numerics bare, text single-quoted with `'` doubled, `NULL`
/// for null.
pub struct SqlExporter {
    writer: BufWriter<File>,
    table: String,
    columns: Vec<String>,
}

impl SqlExporter {
    pub fn create(path: &Path, table: &str, columns: Vec<String>) -> Result<Self> {
        let file = File::create(path)
            .map_err(output_error(format!("creating {}", path.display())))?;
        Ok(Self {
            writer: BufWriter::new(file),
            table: table.to_string(),
            columns,
        })
    }
}

impl Exporter for SqlExporter {
    fn write_row(&mut self, row: &Row) -> Result<()> {
        let values = self
            .columns
            .iter()
            .map(|col| {
                row.get(col)
                    .map(|v| v.to_sql_literal())
                    .unwrap_or_else(|| "NULL".to_string())
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            self.writer,
            "INSERT INTO {} ({}) VALUES ({});",
            self.table,
            self.columns.join(", "),
            values
        )
        .map_err(output_error("writing SQL row"))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(output_error("flushing SQL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::value::Value;

    #[test]
    fn test_insert_statement_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.sql");
        let mut exporter = SqlExporter::create(
            &path,
            "users",
            vec!["id".to_string(), "name".to_string(), "age".to_string()],
        )
        .unwrap();

        let mut row = Row::new();
        row.insert("id".to_string(), Value::Int(1));
        row.insert("name".to_string(), Value::owned("O'Brien".to_string()));
        row.insert("age".to_string(), Value::Null);
        exporter.write_row(&row).unwrap();
        exporter.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "INSERT INTO users (id, name, age) VALUES (1, 'O''Brien', NULL);\n"
        );
    }
}
