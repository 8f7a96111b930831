use std::io::{BufWriter, Result, Write};

use crate::metric::{MetricRow, Row};

pub trait Record {
    fn fields(&self) -> Vec<String>;
}

impl Record for Row {
    fn fields(&self) -> Vec<String> {
        vec![
            self.customer.clone(),
            self.cluster.clone(),
            self.ts.clone(),
            self.value.to_string(),
        ]
    }
}

impl Record for MetricRow {
    fn fields(&self) -> Vec<String> {
        vec![
            self.customer.clone(),
            self.cluster.clone(),
            self.ts.clone(),
            self.metric.clone(),
            self.value.to_string(),
        ]
    }
}

pub struct CsvEncoder<W: Write> {
    pub writer: BufWriter<W>,
}

impl<W: Write> CsvEncoder<W> {
    pub fn new(writeable: W) -> Self {
        Self {
            writer: BufWriter::new(writeable),
        }
    }

    pub fn encode_header(&mut self, columns: &[&str]) -> Result<()> {
        self.encode_fields(columns.iter().copied())
    }

    pub fn encode_row<R: Record>(&mut self, row: &R) -> Result<()> {
        let fields = row.fields();
        self.encode_fields(fields.iter().map(String::as_str))
    }

    pub fn encode_rows<R: Record>(&mut self, rows: &[R]) -> Result<()> {
        for row in rows {
            self.encode_row(row)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    fn encode_fields<'a>(&mut self, fields: impl Iterator<Item = &'a str>) -> Result<()> {
        let line = fields.map(escape).collect::<Vec<_>>().join(",");
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }
}

// Tag values are free text, so quote anything that would break the record.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
