use crate::core::{Result, Row, SheetError, Value};
use crate::storage::Document;
use std::io::{self, Write};
use std::path::Path;

/// In-memory tabular document: one header record and any number of rows.
///
/// Rows may be shorter or longer than the header; CSV files in the wild are
/// ragged and the sheet keeps them that way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    header: Vec<String>,
    rows: Vec<Row>,
}

impl Sheet {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(header: Vec<String>, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }

    /// Read a CSV file. The first record is the header.
    pub fn load(path: &Path) -> Result<Self> {
        let load_err = |source| SheetError::Load {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(load_err)?;

        let header = reader
            .headers()
            .map_err(load_err)?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(load_err)?;
            rows.push(record.iter().map(Value::infer).collect());
        }

        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn set_header(&mut self, header: Vec<String>) {
        self.header = header;
    }

    /// Appends a row and returns its index.
    pub fn push_row(&mut self, row: Row) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// Writes one cell, padding a short row with `Null`s. Returns the previous value.
    pub fn set_cell(&mut self, row: usize, column: usize, value: Value) -> Result<Value> {
        let count = self.rows.len();
        let target = self
            .rows
            .get_mut(row)
            .ok_or(SheetError::RowOutOfRange(row, count))?;

        if target.len() <= column {
            target.resize(column + 1, Value::Null);
        }
        Ok(std::mem::replace(&mut target[column], value))
    }

    pub fn remove_row(&mut self, row: usize) -> Result<Row> {
        if row >= self.rows.len() {
            return Err(SheetError::RowOutOfRange(row, self.rows.len()));
        }
        Ok(self.rows.remove(row))
    }
}

impl Document for Sheet {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);

        if !self.header.is_empty() {
            writer.write_record(&self.header)?;
        }
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()
    }
}
