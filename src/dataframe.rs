//! `DataFrame` — the tabular frame collaborator.
//!
//! DESIGN
//! ======
//! An in-memory table of rows with named columns. Each row carries a
//! stable `RowId` assigned at construction (or at CSV read time) so that
//! enrichment blocks can apply out-of-order batch results to the correct
//! row, and so that `FilterBlock` can drop rows without renumbering the
//! survivors. Missing cells are modeled as `serde_json::Value::Null`.
//! Column order is preserved as inserted.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExecutionError;

/// Stable identifier for a row, independent of its position in the frame.
pub type RowId = u64;

/// A single row: a stable id plus its cells, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub id: RowId,
    pub cells: std::collections::HashMap<String, Value>,
}

impl Row {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column).filter(|v| !v.is_null())
    }

    #[must_use]
    pub fn get_string(&self, column: &str) -> Option<String> {
        self.get(column).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// An in-memory table of rows with named columns.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    next_id: RowId,
}

impl DataFrame {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new(), next_id: 0 }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Append a row, assigning it the next stable id.
    pub fn push_row(&mut self, cells: std::collections::HashMap<String, Value>) -> RowId {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push(Row { id, cells });
        id
    }

    /// Ensure a column exists (appending it to the column order if absent).
    pub fn ensure_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    /// Set a single cell by row id, creating the column if it is new.
    pub fn set_cell(&mut self, row_id: RowId, column: &str, value: Value) {
        self.ensure_column(column);
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == row_id) {
            row.cells.insert(column.to_string(), value);
        }
    }

    /// First up to `n` rows, rendered as ordered JSON maps with missing
    /// cells normalized to `null`.
    #[must_use]
    pub fn preview(&self, n: usize) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| {
                let mut map = serde_json::Map::new();
                for col in &self.columns {
                    map.insert(col.clone(), row.cells.get(col).cloned().unwrap_or(Value::Null));
                }
                map
            })
            .collect()
    }

    /// Render every row as an ordered JSON map (used by the results endpoint).
    #[must_use]
    pub fn to_records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.preview(self.rows.len())
    }

    /// Read a CSV file into a frame. Every cell is stored as a string
    /// (or null for empty fields); blocks coerce types as needed.
    pub fn read_csv(path: &Path) -> Result<Self, ExecutionError> {
        let mut file = std::fs::File::open(path).map_err(|e| ExecutionError::IoFailure(e.to_string()))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf).map_err(|e| ExecutionError::IoFailure(e.to_string()))?;
        Self::from_csv_str(&buf)
    }

    /// Parse CSV content directly into a frame, exactly as `read_csv`
    /// does for a file — cells are always `Value::String`/`Value::Null`.
    /// `pub(crate)` so block tests can build a CSV-shaped frame (string
    /// cells) without touching disk.
    pub(crate) fn from_csv_str(contents: &str) -> Result<Self, ExecutionError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(contents.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| ExecutionError::IoFailure(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut frame = Self::new(headers.clone());
        for record in reader.records() {
            let record = record.map_err(|e| ExecutionError::IoFailure(e.to_string()))?;
            let mut cells = std::collections::HashMap::new();
            for (col, value) in headers.iter().zip(record.iter()) {
                let cell = if value.is_empty() { Value::Null } else { Value::String(value.to_string()) };
                cells.insert(col.clone(), cell);
            }
            frame.push_row(cells);
        }
        Ok(frame)
    }

    /// Write the frame to a CSV file: header row, then one row per record,
    /// null cells emitted as empty fields. No row-index column.
    pub fn write_csv(&self, path: &Path) -> Result<(), ExecutionError> {
        let mut writer = csv::WriterBuilder::new()
            .from_path(path)
            .map_err(|e| ExecutionError::IoFailure(e.to_string()))?;
        writer.write_record(&self.columns).map_err(|e| ExecutionError::IoFailure(e.to_string()))?;
        for row in &self.rows {
            let record = self.columns.iter().map(|col| cell_to_field(row.cells.get(col)));
            writer.write_record(record).map_err(|e| ExecutionError::IoFailure(e.to_string()))?;
        }
        writer.flush().map_err(|e| ExecutionError::IoFailure(e.to_string()))?;
        Ok(())
    }
}

fn cell_to_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Wire shape for a completed workflow's full result set.
#[derive(Debug, Serialize, Deserialize)]
pub struct FrameResultPayload {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub data: Vec<serde_json::Map<String, Value>>,
}

#[cfg(test)]
#[path = "dataframe_test.rs"]
mod tests;
