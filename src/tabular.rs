//! Tabular data: CSV and Excel workbooks in, CSV and Markdown tables out.
//!
//! All readers produce plain strings. Empty cells and not-a-number cells
//! become `""`, whole-number floats lose their `.0`, so a value reads the
//! same whether it came from a CSV export or a spreadsheet.

use calamine::{Data, Reader, open_workbook_auto};
use indexmap::IndexMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabularError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Workbook has no sheets: {0}")]
    NoSheets(String),
    #[error("Unsupported tabular format: {0}")]
    UnsupportedFormat(String),
}

pub const TABULAR_EXTENSIONS: &[&str] = &["csv", "xls", "xlsx"];

/// One data row keyed by column header, in column order.
pub type Record = IndexMap<String, String>;

/// A header row plus data rows, all cells as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build from a raw grid, first row as headers.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let headers = grid.remove(0);
        Self {
            headers,
            rows: grid,
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect()
    }

    /// Append another table's rows, adding any columns this one lacks.
    pub fn append(&mut self, other: &Table) {
        if self.headers.is_empty() && self.rows.is_empty() {
            *self = other.clone();
            return;
        }
        for header in &other.headers {
            if !self.headers.contains(header) {
                self.headers.push(header.clone());
            }
        }
        for record in other.records() {
            let row = self
                .headers
                .iter()
                .map(|h| record.get(h).cloned().unwrap_or_default())
                .collect();
            self.rows.push(row);
        }
    }

    /// GitHub-style pipe table.
    pub fn to_markdown(&self) -> String {
        let width = self.headers.len();
        let mut out = pipe_row(self.headers.iter().map(String::as_str));
        out.push_str(&pipe_row(self.headers.iter().map(|_| "---")));
        for row in &self.rows {
            out.push_str(&pipe_row(
                (0..width).map(|i| row.get(i).map(String::as_str).unwrap_or("")),
            ));
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), TabularError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            let padded: Vec<&str> = (0..self.headers.len())
                .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
                .collect();
            writer.write_record(&padded)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn pipe_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let mut s = String::new();
    for cell in cells {
        s.push_str("| ");
        s.push_str(&cell.replace('|', "\\|"));
        s.push(' ');
    }
    s.push_str("|\n");
    s
}

pub fn is_tabular(path: &Path) -> bool {
    extension_of(path).is_some_and(|e| TABULAR_EXTENSIONS.contains(&e.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Normalise one cell: NaN and blank cells become empty strings.
pub fn normalise_cell(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn data_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.is_nan() => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => normalise_cell(&other.to_string()),
    }
}

/// Every row of the first sheet (or the CSV), without header handling.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, TabularError> {
    match extension_of(path).as_deref() {
        Some("csv") => read_csv_rows(path),
        Some("xls") | Some("xlsx") => read_workbook_rows(path),
        _ => Err(TabularError::UnsupportedFormat(path.display().to_string())),
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(normalise_cell).collect());
    }
    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<String>>, TabularError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TabularError::NoSheets(path.display().to_string()))??;
    Ok(range
        .rows()
        .map(|row| row.iter().map(data_to_string).collect())
        .collect())
}

/// First sheet as a table, first row as headers.
pub fn read_table(path: &Path) -> Result<Table, TabularError> {
    let table = Table::from_grid(read_rows(path)?);
    tracing::debug!(path = %path.display(), columns = table.headers.len(), rows = table.rows.len(), "read table");
    Ok(table)
}

pub fn read_records(path: &Path) -> Result<Vec<Record>, TabularError> {
    Ok(read_table(path)?.records())
}
