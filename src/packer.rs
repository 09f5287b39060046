//! Grid packing: turning a stream of classified items into dashboard rows.
//!
//! The dashboard is a fixed-width column grid (12 columns by default). Items
//! are laid out left to right; each item occupies `width` columns starting
//! at the current cursor. When the next item would run past the right edge
//! the current row is closed and a new one started.
//!
//! ```text
//! cursor: 1  2  3  4  5  6  7  8  9  10 11 12
//!        [link][img ][....... blank pad .......]   <- closed row, widths sum to 12
//! ```
//!
//! ## Row closing
//!
//! A row is closed ("flushed") in two situations:
//!
//! 1. **Overflow**: `cursor + width > grid_width + 1` for the incoming item.
//! 2. **End of section**: every section starts on a fresh row.
//!
//! A closed row whose columns do not reach the right edge receives one
//! trailing `blank` column covering the remainder, so every emitted row
//! spans exactly `grid_width` columns.
//!
//! Closing a row with no items is governed by [`EmptyRowPolicy`]: the
//! default emits an all-blank row (a visual spacer), `skip` drops it.

use crate::classify::ItemKind;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_GRID_WIDTH: u32 = 12;

/// Widest grid accepted; keeps column arithmetic well inside `u32`.
pub const MAX_GRID_WIDTH: u32 = 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PackError {
    #[error("Item width {width} does not fit a {grid_width}-column grid")]
    InvalidWidth { width: u32, grid_width: u32 },
    #[error("Item height must be at least 1")]
    InvalidHeight,
    #[error("Grid width must be between 1 and 1024")]
    InvalidGrid,
}

/// How many columns (and rows) an item of a given kind occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthPolicy {
    /// Every item is one column wide.
    #[default]
    Uniform,
    /// Images and embedded pages take four columns, links and blanks one.
    Sized,
}

impl WidthPolicy {
    pub fn width_for(self, kind: ItemKind) -> u32 {
        match (self, kind) {
            (WidthPolicy::Uniform, _) => 1,
            (WidthPolicy::Sized, ItemKind::Image | ItemKind::Iframe) => 4,
            (WidthPolicy::Sized, ItemKind::Link | ItemKind::Blank) => 1,
        }
    }

    pub fn height_for(self, _kind: ItemKind) -> u32 {
        1
    }
}

impl FromStr for WidthPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uniform" => Ok(WidthPolicy::Uniform),
            "sized" => Ok(WidthPolicy::Sized),
            other => Err(format!("unknown width policy '{other}' (expected uniform|sized)")),
        }
    }
}

/// What to do when a section ends with nothing pending on the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyRowPolicy {
    #[default]
    Emit,
    Skip,
}

impl FromStr for EmptyRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emit" => Ok(EmptyRowPolicy::Emit),
            "skip" => Ok(EmptyRowPolicy::Skip),
            other => Err(format!("unknown empty-row policy '{other}' (expected emit|skip)")),
        }
    }
}

/// An item ready to be placed: presentation data plus its footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: ItemKind,
    pub label: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl Cell {
    pub fn blank(width: u32) -> Self {
        Self {
            kind: ItemKind::Blank,
            label: None,
            url: None,
            icon: None,
            width,
            height: 1,
        }
    }
}

/// One placed column of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// 1-based starting column.
    pub column: u32,
    pub width: u32,
    pub kind: ItemKind,
    pub label: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
}

/// A closed row, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// 1-based row counter across the whole run.
    pub number: usize,
    pub title: Option<String>,
    pub height: u32,
    pub columns: Vec<ColumnDescriptor>,
}

impl RowRecord {
    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|c| c.width).sum()
    }
}

impl fmt::Display for RowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{}x{}", c.kind, c.width))
            .collect();
        write!(f, "row {} [{}]", self.number, kinds.join(" "))
    }
}

/// Row/column layout state machine.
///
/// Owns all layout state for one run; rows are returned to the caller as
/// they close instead of being written from inside the packer.
#[derive(Debug)]
pub struct GridPacker {
    grid_width: u32,
    empty_rows: EmptyRowPolicy,
    cursor: u32,
    row_height: u32,
    pending: Vec<ColumnDescriptor>,
    row_counter: usize,
    title: Option<String>,
}

impl GridPacker {
    pub fn new(grid_width: u32) -> Result<Self, PackError> {
        if grid_width == 0 || grid_width > MAX_GRID_WIDTH {
            return Err(PackError::InvalidGrid);
        }
        Ok(Self {
            grid_width,
            empty_rows: EmptyRowPolicy::default(),
            cursor: 1,
            row_height: 1,
            pending: Vec::new(),
            row_counter: 1,
            title: None,
        })
    }

    pub fn with_empty_rows(mut self, policy: EmptyRowPolicy) -> Self {
        self.empty_rows = policy;
        self
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    /// Set the title carried by every row of the section that follows.
    pub fn begin_section(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Where an item of `width` columns would be placed: `(row, column)`.
    ///
    /// Lets callers name per-cell output files before calling [`add`](Self::add).
    pub fn next_position(&self, width: u32) -> (usize, u32) {
        if self.overflows(width) {
            (self.row_counter + 1, 1)
        } else {
            (self.row_counter, self.cursor)
        }
    }

    fn overflows(&self, width: u32) -> bool {
        self.cursor + width > self.grid_width + 1
    }

    /// Place a cell, returning the row it pushed out (if any).
    pub fn add(&mut self, cell: Cell) -> Result<Option<RowRecord>, PackError> {
        if cell.width == 0 || cell.width > self.grid_width {
            return Err(PackError::InvalidWidth {
                width: cell.width,
                grid_width: self.grid_width,
            });
        }
        if cell.height == 0 {
            return Err(PackError::InvalidHeight);
        }

        let closed = if self.overflows(cell.width) {
            Some(self.close_row())
        } else {
            None
        };

        self.pending.push(ColumnDescriptor {
            column: self.cursor,
            width: cell.width,
            kind: cell.kind,
            label: cell.label,
            url: cell.url,
            icon: cell.icon,
        });
        self.cursor += cell.width;
        self.row_height = self.row_height.max(cell.height);

        Ok(closed)
    }

    /// Close the current row at the end of a section.
    pub fn flush(&mut self) -> Option<RowRecord> {
        if self.pending.is_empty() && self.empty_rows == EmptyRowPolicy::Skip {
            return None;
        }
        Some(self.close_row())
    }

    /// Pack a whole section: set its title, place every cell, flush.
    pub fn pack_section(
        &mut self,
        title: Option<String>,
        cells: impl IntoIterator<Item = Cell>,
    ) -> Result<Vec<RowRecord>, PackError> {
        self.begin_section(title);
        let mut rows = Vec::new();
        for cell in cells {
            rows.extend(self.add(cell)?);
        }
        rows.extend(self.flush());
        Ok(rows)
    }

    fn close_row(&mut self) -> RowRecord {
        let mut columns = std::mem::take(&mut self.pending);
        if self.cursor <= self.grid_width {
            columns.push(ColumnDescriptor {
                column: self.cursor,
                width: self.grid_width + 1 - self.cursor,
                kind: ItemKind::Blank,
                label: None,
                url: None,
                icon: None,
            });
        }

        let record = RowRecord {
            number: self.row_counter,
            title: self.title.clone(),
            height: self.row_height,
            columns,
        };

        self.cursor = 1;
        self.row_height = 1;
        self.row_counter += 1;
        record
    }
}
