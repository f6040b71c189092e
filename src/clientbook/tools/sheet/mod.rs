//! Fully materialized, in-memory view of one worksheet.
//!
//! Every extractor in the crate works against [`SheetGrid`] rather than a
//! workbook reader, so parsing is a pure function of already-loaded cells and
//! tests can build sheets by hand.

pub mod address;
pub mod dates;
pub mod readers;

pub use address::{CellAddress, resolve};
pub use readers::{read_boolean, read_date, read_number, read_text};

/// One materialized cell.
///
/// Spreadsheet date cells are kept as [`CellValue::Number`] holding the raw day
/// serial; [`dates::normalize_date`] turns them into timestamps on demand.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Returns `true` for empty cells and text cells holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(value) => value.trim().is_empty(),
            CellValue::Number(_) | CellValue::Bool(_) => false,
        }
    }

    /// Renders the cell the way a spreadsheet user would read it, trimmed.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(value) => value.trim().to_string(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Bool(value) => value.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Formats a number without a trailing `.0` when it is integral.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Named grid of cells addressed with absolute zero-based coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    /// Creates an empty sheet with the given tab name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Creates a sheet from already materialized rows.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cell at the given position, if it lies inside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// Returns the cell at the given position, or an empty cell when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.get(row, col).unwrap_or(&EMPTY_CELL)
    }

    /// Returns the cells of one row; rows past the end are empty.
    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stores a value, growing the grid as needed.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value.into();
    }

    /// Stores a value at a spreadsheet-style address such as `"M7"`.
    ///
    /// Invalid addresses are ignored, matching the lenient readers.
    pub fn set_at(&mut self, addr: &str, value: impl Into<CellValue>) {
        if let Some((row, col)) = resolve(addr).position() {
            self.set(row, col, value);
        }
    }
}
