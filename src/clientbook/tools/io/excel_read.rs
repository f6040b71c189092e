use std::io::{Cursor, Read, Seek};

use calamine::{DataType, Range, Reader, Xlsx};

use crate::clientbook::tools::error::{Result, ToolError};
use crate::clientbook::tools::extract::is_client_tab;
use crate::clientbook::tools::sheet::{CellValue, SheetGrid};

/// Workbook opened from an in-memory upload.
pub type WorkbookBytes = Xlsx<Cursor<Vec<u8>>>;

/// Opens a workbook from raw file bytes.
pub fn open_workbook_bytes(bytes: &[u8]) -> Result<WorkbookBytes> {
    let workbook = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    Ok(workbook)
}

/// Materializes every client tab of the workbook, in workbook order.
pub fn read_client_tabs<R: Read + Seek>(workbook: &mut Xlsx<R>, origin: &str) -> Result<Vec<SheetGrid>> {
    let names: Vec<String> = workbook.sheet_names().to_vec();
    names
        .iter()
        .filter(|name| is_client_tab(name))
        .map(|name| read_required_sheet(workbook, name, origin))
        .collect()
}

/// Materializes one sheet, failing when the workbook does not contain it.
pub fn read_required_sheet<R: Read + Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
    origin: &str,
) -> Result<SheetGrid> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::MissingSheet {
            origin: origin.to_string(),
            sheet: name.to_string(),
        })?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range_to_grid(name, &range))
}

/// Copies a calamine range into a grid with absolute coordinates, so a used
/// range starting at, say, `C3` keeps `C3` at row 2, column 2.
pub fn range_to_grid(name: &str, range: &Range<DataType>) -> SheetGrid {
    let mut grid = SheetGrid::new(name);
    let Some((row_offset, col_offset)) = range.start() else {
        return grid;
    };

    for (row_idx, row) in range.rows().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let value = cell_value(cell);
            if value == CellValue::Empty {
                continue;
            }
            grid.set(
                row_offset as usize + row_idx,
                col_offset as usize + col_idx,
                value,
            );
        }
    }
    grid
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::DateTime(serial) => CellValue::Number(*serial),
        DataType::Empty | DataType::Error(_) => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}
