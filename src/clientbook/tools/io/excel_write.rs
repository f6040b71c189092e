use std::path::Path;

use rust_xlsxwriter::{Table, Workbook};

use crate::clientbook::tools::error::Result;
use crate::clientbook::tools::flatten::ExportTable;

/// Writes the export table to a single-sheet workbook at `path`.
///
/// The data range is wrapped in an autofiltered table when there is at least
/// one record; an empty export keeps just the header row.
pub fn write_workbook(path: &Path, table: &ExportTable) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !table.rows.is_empty() && !table.columns.is_empty() {
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.rows.len() as u32, col_end, &excel_table)?;
    }

    workbook.save(path)?;
    Ok(())
}
