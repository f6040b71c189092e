use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::clientbook::tools::error::Result;
use crate::clientbook::tools::flatten::ExportTable;

/// Writes the table as CSV: header row first, then one line per record.
///
/// Fields containing the delimiter, a quote or a line break are quoted and
/// embedded quotes are doubled.
pub fn write_csv<W: Write>(writer: W, table: &ExportTable) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);
    csv_writer.write_record(&table.columns)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders the table to an in-memory CSV string.
pub fn render_csv(table: &ExportTable) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, table)?;
    String::from_utf8(buffer).map_err(|error| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, error).into()
    })
}

/// Writes the table to a CSV file at `path`, replacing any existing file.
pub fn write_csv_file(path: &Path, table: &ExportTable) -> Result<()> {
    let file = File::create(path)?;
    write_csv(file, table)
}
