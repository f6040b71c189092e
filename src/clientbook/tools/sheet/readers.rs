//! Typed cell readers with safe defaults.
//!
//! Source sheets are maintained by hand and are routinely incomplete, so every
//! reader falls back to the caller's default for invalid addresses, positions
//! outside the sheet, blank cells, and values that do not parse as the
//! requested type. None of them can fail.

use super::address::resolve;
use super::dates::normalize_date;
use super::{CellValue, SheetGrid};

const TRUE_WORDS: [&str; 4] = ["yes", "y", "true", "1"];

/// Looks up the non-blank cell behind `addr`.
fn lookup<'a>(sheet: &'a SheetGrid, addr: &str) -> Option<&'a CellValue> {
    let (row, col) = resolve(addr).position()?;
    if row >= sheet.row_count() {
        return None;
    }
    sheet.get(row, col).filter(|cell| !cell.is_blank())
}

pub fn read_text(sheet: &SheetGrid, addr: &str, default: &str) -> String {
    lookup(sheet, addr)
        .map(CellValue::display_text)
        .unwrap_or_else(|| default.to_string())
}

pub fn read_number(sheet: &SheetGrid, addr: &str, default: f64) -> f64 {
    lookup(sheet, addr)
        .and_then(parse_number)
        .unwrap_or(default)
}

pub fn read_boolean(sheet: &SheetGrid, addr: &str, default: bool) -> bool {
    lookup(sheet, addr).map(parse_boolean).unwrap_or(default)
}

pub fn read_date(sheet: &SheetGrid, addr: &str, default: &str) -> String {
    lookup(sheet, addr)
        .map(normalize_date)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Interprets a cell as a number.
///
/// Text is reduced to its digits, periods and minus signs before conversion,
/// so `"$1,250.00"` reads as `1250.0`.
pub fn parse_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(value) if value.is_finite() => Some(*value),
        CellValue::Text(text) => {
            let cleaned: String = text
                .chars()
                .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
                .collect();
            cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
        }
        _ => None,
    }
}

/// Interprets a cell as a yes/no flag. Only `yes`, `y`, `true` and `1`
/// (case-insensitive) count as true.
pub fn parse_boolean(cell: &CellValue) -> bool {
    match cell {
        CellValue::Bool(value) => *value,
        other => {
            let text = other.display_text().to_lowercase();
            TRUE_WORDS.contains(&text.as_str())
        }
    }
}
