use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::{CellValue, format_number};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Two days are subtracted from every serial: one because the spreadsheet
/// epoch is day 1 rather than day 0, one for the phantom 1900-02-29 the
/// spreadsheet engine counts.
const SERIAL_OFFSET_DAYS: f64 = 2.0;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    // `%y` must precede `%Y`: "1/5/24" is year 2024, not 24
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Converts a raw cell into an ISO-8601 UTC timestamp string.
///
/// Numbers are day serials, text goes through a list of common date layouts,
/// unparsable text is returned trimmed, and blank cells yield an empty string.
pub fn normalize_date(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => String::new(),
        CellValue::Number(serial) => {
            serial_to_iso(*serial).unwrap_or_else(|| format_number(*serial))
        }
        CellValue::Text(text) => {
            let trimmed = text.trim();
            parse_text_date(trimmed).unwrap_or_else(|| trimmed.to_string())
        }
        CellValue::Bool(value) => value.to_string(),
    }
}

/// Converts a spreadsheet day serial into a timestamp, keeping fractional days
/// to the millisecond.
pub fn serial_to_iso(serial: f64) -> Option<String> {
    serial_to_datetime(serial).map(format_timestamp)
}

pub fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - SERIAL_OFFSET_DAYS) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let offset = Duration::try_milliseconds(millis as i64)?;
    epoch
        .checked_add_signed(offset)
        .map(|naive| naive.and_utc())
}

/// Parses free-form date text into a timestamp string.
pub fn parse_text_date(text: &str) -> Option<String> {
    parse_text_datetime(text).map(format_timestamp)
}

pub fn parse_text_datetime(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

/// Renders `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
