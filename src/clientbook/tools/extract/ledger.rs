//! Block scanner for the consolidated accounting ledger.
//!
//! The ledger is one sheet in which every client occupies an 8-row block. The
//! block's rows hold, in order, the payment status, due date, bill, tax, total
//! bill, paid amount, signed flag and invoiced flag, each spread across one
//! column per month. Blocks are separated by irregular gaps where rows were
//! hidden or deleted, so after each block the scanner re-synchronises with a
//! bounded forward search instead of trusting the stride.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::clientbook::tools::model::{LedgerRecord, MonthlyBillingEntry};
use crate::clientbook::tools::sheet::dates::{normalize_date, serial_to_datetime};
use crate::clientbook::tools::sheet::readers::{parse_boolean, parse_number};
use crate::clientbook::tools::sheet::{CellValue, SheetGrid, format_number};

/// Rows per client block, one per [`MonthlyBillingEntry`] sub-field.
pub const BLOCK_HEIGHT: usize = 8;

/// How far past the expected position the scanner looks for the next block
/// before concluding the data has ended.
pub const LOOKAHEAD_ROWS: usize = 20;

/// Name of the ledger sheet inside the accounting workbook.
pub const LEDGER_SHEET: &str = "AllAccounts";

/// Day serials below this are treated as plain numbers in the month header.
const MIN_MONTH_SERIAL: f64 = 10_000.0;

/// Physical layout of the ledger sheet. All positions are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLayout {
    pub sheet_name: String,
    /// Rows searched for the First/Last column headers.
    pub header_scan_rows: usize,
    /// Row holding one month label per billing column.
    pub month_header_row: usize,
    pub first_month_col: usize,
    pub month_count: usize,
    /// Row the first client block is expected on.
    pub first_block_row: usize,
    /// Columns whose content marks a row as belonging to a client block. The
    /// first one carries the client number.
    pub identity_columns: [usize; 3],
    pub lookahead_rows: usize,
}

impl Default for LedgerLayout {
    fn default() -> Self {
        Self {
            sheet_name: LEDGER_SHEET.to_string(),
            header_scan_rows: 50,
            month_header_row: 2,
            // L..=AI
            first_month_col: 11,
            month_count: 24,
            first_block_row: 4,
            // B, C, D
            identity_columns: [1, 2, 3],
            lookahead_rows: LOOKAHEAD_ROWS,
        }
    }
}

impl LedgerLayout {
    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }

    fn month_columns(&self) -> impl Iterator<Item = usize> {
        self.first_month_col..self.first_month_col + self.month_count
    }

    fn client_number_column(&self) -> usize {
        self.identity_columns[0]
    }
}

/// Columns of the First/Last headers and their exact header text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NameHeader {
    first_col: usize,
    last_col: usize,
    first_text: String,
    last_text: String,
}

impl NameHeader {
    fn matches(&self, first: &str, last: &str) -> bool {
        first.eq_ignore_ascii_case(&self.first_text) || last.eq_ignore_ascii_case(&self.last_text)
    }
}

#[derive(Debug, Clone, Copy)]
enum ScalarField {
    SalesNotes,
    OperationsNotes,
    AccountingNotes,
    ContractTax,
    LiquidationTax,
    PaymentType,
    LastFour,
}

/// Column headers for the billing address, normalized like [`SCALAR_LABELS`].
/// Values sit below the header, in the client's block.
const BILLING_HEADERS: [&str; 4] = ["billing address", "bill city", "bill state", "bill zip"];

/// Columns of the billing address headers, in [`BILLING_HEADERS`] order.
type BillingColumns = [Option<usize>; 4];

/// Row labels searched inside a block, normalized to lowercase without a
/// trailing colon. The value sits in the cell right of the label.
const SCALAR_LABELS: &[(&str, ScalarField)] = &[
    ("sales notes", ScalarField::SalesNotes),
    ("operations notes", ScalarField::OperationsNotes),
    ("accounting notes", ScalarField::AccountingNotes),
    ("contract tax", ScalarField::ContractTax),
    ("liquidation tax", ScalarField::LiquidationTax),
    ("payment type", ScalarField::PaymentType),
    ("$ last 4", ScalarField::LastFour),
];

/// Scans the ledger sheet and returns one record per client block found.
pub fn scan_ledger(sheet: &SheetGrid, layout: &LedgerLayout) -> Vec<LedgerRecord> {
    let header = find_name_header(sheet, layout);
    if header.is_none() {
        warn!(sheet = sheet.name(), "no First/Last header row found, ledger names stay empty");
    }
    let billing = find_billing_columns(sheet, layout);
    let months = read_month_labels(sheet, layout);
    debug!(
        months = months.iter().filter(|label| !label.is_empty()).count(),
        "read ledger month header"
    );

    let mut records = Vec::new();
    let mut cursor = layout.first_block_row;
    while let Some(start) = seek_block_start(sheet, layout, cursor, layout.lookahead_rows) {
        if start != cursor {
            debug!(expected = cursor + 1, found = start + 1, "re-synchronised on ledger block");
        }
        records.push(extract_block(sheet, layout, start, header.as_ref(), &billing, &months));
        cursor = start + BLOCK_HEIGHT;
    }

    info!(sheet = sheet.name(), blocks = records.len(), "scanned ledger sheet");
    records
}

/// Bounded search for the next block start.
///
/// Probes `from`, then each following row, for at most `window` rows and
/// returns the first row with content in an identity column. `None` means the
/// gap is wider than the window, which is how the ledger's end is detected.
pub fn seek_block_start(
    sheet: &SheetGrid,
    layout: &LedgerLayout,
    from: usize,
    window: usize,
) -> Option<usize> {
    (from..from.saturating_add(window))
        .take_while(|row| *row < sheet.row_count())
        .find(|row| row_has_identity(sheet, layout, *row))
}

fn row_has_identity(sheet: &SheetGrid, layout: &LedgerLayout, row: usize) -> bool {
    layout
        .identity_columns
        .iter()
        .any(|col| !sheet.cell(row, *col).is_blank())
}

fn find_name_header(sheet: &SheetGrid, layout: &LedgerLayout) -> Option<NameHeader> {
    let rows = layout.header_scan_rows.min(sheet.row_count());
    (0..rows).find_map(|row| {
        let cells = sheet.row(row);
        let position = |prefix: &str| {
            cells.iter().enumerate().find_map(|(col, cell)| {
                let text = cell.display_text();
                text.to_lowercase().starts_with(prefix).then_some((col, text))
            })
        };
        let (first_col, first_text) = position("first")?;
        let (last_col, last_text) = position("last")?;
        Some(NameHeader {
            first_col,
            last_col,
            first_text,
            last_text,
        })
    })
}

fn find_billing_columns(sheet: &SheetGrid, layout: &LedgerLayout) -> BillingColumns {
    let rows = layout.header_scan_rows.min(sheet.row_count());
    BILLING_HEADERS.map(|header| {
        (0..rows).find_map(|row| {
            sheet
                .row(row)
                .iter()
                .position(|cell| normalize_label(&cell.display_text()) == header)
        })
    })
}

/// Month labels, positionally aligned with the month columns. Blank headers
/// are kept as empty strings so positions stay aligned.
fn read_month_labels(sheet: &SheetGrid, layout: &LedgerLayout) -> Vec<String> {
    layout
        .month_columns()
        .map(|col| match sheet.cell(layout.month_header_row, col) {
            CellValue::Number(serial) if *serial >= MIN_MONTH_SERIAL => serial_to_datetime(*serial)
                .map(|date| date.format("%b %Y").to_string())
                .unwrap_or_else(|| format_number(*serial)),
            other => other.display_text(),
        })
        .collect()
}

fn extract_block(
    sheet: &SheetGrid,
    layout: &LedgerLayout,
    start: usize,
    header: Option<&NameHeader>,
    billing: &BillingColumns,
    months: &[String],
) -> LedgerRecord {
    let rows = start..start + BLOCK_HEIGHT;
    let mut record = LedgerRecord {
        start_row: start + 1,
        ..LedgerRecord::default()
    };

    record.label = block_label(sheet, layout, rows.clone(), &mut record.anomalies);

    if let Some(header) = header {
        let mut pairs = rows.clone().filter_map(|row| {
            let first = sheet.cell(row, header.first_col).display_text();
            let last = sheet.cell(row, header.last_col).display_text();
            let empty = first.is_empty() && last.is_empty();
            (!empty && !header.matches(&first, &last)).then_some((first, last))
        });
        if let Some((first, last)) = pairs.next() {
            for (other_first, other_last) in pairs {
                if other_first != first || other_last != last {
                    record.anomalies.push(format!(
                        "conflicting names in block: kept '{first} {last}', ignored '{other_first} {other_last}'"
                    ));
                }
            }
            record.first_name = first;
            record.last_name = last;
        }
    }

    let [address, city, state, zip] = billing_address(sheet, rows.clone(), billing);
    record.billing_address = address;
    record.billing_city = city;
    record.billing_state = state;
    record.billing_zip = zip;

    for row in rows {
        for col in 0..layout.first_month_col {
            let label = normalize_label(&sheet.cell(row, col).display_text());
            let Some((_, field)) = SCALAR_LABELS.iter().find(|(text, _)| *text == label) else {
                continue;
            };
            let value = sheet.cell(row, col + 1);
            if value.is_blank() {
                continue;
            }
            apply_scalar(&mut record, *field, value);
        }
    }

    record.billing_details = billing_details(sheet, layout, start, months);

    if !record.anomalies.is_empty() {
        warn!(
            row = record.start_row,
            label = %record.label,
            anomalies = ?record.anomalies,
            "ledger heuristics disagree"
        );
    }
    record
}

/// First numeric value in the client-number column, falling back to its first
/// text. Additional distinct numbers are reported as anomalies.
fn block_label(
    sheet: &SheetGrid,
    layout: &LedgerLayout,
    rows: std::ops::Range<usize>,
    anomalies: &mut Vec<String>,
) -> String {
    let col = layout.client_number_column();
    let mut numbers: Vec<f64> = Vec::new();
    let mut first_text = None;
    for row in rows {
        match sheet.cell(row, col) {
            CellValue::Number(value) if value.is_finite() => {
                if !numbers.contains(value) {
                    numbers.push(*value);
                }
            }
            cell if !cell.is_blank() && first_text.is_none() => {
                first_text = Some(cell.display_text());
            }
            _ => {}
        }
    }

    match numbers.split_first() {
        Some((first, rest)) => {
            for other in rest {
                anomalies.push(format!(
                    "multiple client numbers in block: kept {}, ignored {}",
                    format_number(*first),
                    format_number(*other)
                ));
            }
            format_number(*first)
        }
        None => first_text.unwrap_or_default(),
    }
}

/// First value under each billing header inside the block, skipping repeats
/// of the header text itself.
fn billing_address(
    sheet: &SheetGrid,
    rows: std::ops::Range<usize>,
    billing: &BillingColumns,
) -> [String; 4] {
    let mut values: [String; 4] = Default::default();
    for ((value, column), header) in values.iter_mut().zip(billing).zip(BILLING_HEADERS) {
        let Some(col) = column else {
            continue;
        };
        *value = rows
            .clone()
            .map(|row| sheet.cell(row, *col).display_text())
            .find(|text| !text.is_empty() && normalize_label(text) != header)
            .unwrap_or_default();
    }
    values
}

fn normalize_label(text: &str) -> String {
    text.trim().trim_end_matches(':').trim().to_lowercase()
}

/// The first occurrence of a label wins.
fn apply_scalar(record: &mut LedgerRecord, field: ScalarField, value: &CellValue) {
    fn fill_text(slot: &mut String, value: &CellValue) {
        if slot.is_empty() {
            *slot = value.display_text();
        }
    }
    fn fill_rate(slot: &mut f64, value: &CellValue) {
        if *slot == 0.0 {
            *slot = parse_number(value).unwrap_or(0.0);
        }
    }

    match field {
        ScalarField::SalesNotes => fill_text(&mut record.sales_notes, value),
        ScalarField::OperationsNotes => fill_text(&mut record.operations_notes, value),
        ScalarField::AccountingNotes => fill_text(&mut record.accounting_notes, value),
        ScalarField::ContractTax => fill_rate(&mut record.contract_tax_rate, value),
        ScalarField::LiquidationTax => fill_rate(&mut record.liquidation_tax_rate, value),
        ScalarField::PaymentType => fill_text(&mut record.payment_type, value),
        ScalarField::LastFour => fill_text(&mut record.last_four_digits, value),
    }
}

fn billing_details(
    sheet: &SheetGrid,
    layout: &LedgerLayout,
    start: usize,
    months: &[String],
) -> BTreeMap<String, MonthlyBillingEntry> {
    let mut details = BTreeMap::new();
    for (label, col) in months.iter().zip(layout.month_columns()) {
        if label.is_empty() || details.contains_key(label) {
            continue;
        }
        let present = |offset: usize| {
            let cell = sheet.cell(start + offset, col);
            (!cell.is_blank()).then_some(cell)
        };
        let entry = MonthlyBillingEntry {
            payment_status: present(0).map(CellValue::display_text),
            due_date: present(1).map(normalize_date),
            bill: present(2).and_then(parse_number),
            tax: present(3).and_then(parse_number),
            total_bill: present(4).and_then(parse_number),
            paid: present(5).and_then(parse_number),
            signed: present(6).map(parse_boolean),
            invoiced: present(7).map(parse_boolean),
        };
        if !entry.is_empty() {
            details.insert(label.clone(), entry);
        }
    }
    details
}
