use std::collections::BTreeMap;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use clientbook_tools::flatten::{EXPORT_SHEET, build_export_table, month_labels};
use clientbook_tools::io::csv_export::{render_csv, write_csv_file};
use clientbook_tools::io::excel_write::write_workbook;
use clientbook_tools::model::{CanonicalClientRecord, LedgerRecord, MonthlyBillingEntry};
use tempfile::tempdir;

const NOW: &str = "2024-06-01T12:00:00.000Z";

fn ledger_client(first: &str, last: &str, months: &[&str]) -> CanonicalClientRecord {
    let billing_details: BTreeMap<String, MonthlyBillingEntry> = months
        .iter()
        .map(|month| {
            let entry = MonthlyBillingEntry {
                payment_status: Some("Paid".to_string()),
                bill: Some(1500.0),
                signed: Some(true),
                ..MonthlyBillingEntry::default()
            };
            (month.to_string(), entry)
        })
        .collect();
    CanonicalClientRecord::from_ledger(
        LedgerRecord {
            label: "12".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            billing_details,
            ..LedgerRecord::default()
        },
        NOW,
    )
}

#[test]
fn orders_month_columns_chronologically() {
    let records = vec![
        ledger_client("Jane", "Doe", &["Feb 2024", "Notes"]),
        ledger_client("John", "Roe", &["Jan 2024", "Dec 2023"]),
    ];
    assert_eq!(month_labels(&records), ["Dec 2023", "Jan 2024", "Feb 2024", "Notes"]);

    let table = build_export_table(&records);
    assert_eq!(table.sheet_name, EXPORT_SHEET);
    let first_month = table
        .columns
        .iter()
        .position(|column| column == "Dec 2023 Payment Status")
        .expect("month columns present");
    assert_eq!(table.columns.len(), first_month + 4 * 8);
    assert_eq!(table.columns[first_month + 7], "Dec 2023 Invoiced");
    assert_eq!(table.columns[first_month + 8], "Jan 2024 Payment Status");

    let jane = &table.rows[0];
    assert_eq!(jane.len(), table.columns.len());
    assert_eq!(jane[first_month], "");
    let feb = first_month + 2 * 8;
    assert_eq!(jane[feb], "Paid");
    assert_eq!(jane[feb + 2], "1500");
    assert_eq!(jane[feb + 6], "true");
    assert_eq!(jane[feb + 7], "");
}

#[test]
fn quotes_fields_that_need_it() {
    let mut record = ledger_client("Jane", "Doe", &[]);
    record.profile.comments = "He said \"hi\", then left".to_string();
    record.profile.billing_address = "1 Main St\nApt 4".to_string();

    let csv = render_csv(&build_export_table(&[record])).expect("CSV rendered");
    let mut lines = csv.lines();
    let header = lines.next().expect("header line");
    assert!(header.starts_with("Client Number,First Name,Last Name,"));
    assert!(csv.contains("\"He said \"\"hi\"\", then left\""));
    assert!(csv.contains("\"1 Main St\nApt 4\""));
    assert!(csv.contains(",Jane,Doe,"));
}

#[test]
fn writes_csv_and_xlsx_files() {
    let records = vec![
        ledger_client("Jane", "Doe", &["Jan 2024"]),
        ledger_client("John", "Roe", &[]),
    ];
    let table = build_export_table(&records);
    let temp_dir = tempdir().expect("temporary directory");

    let csv_path = temp_dir.path().join("clients.csv");
    write_csv_file(&csv_path, &table).expect("CSV written");
    let written = std::fs::read_to_string(&csv_path).expect("CSV read back");
    assert_eq!(written.lines().count(), 3);

    let xlsx_path = temp_dir.path().join("clients.xlsx");
    write_workbook(&xlsx_path, &table).expect("Excel written");
    let mut workbook: Xlsx<_> = open_workbook(&xlsx_path).expect("Excel opened");
    assert_eq!(workbook.sheet_names().to_vec(), [EXPORT_SHEET.to_string()]);
    let range = workbook
        .worksheet_range(EXPORT_SHEET)
        .expect("sheet present")
        .expect("sheet readable");
    assert_eq!(range.get_value((0, 0)), Some(&DataType::String("Client Number".to_string())));
    assert_eq!(range.get_value((1, 1)), Some(&DataType::String("Jane".to_string())));
    assert_eq!(range.get_value((2, 2)), Some(&DataType::String("Roe".to_string())));
}

#[test]
fn writes_a_header_only_workbook_for_an_empty_export() {
    let table = build_export_table(&[]);
    assert!(table.rows.is_empty());
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("empty.xlsx");
    write_workbook(&xlsx_path, &table).expect("Excel written");
    assert!(xlsx_path.exists());
}
