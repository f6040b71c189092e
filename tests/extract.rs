use clientbook_tools::extract::ledger::LEDGER_SHEET;
use clientbook_tools::extract::{
    LedgerLayout, is_client_tab, parse_client_tab, parse_client_tabs, scan_ledger,
    seek_block_start,
};
use clientbook_tools::model::{CanonicalClientRecord, FieldValue, SourceVersion};
use clientbook_tools::schema::{V2_SCHEMA, V3_V4_SCHEMA, field, schema_for};
use clientbook_tools::sheet::SheetGrid;

const NOW: &str = "2024-06-01T12:00:00.000Z";

#[test]
fn client_tabs_start_with_a_digit() {
    for name in ["12B", "7", " 104 ", "3 - Smith"] {
        assert!(is_client_tab(name), "{name:?}");
    }
    for name in ["Summary", "Instructions", "", "   ", "Template 1", "#12"] {
        assert!(!is_client_tab(name), "{name:?}");
    }
}

#[test]
fn v3_and_v4_share_a_schema() {
    assert_eq!(schema_for(SourceVersion::V3), schema_for(SourceVersion::V4));
    assert_eq!(schema_for(SourceVersion::V2), V2_SCHEMA);
    assert_eq!(schema_for(SourceVersion::V4), V3_V4_SCHEMA);
}

fn v3_tab(name: &str, first: &str, last: &str) -> SheetGrid {
    let mut sheet = SheetGrid::new(name);
    sheet.set_at("C6", "Morgan");
    sheet.set_at("M7", last);
    sheet.set_at("N7", first);
    sheet.set_at("O7", "Fort Bragg");
    sheet.set_at("P7", 44927.0);
    sheet.set_at("T7", "jane@example.com");
    sheet.set_at("F8", "Yes");
    sheet.set_at("G8", "2");
    sheet.set_at("S20", "Card");
    sheet
}

#[test]
fn parses_a_v3_tab_through_its_schema() {
    let record = parse_client_tab(&v3_tab(" 12B ", "Jane", "Doe"), SourceVersion::V3);

    assert_eq!(record.version, SourceVersion::V3);
    assert_eq!(record.tab, " 12B ");
    assert_eq!(record.client_number, "12B");
    assert_eq!(record.fields.len(), V3_V4_SCHEMA.len());
    assert_eq!(record.text(field::FIRST_NAME), "Jane");
    assert_eq!(record.text(field::LAST_NAME), "Doe");
    assert_eq!(record.text(field::SALES_REP), "Morgan");
    assert_eq!(record.text(field::CONTRACT_START_DATE), "2023-01-01T00:00:00.000Z");
    assert_eq!(record.text(field::CONTRACT_END_DATE), "");
    assert_eq!(record.boolean(field::HAS_ROOMMATES), Some(true));
    assert_eq!(record.number(field::TOTAL_ROOMMATES), Some(2.0));
    assert_eq!(record.number(field::TOTAL_PAID), Some(0.0));
    assert_eq!(
        record.fields.get(field::PAYMENT_METHOD),
        Some(&FieldValue::Text("Card".to_string()))
    );
}

/// V2 tab laid out like the template: headers on row 6, personal data on
/// row 7, the deal row on row 8, addresses on row 13, tax flags on row 15 and
/// labeled orders rows further down column A.
fn v2_tab(name: &str) -> SheetGrid {
    let mut sheet = SheetGrid::new(name);
    for (address, header) in [("M6", "Last Name"), ("N6", "First"), ("T6", "Email")] {
        sheet.set_at(address, header);
    }
    sheet.set_at("M7", "Smith");
    sheet.set_at("N7", "John");
    sheet.set_at("P7", 44927.0);
    sheet.set_at("T7", "john@example.com");
    sheet.set_at("B8", "PCS");
    sheet.set_at("E8", "Active");
    sheet.set_at("F8", "y");
    sheet.set_at("G8", 3.0);
    sheet.set_at("M13", "1 Main St");
    sheet.set_at("O13", "NC");
    sheet.set_at("U13", "$2,100");
    sheet.set_at("D15", "Yes");
    sheet.set_at("E15", "no");
    sheet.set_at("F15", "Per night");
    sheet.set_at("A18", "Orders Start");
    sheet.set_at("B18", 44941.0);
    sheet.set_at("A19", "Orders End");
    sheet.set_at("B19", "2023-06-30");
    sheet.set_at("A20", "Contract Value");
    sheet.set_at("B20", "$18,000");
    sheet
}

#[test]
fn parses_a_v2_tab_with_its_own_layout() {
    let record = parse_client_tab(&v2_tab("7"), SourceVersion::V2);
    assert_eq!(record.fields.len(), V2_SCHEMA.len());
    assert_eq!(record.text(field::LAST_NAME), "Smith");
    assert_eq!(record.text(field::FIRST_NAME), "John");
    assert_eq!(record.text(field::EMAIL), "john@example.com");
    assert_eq!(record.text(field::CONTRACT_START_DATE), "2023-01-01T00:00:00.000Z");
    assert_eq!(record.text(field::TDY_TYPE), "PCS");
    assert_eq!(record.text(field::CONTRACT_STATUS), "Active");
    assert_eq!(record.boolean(field::HAS_ROOMMATES), Some(true));
    assert_eq!(record.number(field::TOTAL_ROOMMATES), Some(3.0));
    assert_eq!(record.text(field::BILLING_ADDRESS), "1 Main St");
    assert_eq!(record.text(field::BILLING_STATE), "NC");
    assert_eq!(record.number(field::MONTHLY_RENT), Some(2100.0));
    assert_eq!(record.boolean(field::LODGING_TAX_EXEMPT), Some(true));
    assert_eq!(record.boolean(field::LODGING_TAX_REIMBURSABLE), Some(false));
    assert_eq!(record.text(field::TAX_CALCULATION_METHOD), "Per night");
    assert_eq!(record.text(field::PER_DIEM_START_DATE), "2023-01-15T00:00:00.000Z");
    assert_eq!(record.text(field::PER_DIEM_END_DATE), "2023-06-30T00:00:00.000Z");
    assert_eq!(record.number(field::MAX_LODGING_ALLOCATION), Some(18000.0));
}

#[test]
fn v2_tabs_with_a_name_are_kept() {
    let mut sparse = SheetGrid::new("8");
    sparse.set_at("M6", "Last Name");
    sparse.set_at("N6", "First");
    sparse.set_at("M7", "Doe");
    sparse.set_at("N7", "Jane");
    sparse.set_at("E8", "Active");
    sparse.set_at("M13", "1 Main St");

    let records = parse_client_tabs(&[sparse, v2_tab("7"), SheetGrid::new("9")], SourceVersion::V2);
    let names: Vec<&str> = records.iter().map(|record| record.text(field::LAST_NAME)).collect();
    assert_eq!(names, ["Doe", "Smith"]);
    // labeled rows that are absent fall back to defaults
    assert_eq!(records[0].text(field::PER_DIEM_START_DATE), "");
    assert_eq!(records[0].number(field::MAX_LODGING_ALLOCATION), Some(0.0));
}

#[test]
fn skips_non_client_and_nameless_tabs() {
    let mut instructions = SheetGrid::new("Instructions");
    instructions.set_at("M7", "Read me");
    instructions.set_at("N7", "first");
    let blank_template = SheetGrid::new("99");
    let sheets = vec![
        instructions,
        v3_tab("12B", "Jane", "Doe"),
        blank_template,
        v3_tab("13", "", "Solo"),
    ];

    let records = parse_client_tabs(&sheets, SourceVersion::V4);
    let tabs: Vec<&str> = records.iter().map(|record| record.tab.as_str()).collect();
    assert_eq!(tabs, ["12B", "13"]);
    assert!(records.iter().all(|record| record.version == SourceVersion::V4));
}

/// Ledger sheet with the month header on row 3, the First/Last header on
/// row 4 and one block per `(first row, number, first, last)` entry.
fn ledger_sheet(blocks: &[(usize, f64, &str, &str)]) -> SheetGrid {
    let mut sheet = SheetGrid::new(LEDGER_SHEET);
    sheet.set_at("A1", "Master Accounting");
    sheet.set_at("L3", "Jan 2024");
    sheet.set_at("M3", 45323.0);
    sheet.set_at("B4", "Client #");
    sheet.set_at("C4", "First Name");
    sheet.set_at("D4", "Last Name");
    for (start, number, first, last) in blocks {
        let row = |offset: usize| start + offset;
        sheet.set(row(0), 1, *number);
        sheet.set(row(0), 2, *first);
        sheet.set(row(0), 3, *last);
        sheet.set(row(1), 4, "Contract Tax:");
        sheet.set(row(1), 5, "14.5%");
        sheet.set(row(2), 4, "Payment Type");
        sheet.set(row(2), 5, "ACH");
        sheet.set(row(3), 4, "Sales Notes");
        sheet.set(row(3), 5, "Referred by base housing");
        sheet.set(row(0), 11, "Paid");
        sheet.set(row(1), 11, 45292.0);
        sheet.set(row(2), 11, "$1,500");
        sheet.set(row(5), 11, 1500.0);
        sheet.set(row(6), 11, "yes");
        sheet.set(row(7), 11, "no");
        sheet.set(row(2), 12, 1500.0);
    }
    sheet
}

#[test]
fn scans_blocks_and_their_monthly_billing() {
    let sheet = ledger_sheet(&[(4, 101.0, "Jane", "Doe"), (12, 102.0, "John", "Smith")]);
    let records = scan_ledger(&sheet, &LedgerLayout::default());

    assert_eq!(records.len(), 2);
    let jane = &records[0];
    assert_eq!(jane.label, "101");
    assert_eq!(jane.start_row, 5);
    assert_eq!((jane.first_name.as_str(), jane.last_name.as_str()), ("Jane", "Doe"));
    assert_eq!(jane.contract_tax_rate, 14.5);
    assert_eq!(jane.liquidation_tax_rate, 0.0);
    assert_eq!(jane.payment_type, "ACH");
    assert_eq!(jane.sales_notes, "Referred by base housing");
    assert!(jane.anomalies.is_empty());

    let january = &jane.billing_details["Jan 2024"];
    assert_eq!(january.payment_status.as_deref(), Some("Paid"));
    assert_eq!(january.due_date.as_deref(), Some("2024-01-01T00:00:00.000Z"));
    assert_eq!(january.bill, Some(1500.0));
    assert_eq!(january.tax, None);
    assert_eq!(january.paid, Some(1500.0));
    assert_eq!(january.signed, Some(true));
    assert_eq!(january.invoiced, Some(false));

    let february = &jane.billing_details["Feb 2024"];
    assert_eq!(february.bill, Some(1500.0));
    assert_eq!(february.payment_status, None);

    assert_eq!(records[1].label, "102");
    assert_eq!(records[1].start_row, 13);
}

#[test]
fn recovers_the_billing_address_under_its_headers() {
    let mut sheet = ledger_sheet(&[(4, 101.0, "Jane", "Doe"), (12, 102.0, "John", "Smith")]);
    for (col, header) in [(6, "Billing Address"), (7, "Bill City"), (8, "Bill State"), (9, "Bill Zip")] {
        sheet.set(3, col, header);
    }
    // the header repeated inside a block is not a value
    sheet.set(4, 6, "Billing Address");
    sheet.set(5, 6, "1 Main St");
    sheet.set(4, 7, "Fayetteville");
    sheet.set(4, 8, "NC");
    sheet.set(6, 9, 28301.0);

    let records = scan_ledger(&sheet, &LedgerLayout::default());
    let jane = &records[0];
    assert_eq!(jane.billing_address, "1 Main St");
    assert_eq!(jane.billing_city, "Fayetteville");
    assert_eq!(jane.billing_state, "NC");
    assert_eq!(jane.billing_zip, "28301");
    assert_eq!(records[1].billing_address, "");

    let profile = CanonicalClientRecord::from_ledger(jane.clone(), NOW).profile;
    assert_eq!(profile.billing_address, "1 Main St");
    assert_eq!(profile.billing_zip, "28301");
}

#[test]
fn re_synchronises_across_a_gap_inside_the_lookahead() {
    // block one covers rows 4..12, then five empty rows
    let sheet = ledger_sheet(&[(4, 101.0, "Jane", "Doe"), (17, 102.0, "John", "Smith")]);
    let layout = LedgerLayout::default();

    assert_eq!(seek_block_start(&sheet, &layout, 12, layout.lookahead_rows), Some(17));
    let records = scan_ledger(&sheet, &layout);
    let labels: Vec<&str> = records.iter().map(|record| record.label.as_str()).collect();
    assert_eq!(labels, ["101", "102"]);
    assert_eq!(records[1].last_name, "Smith");
}

#[test]
fn stops_when_the_gap_exceeds_the_lookahead() {
    let sheet = ledger_sheet(&[(4, 101.0, "Jane", "Doe"), (12 + 21, 102.0, "John", "Smith")]);
    let layout = LedgerLayout::default();

    assert_eq!(seek_block_start(&sheet, &layout, 12, layout.lookahead_rows), None);
    let records = scan_ledger(&sheet, &layout);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label, "101");
}

#[test]
fn records_conflicting_block_identity() {
    let mut sheet = ledger_sheet(&[(4, 101.0, "Jane", "Doe")]);
    sheet.set(6, 1, 555.0);
    sheet.set(7, 2, "Janet");
    sheet.set(7, 3, "Doe");

    let records = scan_ledger(&sheet, &LedgerLayout::default());
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.label, "101");
    assert_eq!(record.first_name, "Jane");
    assert_eq!(record.anomalies.len(), 2);
}

#[test]
fn honours_a_custom_sheet_name_and_empty_ledgers() {
    let layout = LedgerLayout::default().with_sheet_name("Ledger 2024");
    assert_eq!(layout.sheet_name, "Ledger 2024");

    let empty = SheetGrid::new("Ledger 2024");
    assert!(scan_ledger(&empty, &layout).is_empty());
}
