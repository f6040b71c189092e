//! Flattens canonical records into one rectangular table for CSV and XLSX
//! export.
//!
//! The column set is static, followed by one block of eight columns per
//! distinct ledger month found across all records.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::clientbook::tools::model::{CanonicalClientRecord, MonthlyBillingEntry};
use crate::clientbook::tools::sheet::format_number;

/// Sheet name used when the table is written to a workbook.
pub const EXPORT_SHEET: &str = "Clients";

/// A table ready to be serialised.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

type ColumnValue = fn(&CanonicalClientRecord) -> String;

fn number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn flag(value: Option<bool>) -> String {
    value.map(|flag| flag.to_string()).unwrap_or_default()
}

const STATIC_COLUMNS: &[(&str, ColumnValue)] = &[
    ("Client Number", |r| r.profile.client_number.clone()),
    ("First Name", |r| r.profile.first_name.clone()),
    ("Last Name", |r| r.profile.last_name.clone()),
    ("Email", |r| r.profile.email.clone()),
    ("Gov Email", |r| r.profile.gov_email.clone()),
    ("Cell", |r| r.profile.cell.clone()),
    ("TDY Location", |r| r.profile.tdy_location.clone()),
    ("Gov Agency or Dept", |r| r.profile.gov_agency_or_dept.clone()),
    ("TDY Type", |r| r.profile.tdy_type.clone()),
    ("Deal Type", |r| r.profile.deal_type.clone()),
    ("Contract Status", |r| r.profile.contract_status.clone()),
    ("Has Roommates", |r| flag(r.profile.has_roommates)),
    ("Total Roommates", |r| number(r.profile.total_roommates)),
    ("Orders Start", |r| r.profile.per_diem_start_date.clone()),
    ("Orders End", |r| r.profile.per_diem_end_date.clone()),
    ("Contract Start", |r| r.profile.contract_start_date.clone()),
    ("Contract End", |r| r.profile.contract_end_date.clone()),
    ("Max Lodging Allocation", |r| number(r.profile.max_lodging_allocation)),
    ("Liquidation Tax Rate", |r| number(r.profile.liquidation_tax_rate)),
    ("Contract Tax Rate", |r| number(r.profile.contract_tax_rate)),
    ("Referral Source", |r| r.profile.referral_source.clone()),
    ("Referral Fee Type", |r| r.profile.referral_fee_type.clone()),
    ("Sales Rep", |r| r.profile.sales_rep.clone()),
    ("Lodging Tax Exempt", |r| flag(r.profile.lodging_tax_exempt)),
    ("Lodging Tax Reimbursable", |r| flag(r.profile.lodging_tax_reimbursable)),
    ("Tax Calculation Method", |r| r.profile.tax_calculation_method.clone()),
    ("Client Worksheet URL", |r| r.profile.client_worksheet_url.clone()),
    ("Number of Nights", |r| number(r.profile.number_of_nights)),
    ("Billing Address", |r| r.profile.billing_address.clone()),
    ("Billing City", |r| r.profile.billing_city.clone()),
    ("Billing State", |r| r.profile.billing_state.clone()),
    ("Billing Zip", |r| r.profile.billing_zip.clone()),
    ("Monthly Rent", |r| number(r.profile.monthly_rent)),
    ("Total Contract Value", |r| number(r.profile.total_contract_value)),
    ("Total Paid", |r| number(r.profile.total_paid)),
    ("Balance Due", |r| number(r.profile.balance_due)),
    ("Payment Type", |r| r.profile.payment_type.clone()),
    ("Comments", |r| r.profile.comments.clone()),
    ("In V2", |r| r.is_in_v2.to_string()),
    ("In V3", |r| r.is_in_v3.to_string()),
    ("In V4", |r| r.is_in_v4.to_string()),
    ("In Master Accounting", |r| r.is_in_master_accounting.to_string()),
    ("Ledger Label", |r| r.ledger_label().unwrap_or_default().to_string()),
    ("Created At", |r| r.created_at.clone()),
    ("Updated At", |r| r.updated_at.clone()),
];

type MonthValue = fn(&MonthlyBillingEntry) -> String;

const MONTH_COLUMNS: [(&str, MonthValue); 8] = [
    ("Payment Status", |e| e.payment_status.clone().unwrap_or_default()),
    ("Due Date", |e| e.due_date.clone().unwrap_or_default()),
    ("Bill", |e| number(e.bill)),
    ("Tax", |e| number(e.tax)),
    ("Total Bill", |e| number(e.total_bill)),
    ("Paid", |e| number(e.paid)),
    ("Signed", |e| flag(e.signed)),
    ("Invoiced", |e| flag(e.invoiced)),
];

/// Builds the export table for the given records, in record order.
pub fn build_export_table(records: &[CanonicalClientRecord]) -> ExportTable {
    let months = month_labels(records);

    let mut columns: Vec<String> = STATIC_COLUMNS
        .iter()
        .map(|(header, _)| header.to_string())
        .collect();
    for month in &months {
        columns.extend(
            MONTH_COLUMNS
                .iter()
                .map(|(suffix, _)| format!("{month} {suffix}")),
        );
    }

    let rows = records
        .iter()
        .map(|record| {
            let mut cells: Vec<String> = STATIC_COLUMNS
                .iter()
                .map(|(_, value)| value(record))
                .collect();
            let details = record
                .master_accounting
                .as_ref()
                .map(|ledger| &ledger.billing_details);
            for month in &months {
                let entry = details.and_then(|details| details.get(month));
                cells.extend(MONTH_COLUMNS.iter().map(|(_, value)| {
                    entry.map(|entry| value(entry)).unwrap_or_default()
                }));
            }
            cells
        })
        .collect();

    ExportTable {
        sheet_name: EXPORT_SHEET.to_string(),
        columns,
        rows,
    }
}

/// Distinct month labels across every record, chronological where the label
/// reads as a month, then the rest alphabetically.
pub fn month_labels(records: &[CanonicalClientRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = records
        .iter()
        .filter_map(|record| record.master_accounting.as_ref())
        .flat_map(|ledger| ledger.billing_details.keys())
        .map(String::as_str)
        .filter(|label| !label.is_empty())
        .collect();

    let mut labels: Vec<(Option<NaiveDate>, &str)> = distinct
        .into_iter()
        .map(|label| (parse_month(label), label))
        .collect();
    labels.sort_by(|lhs, rhs| match (lhs.0, rhs.0) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| lhs.1.cmp(rhs.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => lhs.1.cmp(rhs.1),
    });
    labels.into_iter().map(|(_, label)| label.to_string()).collect()
}

const MONTH_FORMATS: &[&str] = &[
    "%d %b %y",
    "%d %b %Y",
    "%d %B %Y",
    "%d %b-%y",
    "%d %B-%y",
    "%d %Y-%m",
];

fn parse_month(label: &str) -> Option<NaiveDate> {
    let candidate = format!("1 {}", label.trim());
    MONTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&candidate, format).ok())
}
