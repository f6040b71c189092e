//! Field → cell-address tables for the per-tab client workbooks.
//!
//! The tables are the physical contract with the source templates. Inserting or
//! removing rows or columns in a template silently shifts every address below
//! or right of the change; the readers degrade to defaults rather than failing,
//! so the tables must be revalidated whenever a template changes.
//!
//! V3 and V4 share one layout. V2 uses the same personal row and deal row,
//! carries its billing/delivery address and monthly charges on row 13 and its
//! tax flags on row 15, and keeps the orders dates and contract value on
//! rows identified by their column A label.

use crate::clientbook::tools::model::{FieldValue, SourceVersion};
use crate::clientbook::tools::sheet::{SheetGrid, read_boolean, read_date, read_number, read_text};

/// Field names shared by every version and by the canonical record.
pub mod field {
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const EMAIL: &str = "email";
    pub const GOV_EMAIL: &str = "govEmail";
    pub const CELL: &str = "cell";
    pub const TDY_LOCATION: &str = "tdyLocation";
    pub const GOV_AGENCY_OR_DEPT: &str = "govAgencyOrDept";
    pub const TDY_TYPE: &str = "tdyType";
    pub const DEAL_TYPE: &str = "dealType";
    pub const CONTRACT_STATUS: &str = "contractStatus";
    pub const HAS_ROOMMATES: &str = "hasRoommates";
    pub const TOTAL_ROOMMATES: &str = "totalRoommates";
    pub const PER_DIEM_START_DATE: &str = "perDiemStartDate";
    pub const PER_DIEM_END_DATE: &str = "perDiemEndDate";
    pub const CONTRACT_START_DATE: &str = "contractStartDate";
    pub const CONTRACT_END_DATE: &str = "contractEndDate";
    pub const MAX_LODGING_ALLOCATION: &str = "maxLodgingAllocation";
    pub const LIQUIDATION_TAX_RATE: &str = "liquidationTaxRate";
    pub const CONTRACT_TAX_RATE: &str = "contractTaxRate";
    pub const REFERRAL_SOURCE: &str = "referralSource";
    pub const REFERRAL_FEE_TYPE: &str = "referralFeeType";
    pub const REFERRAL_FEE_AMOUNT: &str = "referralFeeAmount";
    pub const SALES_REP: &str = "salesRep";
    pub const LODGING_TAX_EXEMPT: &str = "lodgingTaxExempt";
    pub const LODGING_TAX_REIMBURSABLE: &str = "lodgingTaxReimbursable";
    pub const TAX_CALCULATION_METHOD: &str = "taxCalculationMethod";
    pub const CLIENT_WORKSHEET_URL: &str = "clientWorksheetUrl";
    pub const NUMBER_OF_NIGHTS: &str = "numberOfNights";

    // V2 only
    pub const BILLING_ADDRESS: &str = "billingAddress";
    pub const BILLING_CITY: &str = "billingCity";
    pub const BILLING_STATE: &str = "billingState";
    pub const BILLING_ZIP: &str = "billingZip";
    pub const DELIVERY_ADDRESS: &str = "deliveryAddress";
    pub const DELIVERY_CITY: &str = "deliveryCity";
    pub const DELIVERY_STATE: &str = "deliveryState";
    pub const DELIVERY_ZIP: &str = "deliveryZip";
    pub const MONTHLY_RENT: &str = "monthlyRent";
    pub const MONTHLY_UTILITIES: &str = "monthlyUtilities";

    // V3/V4 financial summary
    pub const TOTAL_CONTRACT_VALUE: &str = "totalContractValue";
    pub const TOTAL_BILLED: &str = "totalBilled";
    pub const TOTAL_PAID: &str = "totalPaid";
    pub const BALANCE_DUE: &str = "balanceDue";
    pub const SECURITY_DEPOSIT: &str = "securityDeposit";
    pub const LAST_PAYMENT_DATE: &str = "lastPaymentDate";
    pub const PAYMENT_METHOD: &str = "paymentMethod";
    pub const CARD_LAST_FOUR: &str = "cardLastFour";
    pub const LODGING_COST: &str = "lodgingCost";
    pub const LODGING_TAX_AMOUNT: &str = "lodgingTaxAmount";
    pub const CLEANING_FEE: &str = "cleaningFee";
    pub const PET_FEE: &str = "petFee";
    pub const PROFIT_MARGIN: &str = "profitMargin";
    pub const NEXT_PAYMENT_DUE: &str = "nextPaymentDue";
    pub const INVOICE_FREQUENCY: &str = "invoiceFrequency";
    pub const AUTOPAY_ENROLLED: &str = "autopayEnrolled";
}

/// Reader used for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
}

/// Where a field's value sits on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A fixed address such as `"M7"`.
    Cell(&'static str),
    /// Column B of the first row whose column A reads exactly this label.
    RowLabel(&'static str),
}

/// One schema entry: where a field lives and how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: &'static str,
    pub location: Location,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(field: &'static str, address: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            location: Location::Cell(address),
            kind,
        }
    }

    const fn labeled(field: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            location: Location::RowLabel(label),
            kind,
        }
    }

    /// Reads this field from a sheet, falling back to the kind's default.
    pub fn read(&self, sheet: &SheetGrid) -> FieldValue {
        let address = match self.location {
            Location::Cell(address) => address.to_string(),
            Location::RowLabel(label) => match find_labeled_row(sheet, label) {
                Some(row) => format!("B{}", row + 1),
                None => String::new(),
            },
        };
        let address = address.as_str();
        match self.kind {
            FieldKind::Text => FieldValue::Text(read_text(sheet, address, "")),
            FieldKind::Number => FieldValue::Number(read_number(sheet, address, 0.0)),
            FieldKind::Boolean => FieldValue::Boolean(read_boolean(sheet, address, false)),
            FieldKind::Date => FieldValue::Text(read_date(sheet, address, "")),
        }
    }
}

fn find_labeled_row(sheet: &SheetGrid, label: &str) -> Option<usize> {
    (0..sheet.row_count()).find(|&row| sheet.cell(row, 0).display_text() == label)
}

use FieldKind::{Boolean, Date, Number, Text};
use field::*;

pub const V2_SCHEMA: &[FieldSpec] = &[
    // personal row under the row 6 headers
    FieldSpec::new(LAST_NAME, "M7", Text),
    FieldSpec::new(FIRST_NAME, "N7", Text),
    FieldSpec::new(TDY_LOCATION, "O7", Text),
    FieldSpec::new(CONTRACT_START_DATE, "P7", Date),
    FieldSpec::new(CONTRACT_END_DATE, "Q7", Date),
    FieldSpec::new(GOV_AGENCY_OR_DEPT, "R7", Text),
    FieldSpec::new(CELL, "S7", Text),
    FieldSpec::new(EMAIL, "T7", Text),
    FieldSpec::new(GOV_EMAIL, "U7", Text),
    // deal row
    FieldSpec::new(TDY_TYPE, "B8", Text),
    FieldSpec::new(DEAL_TYPE, "C8", Text),
    FieldSpec::new(CLIENT_WORKSHEET_URL, "D8", Text),
    FieldSpec::new(CONTRACT_STATUS, "E8", Text),
    FieldSpec::new(HAS_ROOMMATES, "F8", Boolean),
    FieldSpec::new(TOTAL_ROOMMATES, "G8", Number),
    // billing/delivery address and monthly charges, row 13
    FieldSpec::new(BILLING_ADDRESS, "M13", Text),
    FieldSpec::new(BILLING_CITY, "N13", Text),
    FieldSpec::new(BILLING_STATE, "O13", Text),
    FieldSpec::new(BILLING_ZIP, "P13", Text),
    FieldSpec::new(DELIVERY_ADDRESS, "Q13", Text),
    FieldSpec::new(DELIVERY_CITY, "R13", Text),
    FieldSpec::new(DELIVERY_STATE, "S13", Text),
    FieldSpec::new(DELIVERY_ZIP, "T13", Text),
    FieldSpec::new(MONTHLY_RENT, "U13", Number),
    FieldSpec::new(MONTHLY_UTILITIES, "V13", Number),
    // tax info, values under the row 14 labels
    FieldSpec::new(LODGING_TAX_EXEMPT, "D15", Boolean),
    FieldSpec::new(LODGING_TAX_REIMBURSABLE, "E15", Boolean),
    FieldSpec::new(TAX_CALCULATION_METHOD, "F15", Text),
    // orders
    FieldSpec::labeled(PER_DIEM_START_DATE, "Orders Start", Date),
    FieldSpec::labeled(PER_DIEM_END_DATE, "Orders End", Date),
    FieldSpec::labeled(MAX_LODGING_ALLOCATION, "Contract Value", Number),
];

/// Layout shared by V3 and V4 workbooks.
pub const V3_V4_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new(SALES_REP, "C6", Text),
    // personal row under the row 6 headers
    FieldSpec::new(LAST_NAME, "M7", Text),
    FieldSpec::new(FIRST_NAME, "N7", Text),
    FieldSpec::new(TDY_LOCATION, "O7", Text),
    FieldSpec::new(CONTRACT_START_DATE, "P7", Date),
    FieldSpec::new(CONTRACT_END_DATE, "Q7", Date),
    FieldSpec::new(GOV_AGENCY_OR_DEPT, "R7", Text),
    FieldSpec::new(CELL, "S7", Text),
    FieldSpec::new(EMAIL, "T7", Text),
    FieldSpec::new(GOV_EMAIL, "U7", Text),
    // deal row
    FieldSpec::new(TDY_TYPE, "B8", Text),
    FieldSpec::new(DEAL_TYPE, "C8", Text),
    FieldSpec::new(CLIENT_WORKSHEET_URL, "D8", Text),
    FieldSpec::new(CONTRACT_STATUS, "E8", Text),
    FieldSpec::new(HAS_ROOMMATES, "F8", Boolean),
    FieldSpec::new(TOTAL_ROOMMATES, "G8", Number),
    // orders
    FieldSpec::new(PER_DIEM_START_DATE, "B10", Date),
    FieldSpec::new(PER_DIEM_END_DATE, "B11", Date),
    FieldSpec::new(MAX_LODGING_ALLOCATION, "B12", Number),
    FieldSpec::new(NUMBER_OF_NIGHTS, "E12", Number),
    // tax info, values under the row 14 labels
    FieldSpec::new(LODGING_TAX_EXEMPT, "B15", Boolean),
    FieldSpec::new(LODGING_TAX_REIMBURSABLE, "C15", Boolean),
    FieldSpec::new(TAX_CALCULATION_METHOD, "D15", Text),
    FieldSpec::new(LIQUIDATION_TAX_RATE, "E15", Number),
    FieldSpec::new(CONTRACT_TAX_RATE, "F15", Number),
    FieldSpec::new(REFERRAL_SOURCE, "B17", Text),
    FieldSpec::new(REFERRAL_FEE_TYPE, "C17", Text),
    FieldSpec::new(REFERRAL_FEE_AMOUNT, "D17", Number),
    // financial summary
    FieldSpec::new(TOTAL_CONTRACT_VALUE, "M20", Number),
    FieldSpec::new(TOTAL_BILLED, "N20", Number),
    FieldSpec::new(TOTAL_PAID, "O20", Number),
    FieldSpec::new(BALANCE_DUE, "P20", Number),
    FieldSpec::new(SECURITY_DEPOSIT, "Q20", Number),
    FieldSpec::new(LAST_PAYMENT_DATE, "R20", Date),
    FieldSpec::new(PAYMENT_METHOD, "S20", Text),
    FieldSpec::new(CARD_LAST_FOUR, "T20", Text),
    FieldSpec::new(LODGING_COST, "M22", Number),
    FieldSpec::new(LODGING_TAX_AMOUNT, "N22", Number),
    FieldSpec::new(CLEANING_FEE, "O22", Number),
    FieldSpec::new(PET_FEE, "P22", Number),
    FieldSpec::new(PROFIT_MARGIN, "Q22", Number),
    FieldSpec::new(NEXT_PAYMENT_DUE, "R22", Date),
    FieldSpec::new(INVOICE_FREQUENCY, "S22", Text),
    FieldSpec::new(AUTOPAY_ENROLLED, "T22", Boolean),
];

/// Selects the field table for a workbook version.
pub fn schema_for(version: SourceVersion) -> &'static [FieldSpec] {
    match version {
        SourceVersion::V2 => V2_SCHEMA,
        SourceVersion::V3 | SourceVersion::V4 => V3_V4_SCHEMA,
    }
}
