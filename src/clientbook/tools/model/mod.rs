use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clientbook::tools::error::{Result, ToolError};

/// Layout version of a per-tab client workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceVersion {
    V2,
    V3,
    V4,
}

impl fmt::Display for SourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceVersion::V2 => write!(f, "V2"),
            SourceVersion::V3 => write!(f, "V3"),
            SourceVersion::V4 => write!(f, "V4"),
        }
    }
}

/// One of the four upload slots feeding a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    Version(SourceVersion),
    Ledger,
}

impl SourceKind {
    /// Fixed order in which sources are folded by the merge engine.
    pub const MERGE_ORDER: [SourceKind; 4] = [
        SourceKind::Version(SourceVersion::V2),
        SourceKind::Version(SourceVersion::V3),
        SourceKind::Version(SourceVersion::V4),
        SourceKind::Ledger,
    ];

    /// Detects the source slot from an uploaded file's name.
    ///
    /// Names mentioning `v2`, `v3` or `v4` select that layout; names mentioning
    /// `master` or `accounting` select the ledger.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let lower = name.to_lowercase();
        if lower.contains("v2") {
            Ok(SourceKind::Version(SourceVersion::V2))
        } else if lower.contains("v3") {
            Ok(SourceKind::Version(SourceVersion::V3))
        } else if lower.contains("v4") {
            Ok(SourceKind::Version(SourceVersion::V4))
        } else if lower.contains("master") || lower.contains("accounting") {
            Ok(SourceKind::Ledger)
        } else {
            Err(ToolError::UnrecognizedSource(name.to_string()))
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Version(version) => write!(f, "{version}"),
            SourceKind::Ledger => write!(f, "Master Accounting"),
        }
    }
}

/// Typed value extracted for one schema field. Dates are stored as their
/// normalized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
}

/// Scalar values read from one client tab under one version's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedSourceRecord {
    pub version: SourceVersion,
    /// Tab name exactly as it appears in the workbook.
    pub tab: String,
    /// Trimmed tab name, which doubles as the client number.
    pub client_number: String,
    /// Field name → extracted value, one entry per schema field.
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl VersionedSourceRecord {
    /// Returns a text field, or `""` when absent or not textual.
    pub fn text(&self, field: &str) -> &str {
        match self.fields.get(field) {
            Some(FieldValue::Text(value)) => value,
            _ => "",
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field) {
            Some(FieldValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        match self.fields.get(field) {
            Some(FieldValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }
}

/// One month of ledger billing data. Only sub-fields with content are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBillingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bill: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoiced: Option<bool>,
}

impl MonthlyBillingEntry {
    pub fn is_empty(&self) -> bool {
        self == &MonthlyBillingEntry::default()
    }
}

/// Client-level data recovered from one block of the accounting ledger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    /// Block label, normally the client number printed in the block.
    pub label: String,
    /// 1-based sheet row the block starts on.
    pub start_row: usize,
    pub first_name: String,
    pub last_name: String,
    pub sales_notes: String,
    pub operations_notes: String,
    pub accounting_notes: String,
    pub contract_tax_rate: f64,
    pub liquidation_tax_rate: f64,
    pub payment_type: String,
    pub last_four_digits: String,
    pub billing_address: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_zip: String,
    pub billing_details: BTreeMap<String, MonthlyBillingEntry>,
    /// Disagreements between extraction heuristics, kept for review.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<String>,
}

impl LedgerRecord {
    /// Notes joined in sales, operations, accounting order.
    pub fn combined_notes(&self) -> String {
        [
            self.sales_notes.as_str(),
            self.operations_notes.as_str(),
            self.accounting_notes.as_str(),
        ]
        .into_iter()
        .filter(|note| !note.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Normalized top-level scalar fields of a client.
///
/// Text fields use `""` for "unset"; numbers and flags use `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub client_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gov_email: String,
    pub cell: String,
    pub tdy_location: String,
    pub gov_agency_or_dept: String,
    pub tdy_type: String,
    pub deal_type: String,
    pub contract_status: String,
    pub has_roommates: Option<bool>,
    pub total_roommates: Option<f64>,
    pub per_diem_start_date: String,
    pub per_diem_end_date: String,
    pub contract_start_date: String,
    pub contract_end_date: String,
    pub max_lodging_allocation: Option<f64>,
    pub liquidation_tax_rate: Option<f64>,
    pub contract_tax_rate: Option<f64>,
    pub referral_source: String,
    pub referral_fee_type: String,
    pub sales_rep: String,
    pub lodging_tax_exempt: Option<bool>,
    pub lodging_tax_reimbursable: Option<bool>,
    pub tax_calculation_method: String,
    pub client_worksheet_url: String,
    pub number_of_nights: Option<f64>,
    pub billing_address: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_zip: String,
    pub monthly_rent: Option<f64>,
    pub total_contract_value: Option<f64>,
    pub total_paid: Option<f64>,
    pub balance_due: Option<f64>,
    pub payment_type: String,
    pub comments: String,
}

impl ClientProfile {
    pub fn has_name(&self) -> bool {
        !self.first_name.trim().is_empty() || !self.last_name.trim().is_empty()
    }
}

/// Reconciled representation of one client across every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalClientRecord {
    #[serde(rename = "isInV2")]
    pub is_in_v2: bool,
    #[serde(rename = "isInV3")]
    pub is_in_v3: bool,
    #[serde(rename = "isInV4")]
    pub is_in_v4: bool,
    pub is_in_master_accounting: bool,
    #[serde(rename = "V2", default, skip_serializing_if = "Option::is_none")]
    pub v2: Option<VersionedSourceRecord>,
    #[serde(rename = "V3", default, skip_serializing_if = "Option::is_none")]
    pub v3: Option<VersionedSourceRecord>,
    #[serde(rename = "V4", default, skip_serializing_if = "Option::is_none")]
    pub v4: Option<VersionedSourceRecord>,
    #[serde(rename = "master_accounting", default, skip_serializing_if = "Option::is_none")]
    pub master_accounting: Option<LedgerRecord>,
    #[serde(flatten)]
    pub profile: ClientProfile,
    pub created_at: String,
    pub updated_at: String,
}

impl CanonicalClientRecord {
    /// Ledger block label, when the client appears in the ledger.
    pub fn ledger_label(&self) -> Option<&str> {
        self.master_accounting
            .as_ref()
            .map(|ledger| ledger.label.as_str())
            .filter(|label| !label.is_empty())
    }
}
