//! Reconciles the per-source record lists into one canonical client list.
//!
//! Merging is a left fold, in source order, into an insertion-ordered
//! key → record map. Nothing is retained between calls: every invocation takes
//! fresh lists and a timestamp and returns a fresh list.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::clientbook::tools::model::{
    CanonicalClientRecord, ClientProfile, LedgerRecord, SourceVersion, VersionedSourceRecord,
};
use crate::clientbook::tools::schema::field;

/// Parsed output of the four sources, merged in V2, V3, V4, ledger order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceLists {
    pub v2: Vec<VersionedSourceRecord>,
    pub v3: Vec<VersionedSourceRecord>,
    pub v4: Vec<VersionedSourceRecord>,
    pub ledger: Vec<LedgerRecord>,
}

impl SourceLists {
    /// Wraps every record in a single-source shell, one batch per source in
    /// merge order.
    pub fn into_shells(self, now: &str) -> [Vec<CanonicalClientRecord>; 4] {
        let wrap = |records: Vec<VersionedSourceRecord>| {
            records
                .into_iter()
                .map(|record| CanonicalClientRecord::from_versioned(record, now))
                .collect::<Vec<_>>()
        };
        [
            wrap(self.v2),
            wrap(self.v3),
            wrap(self.v4),
            self.ledger
                .into_iter()
                .map(|record| CanonicalClientRecord::from_ledger(record, now))
                .collect(),
        ]
    }
}

impl CanonicalClientRecord {
    /// Shell for one client tab, flagged for the tab's version.
    pub fn from_versioned(record: VersionedSourceRecord, now: &str) -> Self {
        let profile = profile_from_versioned(&record);
        let mut shell = Self::empty(profile, now);
        match record.version {
            SourceVersion::V2 => {
                shell.is_in_v2 = true;
                shell.v2 = Some(record);
            }
            SourceVersion::V3 => {
                shell.is_in_v3 = true;
                shell.v3 = Some(record);
            }
            SourceVersion::V4 => {
                shell.is_in_v4 = true;
                shell.v4 = Some(record);
            }
        }
        shell
    }

    /// Shell for one ledger block, flagged as ledger-sourced.
    pub fn from_ledger(record: LedgerRecord, now: &str) -> Self {
        let nonzero = |value: f64| (value != 0.0).then_some(value);
        let profile = ClientProfile {
            client_number: record.label.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            liquidation_tax_rate: nonzero(record.liquidation_tax_rate),
            contract_tax_rate: nonzero(record.contract_tax_rate),
            payment_type: record.payment_type.clone(),
            billing_address: record.billing_address.clone(),
            billing_city: record.billing_city.clone(),
            billing_state: record.billing_state.clone(),
            billing_zip: record.billing_zip.clone(),
            comments: record.combined_notes(),
            ..ClientProfile::default()
        };
        let mut shell = Self::empty(profile, now);
        shell.is_in_master_accounting = true;
        shell.master_accounting = Some(record);
        shell
    }

    fn empty(profile: ClientProfile, now: &str) -> Self {
        Self {
            is_in_v2: false,
            is_in_v3: false,
            is_in_v4: false,
            is_in_master_accounting: false,
            v2: None,
            v3: None,
            v4: None,
            master_accounting: None,
            profile,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Folds `incoming` into `self`. Source slots and scalar values already
    /// set on `self` are kept; `incoming` only fills gaps.
    fn absorb(&mut self, incoming: CanonicalClientRecord, now: &str) {
        self.is_in_v2 |= incoming.is_in_v2;
        self.is_in_v3 |= incoming.is_in_v3;
        self.is_in_v4 |= incoming.is_in_v4;
        self.is_in_master_accounting |= incoming.is_in_master_accounting;

        if self.v2.is_none() {
            self.v2 = incoming.v2;
        }
        if self.v3.is_none() {
            self.v3 = incoming.v3;
        }
        if self.v4.is_none() {
            self.v4 = incoming.v4;
        }
        if self.master_accounting.is_none() {
            self.master_accounting = incoming.master_accounting;
        }

        self.profile.absorb(incoming.profile);
        self.updated_at = now.to_string();
    }
}

fn profile_from_versioned(record: &VersionedSourceRecord) -> ClientProfile {
    let text = |name: &str| record.text(name).to_string();
    ClientProfile {
        client_number: record.client_number.clone(),
        first_name: text(field::FIRST_NAME),
        last_name: text(field::LAST_NAME),
        email: text(field::EMAIL),
        gov_email: text(field::GOV_EMAIL),
        cell: text(field::CELL),
        tdy_location: text(field::TDY_LOCATION),
        gov_agency_or_dept: text(field::GOV_AGENCY_OR_DEPT),
        tdy_type: text(field::TDY_TYPE),
        deal_type: text(field::DEAL_TYPE),
        contract_status: text(field::CONTRACT_STATUS),
        has_roommates: record.boolean(field::HAS_ROOMMATES),
        total_roommates: record.number(field::TOTAL_ROOMMATES),
        per_diem_start_date: text(field::PER_DIEM_START_DATE),
        per_diem_end_date: text(field::PER_DIEM_END_DATE),
        contract_start_date: text(field::CONTRACT_START_DATE),
        contract_end_date: text(field::CONTRACT_END_DATE),
        max_lodging_allocation: record.number(field::MAX_LODGING_ALLOCATION),
        liquidation_tax_rate: record.number(field::LIQUIDATION_TAX_RATE),
        contract_tax_rate: record.number(field::CONTRACT_TAX_RATE),
        referral_source: text(field::REFERRAL_SOURCE),
        referral_fee_type: text(field::REFERRAL_FEE_TYPE),
        sales_rep: text(field::SALES_REP),
        lodging_tax_exempt: record.boolean(field::LODGING_TAX_EXEMPT),
        lodging_tax_reimbursable: record.boolean(field::LODGING_TAX_REIMBURSABLE),
        tax_calculation_method: text(field::TAX_CALCULATION_METHOD),
        client_worksheet_url: text(field::CLIENT_WORKSHEET_URL),
        number_of_nights: record.number(field::NUMBER_OF_NIGHTS),
        billing_address: text(field::BILLING_ADDRESS),
        billing_city: text(field::BILLING_CITY),
        billing_state: text(field::BILLING_STATE),
        billing_zip: text(field::BILLING_ZIP),
        monthly_rent: record.number(field::MONTHLY_RENT),
        total_contract_value: record.number(field::TOTAL_CONTRACT_VALUE),
        total_paid: record.number(field::TOTAL_PAID),
        balance_due: record.number(field::BALANCE_DUE),
        payment_type: text(field::PAYMENT_METHOD),
        comments: String::new(),
    }
}

fn fill_text(slot: &mut String, incoming: String) {
    if slot.is_empty() {
        *slot = incoming;
    }
}

/// Zero counts as unset, matching how the sheets leave blank amounts.
fn fill_number(slot: &mut Option<f64>, incoming: Option<f64>) {
    let set = matches!(slot, Some(value) if *value != 0.0);
    if !set && incoming.is_some() {
        *slot = incoming;
    }
}

/// `Some(false)` is a real answer and is kept.
fn fill_flag(slot: &mut Option<bool>, incoming: Option<bool>) {
    if slot.is_none() {
        *slot = incoming;
    }
}

impl ClientProfile {
    fn absorb(&mut self, incoming: ClientProfile) {
        fill_text(&mut self.client_number, incoming.client_number);
        fill_text(&mut self.first_name, incoming.first_name);
        fill_text(&mut self.last_name, incoming.last_name);
        fill_text(&mut self.email, incoming.email);
        fill_text(&mut self.gov_email, incoming.gov_email);
        fill_text(&mut self.cell, incoming.cell);
        fill_text(&mut self.tdy_location, incoming.tdy_location);
        fill_text(&mut self.gov_agency_or_dept, incoming.gov_agency_or_dept);
        fill_text(&mut self.tdy_type, incoming.tdy_type);
        fill_text(&mut self.deal_type, incoming.deal_type);
        fill_text(&mut self.contract_status, incoming.contract_status);
        fill_flag(&mut self.has_roommates, incoming.has_roommates);
        fill_number(&mut self.total_roommates, incoming.total_roommates);
        fill_text(&mut self.per_diem_start_date, incoming.per_diem_start_date);
        fill_text(&mut self.per_diem_end_date, incoming.per_diem_end_date);
        fill_text(&mut self.contract_start_date, incoming.contract_start_date);
        fill_text(&mut self.contract_end_date, incoming.contract_end_date);
        fill_number(&mut self.max_lodging_allocation, incoming.max_lodging_allocation);
        fill_number(&mut self.liquidation_tax_rate, incoming.liquidation_tax_rate);
        fill_number(&mut self.contract_tax_rate, incoming.contract_tax_rate);
        fill_text(&mut self.referral_source, incoming.referral_source);
        fill_text(&mut self.referral_fee_type, incoming.referral_fee_type);
        fill_text(&mut self.sales_rep, incoming.sales_rep);
        fill_flag(&mut self.lodging_tax_exempt, incoming.lodging_tax_exempt);
        fill_flag(&mut self.lodging_tax_reimbursable, incoming.lodging_tax_reimbursable);
        fill_text(&mut self.tax_calculation_method, incoming.tax_calculation_method);
        fill_text(&mut self.client_worksheet_url, incoming.client_worksheet_url);
        fill_number(&mut self.number_of_nights, incoming.number_of_nights);
        fill_text(&mut self.billing_address, incoming.billing_address);
        fill_text(&mut self.billing_city, incoming.billing_city);
        fill_text(&mut self.billing_state, incoming.billing_state);
        fill_text(&mut self.billing_zip, incoming.billing_zip);
        fill_number(&mut self.monthly_rent, incoming.monthly_rent);
        fill_number(&mut self.total_contract_value, incoming.total_contract_value);
        fill_number(&mut self.total_paid, incoming.total_paid);
        fill_number(&mut self.balance_due, incoming.balance_due);
        fill_text(&mut self.payment_type, incoming.payment_type);
        fill_text(&mut self.comments, incoming.comments);
    }
}

/// `lower(trim(first)) + "_" + lower(trim(last))`, or `None` for nameless
/// records.
pub fn reconciliation_key(profile: &ClientProfile) -> Option<String> {
    profile.has_name().then(|| {
        format!(
            "{}_{}",
            profile.first_name.trim().to_lowercase(),
            profile.last_name.trim().to_lowercase()
        )
    })
}

/// Returns `true` when at least one of the identifying or contract fields
/// carries content.
pub fn has_meaningful_data(record: &CanonicalClientRecord) -> bool {
    let profile = &record.profile;
    [
        &profile.first_name,
        &profile.last_name,
        &profile.email,
        &profile.tdy_location,
        &profile.contract_start_date,
        &profile.contract_end_date,
        &profile.contract_status,
        &profile.per_diem_start_date,
        &profile.per_diem_end_date,
    ]
    .iter()
    .any(|value| !value.trim().is_empty())
}

/// Merges the four parsed sources in V2, V3, V4, ledger order.
pub fn merge_clients(sources: SourceLists, now: &str) -> Vec<CanonicalClientRecord> {
    merge_shells(sources.into_shells(now), now)
}

/// Folds ordered batches of shells into the canonical list.
///
/// Records sharing a reconciliation key collapse into one; the first batch to
/// provide a value wins. Nameless records receive a fresh synthetic key so
/// they never collide. Records without meaningful data are dropped and the
/// survivors are sorted by last then first name, nameless ones last by ledger
/// label.
pub fn merge_shells<I>(batches: I, now: &str) -> Vec<CanonicalClientRecord>
where
    I: IntoIterator<Item = Vec<CanonicalClientRecord>>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<CanonicalClientRecord> = Vec::new();
    let mut seen = 0usize;

    for batch in batches {
        for record in batch {
            seen += 1;
            let key = reconciliation_key(&record.profile)
                .unwrap_or_else(|| format!("unnamed_{}", Uuid::new_v4()));
            match index.get(&key) {
                Some(&position) => merged[position].absorb(record, now),
                None => {
                    index.insert(key, merged.len());
                    merged.push(record);
                }
            }
        }
    }

    let unique = merged.len();
    merged.retain(|record| {
        let keep = has_meaningful_data(record);
        if !keep {
            debug!(
                client_number = %record.profile.client_number,
                ledger = record.is_in_master_accounting,
                "discarding record without meaningful data"
            );
        }
        keep
    });
    merged.sort_by(compare_records);

    info!(
        input = seen,
        unique,
        kept = merged.len(),
        discarded = unique - merged.len(),
        "merged client records"
    );
    merged
}

fn compare_records(lhs: &CanonicalClientRecord, rhs: &CanonicalClientRecord) -> Ordering {
    match (lhs.profile.has_name(), rhs.profile.has_name()) {
        (true, true) => sort_name(&lhs.profile).cmp(&sort_name(&rhs.profile)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_labels(lhs.ledger_label(), rhs.ledger_label()),
    }
}

fn sort_name(profile: &ClientProfile) -> (String, String) {
    (
        profile.last_name.trim().to_lowercase(),
        profile.first_name.trim().to_lowercase(),
    )
}

/// Numeric labels compare by value and sort before textual ones; unlabeled
/// records go last.
fn compare_labels(lhs: Option<&str>, rhs: Option<&str>) -> Ordering {
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => match (lhs.parse::<f64>(), rhs.parse::<f64>()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => lhs.cmp(rhs),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
