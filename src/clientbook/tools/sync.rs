use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::clientbook::tools::error::{Result, ToolError};
use crate::clientbook::tools::extract::{LedgerLayout, parse_client_tabs, scan_ledger};
use crate::clientbook::tools::flatten::build_export_table;
use crate::clientbook::tools::io::{csv_export, excel_read, excel_write};
use crate::clientbook::tools::merge::{SourceLists, merge_clients};
use crate::clientbook::tools::model::{
    CanonicalClientRecord, LedgerRecord, SourceKind, SourceVersion, VersionedSourceRecord,
};
use crate::clientbook::tools::sheet::dates::format_timestamp;

/// Parses an uploaded per-tab workbook of the given layout version.
#[instrument(level = "info", skip_all, fields(%version, bytes = bytes.len()))]
pub fn parse_version_source(
    bytes: &[u8],
    version: SourceVersion,
) -> Result<Vec<VersionedSourceRecord>> {
    let mut workbook = excel_read::open_workbook_bytes(bytes)?;
    let origin = version.to_string();
    let sheets = excel_read::read_client_tabs(&mut workbook, &origin)?;
    debug!(tabs = sheets.len(), "loaded client tabs");
    let records = parse_client_tabs(&sheets, version);
    info!(records = records.len(), "parsed client tabs");
    Ok(records)
}

/// Parses the accounting workbook with the default ledger layout.
pub fn parse_ledger_source(bytes: &[u8]) -> Result<Vec<LedgerRecord>> {
    parse_ledger_source_with(bytes, &LedgerLayout::default())
}

/// Parses the accounting workbook. The ledger sheet must be present.
#[instrument(level = "info", skip_all, fields(sheet = %layout.sheet_name, bytes = bytes.len()))]
pub fn parse_ledger_source_with(bytes: &[u8], layout: &LedgerLayout) -> Result<Vec<LedgerRecord>> {
    let mut workbook = excel_read::open_workbook_bytes(bytes)?;
    let origin = SourceKind::Ledger.to_string();
    let sheet = excel_read::read_required_sheet(&mut workbook, &layout.sheet_name, &origin)?;
    Ok(scan_ledger(&sheet, layout))
}

/// Paths of the four optional inputs of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles {
    pub v2: Option<PathBuf>,
    pub v3: Option<PathBuf>,
    pub v4: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
}

impl SourceFiles {
    pub fn path(&self, kind: SourceKind) -> Option<&Path> {
        match kind {
            SourceKind::Version(SourceVersion::V2) => self.v2.as_deref(),
            SourceKind::Version(SourceVersion::V3) => self.v3.as_deref(),
            SourceKind::Version(SourceVersion::V4) => self.v4.as_deref(),
            SourceKind::Ledger => self.ledger.as_deref(),
        }
    }

    /// Places `path` in the slot its file name identifies. A later file for the
    /// same slot replaces the earlier one.
    pub fn assign(&mut self, path: PathBuf) -> Result<SourceKind> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = SourceKind::from_file_name(&name)?;
        let slot = match kind {
            SourceKind::Version(SourceVersion::V2) => &mut self.v2,
            SourceKind::Version(SourceVersion::V3) => &mut self.v3,
            SourceKind::Version(SourceVersion::V4) => &mut self.v4,
            SourceKind::Ledger => &mut self.ledger,
        };
        if let Some(previous) = slot.replace(path) {
            warn!(%kind, previous = %previous.display(), "replacing previously assigned source");
        }
        Ok(kind)
    }

    pub fn is_empty(&self) -> bool {
        SourceKind::MERGE_ORDER
            .iter()
            .all(|kind| self.path(*kind).is_none())
    }
}

/// A source that could not be parsed. Its siblings are still merged.
#[derive(Debug)]
pub struct SourceFailure {
    pub kind: SourceKind,
    pub error: ToolError,
}

/// Result of one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub clients: Vec<CanonicalClientRecord>,
    pub failures: Vec<SourceFailure>,
    /// Records parsed per source that was read successfully.
    pub parsed: BTreeMap<SourceKind, usize>,
}

/// Reads, parses and merges every configured source.
///
/// A source that fails to load is recorded in the report and left out of the
/// merge; the remaining sources are still reconciled in V2, V3, V4, ledger
/// order.
#[instrument(level = "info", skip_all, fields(%now))]
pub fn reconcile_files(files: &SourceFiles, layout: &LedgerLayout, now: &str) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut lists = SourceLists::default();

    for kind in SourceKind::MERGE_ORDER {
        let Some(path) = files.path(kind) else {
            continue;
        };
        let outcome = read_source(path).and_then(|bytes| match kind {
            SourceKind::Version(version) => {
                let records = parse_version_source(&bytes, version)?;
                let count = records.len();
                match version {
                    SourceVersion::V2 => lists.v2 = records,
                    SourceVersion::V3 => lists.v3 = records,
                    SourceVersion::V4 => lists.v4 = records,
                }
                Ok(count)
            }
            SourceKind::Ledger => {
                lists.ledger = parse_ledger_source_with(&bytes, layout)?;
                Ok(lists.ledger.len())
            }
        });
        match outcome {
            Ok(count) => {
                report.parsed.insert(kind, count);
            }
            Err(error) => {
                warn!(%kind, path = %path.display(), %error, "source failed to parse");
                report.failures.push(SourceFailure { kind, error });
            }
        }
    }

    report.clients = merge_clients(lists, now);
    info!(
        clients = report.clients.len(),
        failed_sources = report.failures.len(),
        "reconciliation finished"
    );
    report
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Current time in the millisecond ISO-8601 form used for record timestamps.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// Writes the reconciled list as a flat CSV file.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_csv(records: &[CanonicalClientRecord], output: &Path) -> Result<()> {
    let table = build_export_table(records);
    debug!(columns = table.columns.len(), rows = table.rows.len(), "export table built");
    csv_export::write_csv_file(output, &table)
}

/// Writes the reconciled list as a single-sheet workbook.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_xlsx(records: &[CanonicalClientRecord], output: &Path) -> Result<()> {
    let table = build_export_table(records);
    debug!(columns = table.columns.len(), rows = table.rows.len(), "export table built");
    excel_write::write_workbook(output, &table)
}

/// Writes the reconciled list as a pretty-printed JSON array.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_json(records: &[CanonicalClientRecord], output: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(records)?;
    fs::write(output, json_string)?;
    Ok(())
}
