use std::collections::BTreeMap;

use tracing::debug;

use crate::clientbook::tools::model::{SourceVersion, VersionedSourceRecord};
use crate::clientbook::tools::schema::{field, schema_for};
use crate::clientbook::tools::sheet::SheetGrid;

/// A sheet is a client tab when its trimmed name starts with an ASCII digit.
/// Instruction, summary and template sheets are skipped this way.
pub fn is_client_tab(name: &str) -> bool {
    name.trim()
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_digit())
}

/// Applies the version's schema to one client tab.
pub fn parse_client_tab(sheet: &SheetGrid, version: SourceVersion) -> VersionedSourceRecord {
    let fields: BTreeMap<String, _> = schema_for(version)
        .iter()
        .map(|spec| (spec.field.to_string(), spec.read(sheet)))
        .collect();

    VersionedSourceRecord {
        version,
        tab: sheet.name().to_string(),
        client_number: sheet.name().trim().to_string(),
        fields,
    }
}

/// Parses every client tab among `sheets`.
///
/// Tabs that pass the naming rule but carry neither a first nor a last name
/// (numbered templates, blank spares) are dropped.
pub fn parse_client_tabs<'a, I>(sheets: I, version: SourceVersion) -> Vec<VersionedSourceRecord>
where
    I: IntoIterator<Item = &'a SheetGrid>,
{
    let mut records = Vec::new();
    for sheet in sheets {
        if !is_client_tab(sheet.name()) {
            continue;
        }
        let record = parse_client_tab(sheet, version);
        if record.text(field::FIRST_NAME).is_empty() && record.text(field::LAST_NAME).is_empty() {
            debug!(tab = sheet.name(), %version, "skipping client tab without a name");
            continue;
        }
        records.push(record);
    }
    records
}
