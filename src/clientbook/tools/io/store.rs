//! Document persistence for reconciled client records.
//!
//! Records are handed to a [`RecordSink`] one at a time as flat JSON object
//! documents. A failure to persist one record never aborts the batch; the
//! outcome is summarised in a [`PersistSummary`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::clientbook::tools::error::{Result, ToolError};
use crate::clientbook::tools::merge::reconciliation_key;
use crate::clientbook::tools::model::CanonicalClientRecord;

/// Document field listing the names of fields a reviewer has confirmed.
pub const VERIFIED_FIELDS: &str = "verifiedFields";
const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Destination for client documents.
pub trait RecordSink {
    /// Inserts or updates the document stored under `key`.
    fn upsert(&mut self, key: &str, document: Value) -> Result<()>;
}

/// Outcome of one [`persist_records`] batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// `(document key, reason)` for every failed record, in input order.
    pub failures: Vec<(String, String)>,
}

impl fmt::Display for PersistSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

/// Deterministic document key for a record.
///
/// Named records are keyed on their reconciliation key, nameless ones on their
/// ledger label or client number, and anything else on its serialized content.
pub fn document_key(record: &CanonicalClientRecord) -> String {
    let identity = reconciliation_key(&record.profile)
        .or_else(|| record.ledger_label().map(|label| format!("ledger:{label}")))
        .or_else(|| {
            let number = record.profile.client_number.trim();
            (!number.is_empty()).then(|| format!("client:{number}"))
        })
        .unwrap_or_else(|| serde_json::to_string(record).unwrap_or_default());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, identity.as_bytes()).to_string()
}

/// Serializes a record into the flat document shape handed to sinks.
pub fn to_document(record: &CanonicalClientRecord) -> Result<Value> {
    let document = serde_json::to_value(record)?;
    if !document.is_object() {
        return Err(ToolError::Persistence {
            key: document_key(record),
            reason: "record did not serialize to a JSON object".to_string(),
        });
    }
    Ok(document)
}

/// Persists every record, isolating failures per record.
#[instrument(level = "info", skip_all, fields(records = records.len()))]
pub fn persist_records<S: RecordSink + ?Sized>(
    records: &[CanonicalClientRecord],
    sink: &mut S,
) -> PersistSummary {
    let mut summary = PersistSummary::default();
    for record in records {
        let key = document_key(record);
        let outcome = to_document(record).and_then(|document| sink.upsert(&key, document));
        match outcome {
            Ok(()) => {
                debug!(%key, "persisted client document");
                summary.succeeded += 1;
            }
            Err(error) => {
                warn!(%key, %error, "failed to persist client document");
                summary.failed += 1;
                summary.failures.push((key, error.to_string()));
            }
        }
    }
    info!(succeeded = summary.succeeded, failed = summary.failed, "persisted client records");
    summary
}

/// Combines a stored document with a freshly reconciled one.
///
/// Fields named in the stored document's `verifiedFields` keep their stored
/// values, `createdAt` is never replaced, and `updatedAt` always comes from the
/// incoming document.
pub fn merge_document(existing: Option<&Value>, incoming: Value) -> Value {
    let Some(Value::Object(stored)) = existing else {
        return incoming;
    };
    let mut merged = match incoming {
        Value::Object(merged) => merged,
        other => return other,
    };

    let verified: Vec<&str> = stored
        .get(VERIFIED_FIELDS)
        .and_then(Value::as_array)
        .map(|fields| fields.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    for field in verified {
        if field == UPDATED_AT {
            continue;
        }
        if let Some(value) = stored.get(field) {
            merged.insert(field.to_string(), value.clone());
        }
    }

    if let Some(created) = stored.get(CREATED_AT) {
        merged.insert(CREATED_AT.to_string(), created.clone());
    }
    if let Some(fields) = stored.get(VERIFIED_FIELDS) {
        merged.insert(VERIFIED_FIELDS.to_string(), fields.clone());
    }
    Value::Object(merged)
}

/// In-memory sink keyed by document key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.documents.get(key)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Stores a document as-is, bypassing merge rules.
    pub fn insert_raw(&mut self, key: impl Into<String>, document: Value) {
        self.documents.insert(key.into(), document);
    }

    pub fn documents(&self) -> &BTreeMap<String, Value> {
        &self.documents
    }
}

impl RecordSink for MemoryStore {
    fn upsert(&mut self, key: &str, document: Value) -> Result<()> {
        let merged = merge_document(self.documents.get(key), document);
        self.documents.insert(key.to_string(), merged);
        Ok(())
    }
}

/// Sink writing one pretty-printed `<key>.json` file per document.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens the store, creating the directory when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Loads a stored document, `None` when the key has never been written.
    pub fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.document_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn write(&self, key: &str, document: Value) -> Result<()> {
        let existing = self.load(key)?;
        let merged = merge_document(existing.as_ref(), document);
        let mut text = serde_json::to_string_pretty(&merged)?;
        text.push('\n');
        fs::write(self.document_path(key), text)?;
        Ok(())
    }
}

impl RecordSink for DirectoryStore {
    fn upsert(&mut self, key: &str, document: Value) -> Result<()> {
        self.write(key, document)
            .map_err(|error| ToolError::Persistence {
                key: key.to_string(),
                reason: error.to_string(),
            })
    }
}
