use clientbook_tools::io::store::{
    DirectoryStore, MemoryStore, RecordSink, VERIFIED_FIELDS, document_key, merge_document,
    persist_records, to_document,
};
use clientbook_tools::model::{CanonicalClientRecord, LedgerRecord};
use clientbook_tools::{Result, ToolError};
use serde_json::{Value, json};
use tempfile::tempdir;

const NOW: &str = "2024-06-01T12:00:00.000Z";

fn client(first: &str, last: &str, email: &str) -> CanonicalClientRecord {
    let mut record = CanonicalClientRecord::from_ledger(
        LedgerRecord {
            label: "12".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..LedgerRecord::default()
        },
        NOW,
    );
    record.profile.email = email.to_string();
    record
}

/// Sink that rejects every document whose last name is "Broken".
#[derive(Default)]
struct FailingSink {
    stored: Vec<String>,
}

impl RecordSink for FailingSink {
    fn upsert(&mut self, key: &str, document: Value) -> Result<()> {
        if document["lastName"] == "Broken" {
            return Err(ToolError::Persistence {
                key: key.to_string(),
                reason: "write rejected".to_string(),
            });
        }
        self.stored.push(key.to_string());
        Ok(())
    }
}

#[test]
fn documents_are_flat_objects_with_nested_payloads() {
    let document = to_document(&client("Jane", "Doe", "jane@example.com")).expect("document");
    assert_eq!(document["firstName"], "Jane");
    assert_eq!(document["email"], "jane@example.com");
    assert_eq!(document["isInMasterAccounting"], true);
    assert_eq!(document["isInV2"], false);
    assert_eq!(document["master_accounting"]["label"], "12");
    assert_eq!(document["contractTaxRate"], Value::Null);
    assert_eq!(document["createdAt"], NOW);
    assert!(document.get("V2").is_none());
}

#[test]
fn document_keys_are_deterministic() {
    let jane = client("Jane", "Doe", "");
    let jane_again = client(" JANE", "doe ", "other@example.com");
    let john = client("John", "Doe", "");
    assert_eq!(document_key(&jane), document_key(&jane_again));
    assert_ne!(document_key(&jane), document_key(&john));

    let nameless = client("", "", "");
    assert_eq!(document_key(&nameless), document_key(&nameless.clone()));
    assert_ne!(document_key(&nameless), document_key(&jane));
}

#[test]
fn isolates_per_record_failures() {
    let records = vec![
        client("Jane", "Doe", ""),
        client("Bad", "Broken", ""),
        client("John", "Roe", ""),
    ];
    let mut sink = FailingSink::default();

    let summary = persist_records(&records, &mut sink);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.to_string(), "2 succeeded, 1 failed");
    assert_eq!(summary.failures[0].0, document_key(&records[1]));
    assert!(summary.failures[0].1.contains("write rejected"));
    assert_eq!(sink.stored, [document_key(&records[0]), document_key(&records[2])]);
}

#[test]
fn verified_fields_survive_later_upserts() {
    let record = client("Jane", "Doe", "new@example.com");
    let key = document_key(&record);
    let mut store = MemoryStore::new();
    store.insert_raw(
        key.clone(),
        json!({
            "firstName": "Jane",
            "email": "checked@example.com",
            "cell": "555-0100",
            "createdAt": "2023-01-01T00:00:00.000Z",
            "updatedAt": "2023-01-01T00:00:00.000Z",
            "verifiedFields": ["email", "cell"],
        }),
    );

    let summary = persist_records(std::slice::from_ref(&record), &mut store);
    assert_eq!(summary.failed, 0);
    assert_eq!(store.len(), 1);

    let stored = store.get(&key).expect("document stored");
    assert_eq!(stored["email"], "checked@example.com");
    assert_eq!(stored["cell"], "555-0100");
    assert_eq!(stored["lastName"], "Doe");
    assert_eq!(stored["createdAt"], "2023-01-01T00:00:00.000Z");
    assert_eq!(stored["updatedAt"], NOW);
    assert_eq!(stored[VERIFIED_FIELDS], json!(["email", "cell"]));
}

#[test]
fn merge_without_a_stored_document_keeps_the_incoming_one() {
    let incoming = json!({"firstName": "Jane", "updatedAt": NOW});
    assert_eq!(merge_document(None, incoming.clone()), incoming);
    let stored = json!({"createdAt": "2020-01-01T00:00:00.000Z"});
    let merged = merge_document(Some(&stored), incoming);
    assert_eq!(merged["createdAt"], "2020-01-01T00:00:00.000Z");
    assert_eq!(merged["updatedAt"], NOW);
}

#[test]
fn directory_store_writes_one_file_per_record() {
    let temp_dir = tempdir().expect("temporary directory");
    let mut store = DirectoryStore::open(temp_dir.path().join("clients")).expect("store opened");
    let records = vec![client("Jane", "Doe", ""), client("John", "Roe", "")];

    let summary = persist_records(&records, &mut store);
    assert_eq!(summary.succeeded, 2);

    let key = document_key(&records[0]);
    assert!(store.document_path(&key).exists());
    let loaded = store.load(&key).expect("document read").expect("document present");
    assert_eq!(loaded["firstName"], "Jane");
    assert!(store.load("missing").expect("lookup succeeds").is_none());
}
