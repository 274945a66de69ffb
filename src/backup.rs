//! Backup envelope: a full document snapshot wrapped with metadata.
//!
//! The envelope is what external collaborators exchange:
//! `{ "metadata": { "version", "timestamp" }, "data": <Document> }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;
use crate::store::{current_time_secs, Document, RegistryStore};

/// Envelope format version.
pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub version: u32,
    pub timestamp: i64,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub metadata: BackupMetadata,
    pub data: Document,
}

/// Wrap the store's current document in a fresh envelope.
pub fn export(store: &RegistryStore) -> BackupEnvelope {
    BackupEnvelope {
        metadata: BackupMetadata {
            version: BACKUP_VERSION,
            timestamp: current_time_secs(),
            source: Some("testdeck".to_string()),
        },
        data: store.document(),
    }
}

/// Structural validity of a raw envelope: both top-level keys, metadata
/// carrying `version` and `timestamp`, and `data.projects` being an array.
pub fn is_valid_envelope(raw: &Value) -> bool {
    let Some(metadata) = raw.get("metadata") else {
        return false;
    };
    if metadata.get("version").is_none() || metadata.get("timestamp").is_none() {
        return false;
    }
    raw.get("data")
        .and_then(|d| d.get("projects"))
        .is_some_and(Value::is_array)
}

/// Validate and restore an envelope into the store, replacing the whole
/// document. The restored data runs through migration so older backups are
/// upgraded on the way in.
pub fn restore(store: &mut RegistryStore, raw: Value) -> Result<(), RegistryError> {
    if !is_valid_envelope(&raw) {
        return Err(RegistryError::InvalidInput(
            "invalid backup envelope".to_string(),
        ));
    }
    let data = raw.get("data").cloned().unwrap_or_default();
    let (doc, _) = crate::store::migrate::normalize(data)?;
    store.replace_document(doc)
}
