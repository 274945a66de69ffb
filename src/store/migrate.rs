//! Schema migration for loaded documents.
//!
//! The on-disk schema has evolved: older files lack some top-level
//! collections and some per-project fields. `normalize` upgrades a raw JSON
//! value to the current shape and reports whether it changed anything, so the
//! caller can rewrite the file once instead of re-migrating on every load.

use serde_json::Value;

use super::document::Document;

/// Top-level collections every current document carries.
const COLLECTIONS: [&str; 6] = [
    "projects",
    "tests",
    "jenkins_jobs",
    "project_ports",
    "test_results",
    "settings",
];

/// Per-project fields backfilled when absent, with their defaults.
const PROJECT_DEFAULTS: [(&str, fn() -> Value); 3] = [
    ("framework", || Value::Null),
    ("description", || Value::Null),
    ("tags", || Value::Array(Vec::new())),
];

/// Normalize a raw decoded document to the current schema.
///
/// Missing or non-array top-level collections are initialized empty; every
/// project gains `framework`, `description` and `tags` if absent. Returns the
/// typed document and whether anything was backfilled.
///
/// # Errors
///
/// Returns the serde error if the normalized value still does not decode as a
/// [`Document`] (e.g. a collection entry of the wrong shape).
pub fn normalize(mut raw: Value) -> Result<(Document, bool), serde_json::Error> {
    let mut changed = false;

    if !raw.is_object() {
        raw = Value::Object(serde_json::Map::new());
        changed = true;
    }
    let root = raw.as_object_mut().expect("normalized to object above");

    for key in COLLECTIONS {
        match root.get(key) {
            Some(Value::Array(_)) => {}
            _ => {
                root.insert(key.to_string(), Value::Array(Vec::new()));
                changed = true;
            }
        }
    }

    if let Some(Value::Array(projects)) = root.get_mut("projects") {
        for project in projects.iter_mut() {
            let Some(obj) = project.as_object_mut() else {
                continue;
            };
            for (field, default) in PROJECT_DEFAULTS {
                if !obj.contains_key(field) {
                    obj.insert(field.to_string(), default());
                    changed = true;
                }
            }
        }
    }

    let doc = serde_json::from_value(raw)?;
    Ok((doc, changed))
}
