//! Entity shapes and the whole-file document schema.
//!
//! Every collection lives in one [`Document`]; the document is the unit of
//! persistence (read entirely into memory, mutated, rewritten entirely on
//! every change). All fields carry serde defaults so that documents written
//! by older versions still decode; [`super::migrate`] backfills the gaps and
//! reports whether it changed anything.

use serde::{Deserialize, Serialize};

/// A registered project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Absolute path, unique across the document.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Detected project framework; starts null, set by a scan.
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_scanned: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

/// A test file discovered under a project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub project_id: i64,
    /// Path relative to the project root; `(project_id, file_path)` is the
    /// upsert key.
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_run: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

/// A listening port detected for a project script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPort {
    pub id: i64,
    pub project_id: i64,
    pub port: u16,
    /// Part of the upsert key; `None` is its own slot, distinct from any
    /// named script.
    #[serde(default)]
    pub script_name: Option<String>,
    #[serde(default)]
    pub config_source: String,
    #[serde(default)]
    pub last_detected: i64,
    #[serde(default)]
    pub created_at: i64,
}

/// A Jenkins job associated with a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JenkinsJob {
    pub id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub job_url: String,
    #[serde(default)]
    pub last_build_status: Option<String>,
    #[serde(default)]
    pub last_build_number: Option<i64>,
    #[serde(default)]
    pub last_updated: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

/// One recorded test run. Append-only: never updated, only queried or
/// removed wholesale with its project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub script_name: String,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub passed: i64,
    #[serde(default)]
    pub failed: i64,
    #[serde(default)]
    pub skipped: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub coverage: Option<f64>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub raw_output: Option<String>,
}

/// A user setting. All values are stored as strings regardless of logical
/// type; the key is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub updated_at: i64,
}

/// The whole persisted registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub jenkins_jobs: Vec<JenkinsJob>,
    #[serde(default)]
    pub project_ports: Vec<ProjectPort>,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    #[serde(default)]
    pub settings: Vec<Setting>,
}

/// Next id for a collection: `max(existing) + 1`, or 1 when empty. Ids are
/// never reused after deletion but are not gap-free.
pub fn next_id<T>(items: &[T], id_of: impl Fn(&T) -> i64) -> i64 {
    items.iter().map(&id_of).max().unwrap_or(0) + 1
}
