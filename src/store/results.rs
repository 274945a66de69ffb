//! Test results: append-only run records.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

use super::document::{next_id, TestResult};
use super::{current_time_secs, RegistryStore};

/// Fields for a new run record; id and timestamp are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTestResult {
    pub project_id: i64,
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
    pub raw_output: Option<String>,
}

impl RegistryStore {
    /// Append a run record. Results are never updated, only appended,
    /// queried, or removed with their project.
    pub fn add_test_result(&mut self, new: NewTestResult) -> Result<TestResult, RegistryError> {
        let result = TestResult {
            id: next_id(&self.doc().test_results, |r| r.id),
            project_id: new.project_id,
            script_name: new.script_name,
            framework: new.framework,
            passed: new.passed,
            failed: new.failed,
            skipped: new.skipped,
            total: new.total,
            duration: new.duration,
            coverage: new.coverage,
            timestamp: current_time_secs(),
            raw_output: new.raw_output,
        };
        self.doc_mut().test_results.push(result.clone());
        self.persist()?;
        Ok(result)
    }

    /// Run records for a project, most recent id first.
    pub fn results_by_project(&self, project_id: i64) -> Vec<TestResult> {
        let mut results: Vec<TestResult> = self
            .doc()
            .test_results
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        results.sort_by_key(|r| std::cmp::Reverse(r.id));
        results
    }
}
