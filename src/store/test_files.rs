//! Test rows: upsert keyed on `(project_id, file_path)`.

use crate::error::RegistryError;

use super::document::{next_id, Test};
use super::{current_time_secs, RegistryStore};

impl RegistryStore {
    /// Insert or update a test row. Re-adding the same `(project_id,
    /// file_path)` overwrites `framework` in place and returns the existing
    /// id; `status` and `last_run` are left as recorded.
    pub fn add_test(
        &mut self,
        project_id: i64,
        file_path: &str,
        framework: Option<&str>,
    ) -> Result<Test, RegistryError> {
        if let Some(existing) = self
            .doc_mut()
            .tests
            .iter_mut()
            .find(|t| t.project_id == project_id && t.file_path == file_path)
        {
            existing.framework = framework.map(str::to_string);
            let updated = existing.clone();
            self.persist()?;
            return Ok(updated);
        }

        let test = Test {
            id: next_id(&self.doc().tests, |t| t.id),
            project_id,
            file_path: file_path.to_string(),
            framework: framework.map(str::to_string),
            status: None,
            last_run: None,
            created_at: current_time_secs(),
        };
        self.doc_mut().tests.push(test.clone());
        self.persist()?;
        Ok(test)
    }

    /// All test rows for a project, ascending by id.
    pub fn tests_by_project(&self, project_id: i64) -> Vec<Test> {
        let mut tests: Vec<Test> = self
            .doc()
            .tests
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        tests.sort_by_key(|t| t.id);
        tests
    }

    /// Bulk delete by foreign key; used by the scanner before a fresh write.
    pub fn remove_tests_by_project(&mut self, project_id: i64) -> Result<(), RegistryError> {
        let doc = self.doc_mut();
        let before = doc.tests.len();
        doc.tests.retain(|t| t.project_id != project_id);
        if doc.tests.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Record a run outcome on an existing test row.
    ///
    /// # Errors
    ///
    /// `NotFound` if the test id is unknown.
    pub fn mark_test_run(
        &mut self,
        id: i64,
        status: &str,
    ) -> Result<Test, RegistryError> {
        let test = self
            .doc_mut()
            .tests
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| RegistryError::not_found("test", id))?;
        test.status = Some(status.to_string());
        test.last_run = Some(current_time_secs());
        let updated = test.clone();
        self.persist()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::temp_store;
    use super::*;

    #[test]
    fn add_test_twice_same_key_returns_same_id_and_last_framework_wins() {
        let (_dir, mut store) = temp_store();
        let p = store.add_project("a", "/tmp/a").unwrap();

        let first = store.add_test(p.id, "src/a.test.ts", Some("jest")).unwrap();
        let second = store.add_test(p.id, "src/a.test.ts", Some("vitest")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.framework.as_deref(), Some("vitest"));
        assert_eq!(store.tests_by_project(p.id).len(), 1);
    }

    #[test]
    fn same_path_in_different_projects_is_distinct() {
        let (_dir, mut store) = temp_store();
        let a = store.add_project("a", "/tmp/a").unwrap();
        let b = store.add_project("b", "/tmp/b").unwrap();

        let ta = store.add_test(a.id, "x.test.ts", None).unwrap();
        let tb = store.add_test(b.id, "x.test.ts", None).unwrap();
        assert_ne!(ta.id, tb.id);
    }

    #[test]
    fn remove_tests_by_project_leaves_others() {
        let (_dir, mut store) = temp_store();
        let a = store.add_project("a", "/tmp/a").unwrap();
        let b = store.add_project("b", "/tmp/b").unwrap();
        store.add_test(a.id, "a.test.ts", None).unwrap();
        store.add_test(b.id, "b.test.ts", None).unwrap();

        store.remove_tests_by_project(a.id).unwrap();
        assert!(store.tests_by_project(a.id).is_empty());
        assert_eq!(store.tests_by_project(b.id).len(), 1);
    }

    #[test]
    fn mark_test_run_sets_status_and_timestamp() {
        let (_dir, mut store) = temp_store();
        let p = store.add_project("a", "/tmp/a").unwrap();
        let t = store.add_test(p.id, "a.test.ts", Some("jest")).unwrap();

        let updated = store.mark_test_run(t.id, "passed").unwrap();
        assert_eq!(updated.status.as_deref(), Some("passed"));
        assert!(updated.last_run.unwrap() > 0);
    }

    #[test]
    fn upsert_preserves_recorded_status() {
        let (_dir, mut store) = temp_store();
        let p = store.add_project("a", "/tmp/a").unwrap();
        let t = store.add_test(p.id, "a.test.ts", Some("jest")).unwrap();
        store.mark_test_run(t.id, "failed").unwrap();

        let re_added = store.add_test(p.id, "a.test.ts", Some("jest")).unwrap();
        assert_eq!(re_added.status.as_deref(), Some("failed"));
    }
}
