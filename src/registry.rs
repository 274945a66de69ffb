//! One registry interface, two personalities.
//!
//! Consumers that hold the JSON file directly use [`RegistryStore`];
//! consumers that must go through the running API process use
//! [`crate::remote::RemoteRegistry`]. Both expose the same contract, so a
//! caller (CLI, editor extension) picks a personality at construction time
//! instead of duplicating entity logic per transport.

use std::collections::BTreeMap;

use crate::error::RegistryError;
use crate::scan::{self, ScanOutcome};
use crate::store::{
    JenkinsJob, NewTestResult, Project, ProjectPort, ProjectUpdate, RegistryStore, Test,
    TestResult,
};

pub trait Registry {
    fn add_project(&mut self, name: &str, path: &str) -> Result<Project, RegistryError>;
    fn project(&mut self, id: i64) -> Result<Option<Project>, RegistryError>;
    fn project_by_path(&mut self, path: &str) -> Result<Option<Project>, RegistryError>;
    fn projects(&mut self) -> Result<Vec<Project>, RegistryError>;
    fn update_project(
        &mut self,
        id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, RegistryError>;
    fn remove_project(&mut self, id: i64) -> Result<(), RegistryError>;
    fn all_tags(&mut self) -> Result<Vec<String>, RegistryError>;

    fn tests_by_project(&mut self, project_id: i64) -> Result<Vec<Test>, RegistryError>;
    fn add_test(
        &mut self,
        project_id: i64,
        file_path: &str,
        framework: Option<&str>,
    ) -> Result<Test, RegistryError>;

    fn ports_by_project(&mut self, project_id: i64) -> Result<Vec<ProjectPort>, RegistryError>;
    fn add_project_port(
        &mut self,
        project_id: i64,
        port: u16,
        script_name: Option<&str>,
        config_source: &str,
    ) -> Result<ProjectPort, RegistryError>;

    fn jenkins_jobs_by_project(
        &mut self,
        project_id: i64,
    ) -> Result<Vec<JenkinsJob>, RegistryError>;
    fn upsert_jenkins_job(
        &mut self,
        project_id: i64,
        job_name: &str,
        job_url: &str,
        last_build_status: Option<&str>,
        last_build_number: Option<i64>,
    ) -> Result<JenkinsJob, RegistryError>;

    fn results_by_project(&mut self, project_id: i64) -> Result<Vec<TestResult>, RegistryError>;
    fn add_test_result(&mut self, new: NewTestResult) -> Result<TestResult, RegistryError>;

    fn setting(&mut self, key: &str) -> Result<Option<String>, RegistryError>;
    fn set_setting(&mut self, key: &str, value: &str) -> Result<(), RegistryError>;
    fn all_settings(&mut self) -> Result<BTreeMap<String, String>, RegistryError>;

    fn scan_project(&mut self, project_id: i64) -> Result<ScanOutcome, RegistryError>;
    fn scan_all(&mut self) -> Result<Vec<ScanOutcome>, RegistryError>;
}

impl Registry for RegistryStore {
    fn add_project(&mut self, name: &str, path: &str) -> Result<Project, RegistryError> {
        RegistryStore::add_project(self, name, path)
    }

    fn project(&mut self, id: i64) -> Result<Option<Project>, RegistryError> {
        Ok(RegistryStore::project(self, id))
    }

    fn project_by_path(&mut self, path: &str) -> Result<Option<Project>, RegistryError> {
        Ok(RegistryStore::project_by_path(self, path))
    }

    fn projects(&mut self) -> Result<Vec<Project>, RegistryError> {
        Ok(RegistryStore::projects(self))
    }

    fn update_project(
        &mut self,
        id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, RegistryError> {
        RegistryStore::update_project(self, id, update)
    }

    fn remove_project(&mut self, id: i64) -> Result<(), RegistryError> {
        RegistryStore::remove_project(self, id)
    }

    fn all_tags(&mut self) -> Result<Vec<String>, RegistryError> {
        Ok(RegistryStore::all_tags(self))
    }

    fn tests_by_project(&mut self, project_id: i64) -> Result<Vec<Test>, RegistryError> {
        Ok(RegistryStore::tests_by_project(self, project_id))
    }

    fn add_test(
        &mut self,
        project_id: i64,
        file_path: &str,
        framework: Option<&str>,
    ) -> Result<Test, RegistryError> {
        RegistryStore::add_test(self, project_id, file_path, framework)
    }

    fn ports_by_project(&mut self, project_id: i64) -> Result<Vec<ProjectPort>, RegistryError> {
        Ok(RegistryStore::ports_by_project(self, project_id))
    }

    fn add_project_port(
        &mut self,
        project_id: i64,
        port: u16,
        script_name: Option<&str>,
        config_source: &str,
    ) -> Result<ProjectPort, RegistryError> {
        RegistryStore::add_project_port(self, project_id, port, script_name, config_source)
    }

    fn jenkins_jobs_by_project(
        &mut self,
        project_id: i64,
    ) -> Result<Vec<JenkinsJob>, RegistryError> {
        Ok(RegistryStore::jenkins_jobs_by_project(self, project_id))
    }

    fn upsert_jenkins_job(
        &mut self,
        project_id: i64,
        job_name: &str,
        job_url: &str,
        last_build_status: Option<&str>,
        last_build_number: Option<i64>,
    ) -> Result<JenkinsJob, RegistryError> {
        RegistryStore::upsert_jenkins_job(
            self,
            project_id,
            job_name,
            job_url,
            last_build_status,
            last_build_number,
        )
    }

    fn results_by_project(&mut self, project_id: i64) -> Result<Vec<TestResult>, RegistryError> {
        Ok(RegistryStore::results_by_project(self, project_id))
    }

    fn add_test_result(&mut self, new: NewTestResult) -> Result<TestResult, RegistryError> {
        RegistryStore::add_test_result(self, new)
    }

    fn setting(&mut self, key: &str) -> Result<Option<String>, RegistryError> {
        Ok(RegistryStore::setting(self, key))
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<(), RegistryError> {
        RegistryStore::set_setting(self, key, value)
    }

    fn all_settings(&mut self) -> Result<BTreeMap<String, String>, RegistryError> {
        Ok(RegistryStore::all_settings(self))
    }

    fn scan_project(&mut self, project_id: i64) -> Result<ScanOutcome, RegistryError> {
        scan::scan_project(self, project_id)
    }

    fn scan_all(&mut self) -> Result<Vec<ScanOutcome>, RegistryError> {
        Ok(scan::scan_all(self))
    }
}
