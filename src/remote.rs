//! HTTP-backed registry personality.
//!
//! Talks to a running `testdeck serve` process instead of opening the JSON
//! file. Capabilities match the local store one-for-one; both sides
//! implement [`Registry`].

use std::collections::BTreeMap;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::RegistryError;
use crate::registry::Registry;
use crate::scan::ScanOutcome;
use crate::store::{
    JenkinsJob, NewTestResult, Project, ProjectPort, ProjectUpdate, Test, TestResult,
};

/// Client for a registry served over HTTP.
pub struct RemoteRegistry {
    client: Client,
    base_url: String,
}

impl RemoteRegistry {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:7432`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, RegistryError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(error_for(status, resp, 0));
        }
        resp.json().map_err(|e| RegistryError::Http(e.to_string()))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RegistryError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        Self::decode(resp)
    }

    fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
        id_hint: i64,
    ) -> Result<T, RegistryError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_for(status, resp, id_hint));
        }
        resp.json().map_err(|e| RegistryError::Http(e.to_string()))
    }
}

/// Map the server's status-code conventions back to the typed taxonomy.
fn error_for(status: StatusCode, resp: Response, id_hint: i64) -> RegistryError {
    let body = resp.text().unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => RegistryError::not_found("project", id_hint),
        StatusCode::CONFLICT => RegistryError::DuplicatePath(body),
        _ => RegistryError::Http(format!("{status}: {body}")),
    }
}

impl Registry for RemoteRegistry {
    fn add_project(&mut self, name: &str, path: &str) -> Result<Project, RegistryError> {
        self.post("/api/projects", &json!({ "name": name, "path": path }), 0)
    }

    fn project(&mut self, id: i64) -> Result<Option<Project>, RegistryError> {
        let resp = self
            .client
            .get(self.url(&format!("/api/projects/{id}")))
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(resp).map(Some)
    }

    fn project_by_path(&mut self, path: &str) -> Result<Option<Project>, RegistryError> {
        let resp = self
            .client
            .get(self.url("/api/projects"))
            .query(&[("path", path)])
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        let matches: Vec<Project> = Self::decode(resp)?;
        Ok(matches.into_iter().next())
    }

    fn projects(&mut self) -> Result<Vec<Project>, RegistryError> {
        self.get("/api/projects")
    }

    fn update_project(
        &mut self,
        id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, RegistryError> {
        let resp = self
            .client
            .patch(self.url(&format!("/api/projects/{id}")))
            .json(&update)
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_for(status, resp, id));
        }
        resp.json().map_err(|e| RegistryError::Http(e.to_string()))
    }

    fn remove_project(&mut self, id: i64) -> Result<(), RegistryError> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/projects/{id}")))
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        let status = resp.status();
        // Delete is idempotent on both personalities.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(error_for(status, resp, id))
        }
    }

    fn all_tags(&mut self) -> Result<Vec<String>, RegistryError> {
        self.get("/api/tags")
    }

    fn tests_by_project(&mut self, project_id: i64) -> Result<Vec<Test>, RegistryError> {
        self.get(&format!("/api/projects/{project_id}/tests"))
    }

    fn add_test(
        &mut self,
        project_id: i64,
        file_path: &str,
        framework: Option<&str>,
    ) -> Result<Test, RegistryError> {
        self.post(
            &format!("/api/projects/{project_id}/tests"),
            &json!({ "file_path": file_path, "framework": framework }),
            project_id,
        )
    }

    fn ports_by_project(&mut self, project_id: i64) -> Result<Vec<ProjectPort>, RegistryError> {
        self.get(&format!("/api/projects/{project_id}/ports"))
    }

    fn add_project_port(
        &mut self,
        project_id: i64,
        port: u16,
        script_name: Option<&str>,
        config_source: &str,
    ) -> Result<ProjectPort, RegistryError> {
        self.post(
            &format!("/api/projects/{project_id}/ports"),
            &json!({
                "port": port,
                "script_name": script_name,
                "config_source": config_source,
            }),
            project_id,
        )
    }

    fn jenkins_jobs_by_project(
        &mut self,
        project_id: i64,
    ) -> Result<Vec<JenkinsJob>, RegistryError> {
        self.get(&format!("/api/projects/{project_id}/jenkins-jobs"))
    }

    fn upsert_jenkins_job(
        &mut self,
        project_id: i64,
        job_name: &str,
        job_url: &str,
        last_build_status: Option<&str>,
        last_build_number: Option<i64>,
    ) -> Result<JenkinsJob, RegistryError> {
        self.post(
            &format!("/api/projects/{project_id}/jenkins-jobs"),
            &json!({
                "job_name": job_name,
                "job_url": job_url,
                "last_build_status": last_build_status,
                "last_build_number": last_build_number,
            }),
            project_id,
        )
    }

    fn results_by_project(&mut self, project_id: i64) -> Result<Vec<TestResult>, RegistryError> {
        self.get(&format!("/api/projects/{project_id}/results"))
    }

    fn add_test_result(&mut self, new: NewTestResult) -> Result<TestResult, RegistryError> {
        let project_id = new.project_id;
        self.post(&format!("/api/projects/{project_id}/results"), &new, project_id)
    }

    fn setting(&mut self, key: &str) -> Result<Option<String>, RegistryError> {
        let resp = self
            .client
            .get(self.url(&format!("/api/settings/{key}")))
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: serde_json::Value = Self::decode(resp)?;
        Ok(body
            .get("value")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<(), RegistryError> {
        let resp = self
            .client
            .put(self.url(&format!("/api/settings/{key}")))
            .json(&json!({ "value": value }))
            .send()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(error_for(status, resp, 0))
        }
    }

    fn all_settings(&mut self) -> Result<BTreeMap<String, String>, RegistryError> {
        self.get("/api/settings")
    }

    fn scan_project(&mut self, project_id: i64) -> Result<ScanOutcome, RegistryError> {
        self.post(
            &format!("/api/projects/{project_id}/scan"),
            &json!({}),
            project_id,
        )
    }

    fn scan_all(&mut self) -> Result<Vec<ScanOutcome>, RegistryError> {
        self.post("/api/scan", &json!({}), 0)
    }
}
