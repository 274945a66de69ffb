//! Jenkins jobs: upsert keyed on `(project_id, job_name)`.

use crate::error::RegistryError;

use super::document::{next_id, JenkinsJob};
use super::{current_time_secs, RegistryStore};

impl RegistryStore {
    /// Insert or update a Jenkins job. On update, `job_url` and the build
    /// fields are overwritten and `last_updated` refreshed to now.
    pub fn upsert_jenkins_job(
        &mut self,
        project_id: i64,
        job_name: &str,
        job_url: &str,
        last_build_status: Option<&str>,
        last_build_number: Option<i64>,
    ) -> Result<JenkinsJob, RegistryError> {
        let now = current_time_secs();

        if let Some(existing) = self
            .doc_mut()
            .jenkins_jobs
            .iter_mut()
            .find(|j| j.project_id == project_id && j.job_name == job_name)
        {
            existing.job_url = job_url.to_string();
            existing.last_build_status = last_build_status.map(str::to_string);
            existing.last_build_number = last_build_number;
            existing.last_updated = Some(now);
            let updated = existing.clone();
            self.persist()?;
            return Ok(updated);
        }

        let job = JenkinsJob {
            id: next_id(&self.doc().jenkins_jobs, |j| j.id),
            project_id,
            job_name: job_name.to_string(),
            job_url: job_url.to_string(),
            last_build_status: last_build_status.map(str::to_string),
            last_build_number,
            last_updated: Some(now),
            created_at: now,
        };
        self.doc_mut().jenkins_jobs.push(job.clone());
        self.persist()?;
        Ok(job)
    }

    pub fn jenkins_jobs_by_project(&self, project_id: i64) -> Vec<JenkinsJob> {
        let mut jobs: Vec<JenkinsJob> = self
            .doc()
            .jenkins_jobs
            .iter()
            .filter(|j| j.project_id == project_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.id);
        jobs
    }
}
