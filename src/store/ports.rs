//! Project ports: upsert keyed on `(project_id, port, script_name)`, where a
//! null script name is its own slot.

use crate::error::RegistryError;

use super::document::{next_id, ProjectPort};
use super::{current_time_secs, RegistryStore};

impl RegistryStore {
    /// Insert or update a detected port. On update, `config_source` is
    /// overwritten and `last_detected` refreshed to now.
    pub fn add_project_port(
        &mut self,
        project_id: i64,
        port: u16,
        script_name: Option<&str>,
        config_source: &str,
    ) -> Result<ProjectPort, RegistryError> {
        let now = current_time_secs();

        if let Some(existing) = self.doc_mut().project_ports.iter_mut().find(|p| {
            p.project_id == project_id
                && p.port == port
                && p.script_name.as_deref() == script_name
        }) {
            existing.config_source = config_source.to_string();
            existing.last_detected = now;
            let updated = existing.clone();
            self.persist()?;
            return Ok(updated);
        }

        let record = ProjectPort {
            id: next_id(&self.doc().project_ports, |p| p.id),
            project_id,
            port,
            script_name: script_name.map(str::to_string),
            config_source: config_source.to_string(),
            last_detected: now,
            created_at: now,
        };
        self.doc_mut().project_ports.push(record.clone());
        self.persist()?;
        Ok(record)
    }

    pub fn ports_by_project(&self, project_id: i64) -> Vec<ProjectPort> {
        let mut ports: Vec<ProjectPort> = self
            .doc()
            .project_ports
            .iter()
            .filter(|p| p.project_id == project_id)
            .cloned()
            .collect();
        ports.sort_by_key(|p| p.id);
        ports
    }

    pub fn remove_project_ports(&mut self, project_id: i64) -> Result<(), RegistryError> {
        let doc = self.doc_mut();
        let before = doc.project_ports.len();
        doc.project_ports.retain(|p| p.project_id != project_id);
        if doc.project_ports.len() == before {
            return Ok(());
        }
        self.persist()
    }
}
