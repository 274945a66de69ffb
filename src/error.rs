//! Error taxonomy for the registry.

use std::path::PathBuf;

/// Errors surfaced by the registry store, scanner, and remote client.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A project with the same path is already registered.
    #[error("a project already exists at path {0}")]
    DuplicatePath(String),

    /// The referenced entity id is unknown.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A project's stored path no longer exists on disk.
    #[error("project path does not exist: {0}")]
    PathMissing(PathBuf),

    /// Malformed caller input (e.g. an invalid backup envelope).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Transport or protocol failure talking to a remote registry.
    #[error("remote registry error: {0}")]
    Http(String),
}

impl RegistryError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}
