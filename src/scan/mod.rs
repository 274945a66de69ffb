//! Filesystem scanner: reconciles a project's test rows against what is
//! actually on disk.
//!
//! A scan is replace-not-diff: all existing test rows for the project are
//! deleted, the tree is walked, and every matching file is re-added. A
//! re-scan is the sole mechanism for dropping stale rows, at the cost of id
//! churn across scans.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::detect;
use crate::error::RegistryError;
use crate::store::{Project, RegistryStore, Test};

/// Directory names never descended into: dependency caches, VCS metadata,
/// build output. Hidden directories are skipped as a class.
const IGNORED_DIRS: [&str; 14] = [
    "node_modules",
    "bower_components",
    "vendor",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "__pycache__",
    "venv",
    "env",
    "tmp",
    "logs",
    "cache",
];

/// Walks deeper than any sane project nests; cheap guard against runaway
/// trees rather than a tuning knob.
const MAX_DEPTH: usize = 32;

/// Outcome of scanning one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub project: Project,
    pub tests_found: usize,
    pub tests: Vec<Test>,
}

/// Scan one project: detect its frameworks, replace its test rows with the
/// files currently on disk, and stamp `last_scanned`.
///
/// # Errors
///
/// `NotFound` if the id is unknown to the store; `PathMissing` if the stored
/// path no longer exists on disk.
pub fn scan_project(
    store: &mut RegistryStore,
    project_id: i64,
) -> Result<ScanOutcome, RegistryError> {
    let project = store
        .project(project_id)
        .ok_or_else(|| RegistryError::not_found("project", project_id))?;

    let root = PathBuf::from(&project.path);
    if !root.is_dir() {
        return Err(RegistryError::PathMissing(root));
    }

    let test_framework = detect::detect_test_framework(&root);
    let project_framework = detect::detect_project_framework(&root);
    debug!(
        project = %project.name,
        ?test_framework,
        ?project_framework,
        "scanning project"
    );

    store.remove_tests_by_project(project_id)?;

    let mut files = Vec::new();
    let mut visited = HashSet::new();
    walk(&root, &root, 0, &mut visited, &mut |path| {
        if detect::is_test_file(path, test_framework) {
            if let Ok(rel) = path.strip_prefix(&root) {
                files.push(rel.to_path_buf());
            }
        }
    })?;

    let mut tests = Vec::new();
    for rel in &files {
        let rel_str = rel.to_string_lossy();
        tests.push(store.add_test(project_id, &rel_str, test_framework)?);
    }

    if project.framework.as_deref() != project_framework.as_deref() {
        store.update_project(
            project_id,
            crate::store::ProjectUpdate {
                framework: Some(project_framework),
                ..Default::default()
            },
        )?;
    }
    let project = store.touch_last_scanned(project_id, crate::store::current_time_secs())?;

    Ok(ScanOutcome {
        tests_found: tests.len(),
        tests,
        project,
    })
}

/// Scan every registered project in ascending-id order. A single project's
/// failure is logged and excluded; it does not abort the remaining scans.
pub fn scan_all(store: &mut RegistryStore) -> Vec<ScanOutcome> {
    let mut outcomes = Vec::new();
    for project in store.projects() {
        match scan_project(store, project.id) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!("skipping scan of {} ({}): {e}", project.name, project.path),
        }
    }
    outcomes
}

/// Depth-bounded, cycle-guarded recursive walk. Ignored and hidden
/// directories are never entered; unreadable subdirectories are skipped. The
/// visited set tracks canonicalized directory paths so symlink cycles
/// terminate.
fn walk(
    root: &Path,
    dir: &Path,
    depth: usize,
    visited: &mut HashSet<PathBuf>,
    on_file: &mut impl FnMut(&Path),
) -> Result<(), RegistryError> {
    if depth > MAX_DEPTH {
        debug!("depth limit reached under {}", dir.display());
        return Ok(());
    }

    let canonical = match dir.canonicalize() {
        Ok(c) => c,
        Err(e) => {
            debug!("cannot canonicalize {}: {e}", dir.display());
            return Ok(());
        }
    };
    if !visited.insert(canonical) {
        return Ok(());
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if dir == root => return Err(e.into()),
        Err(e) => {
            debug!("cannot read {}: {e}", dir.display());
            return Ok(());
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if path.is_dir() {
            if name.starts_with('.') || IGNORED_DIRS.contains(&name) {
                continue;
            }
            walk(root, &path, depth + 1, visited, on_file)?;
        } else if path.is_file() {
            on_file(&path);
        }
    }

    Ok(())
}
