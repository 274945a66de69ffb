//! Thin HTTP surface over the registry store.
//!
//! Routes map requests onto store/scanner calls and translate
//! [`RegistryError`] into status codes: 201 on creation, 204 on deletion,
//! 404 for unknown ids, 409 on duplicate-path conflicts, 400 on invalid
//! input. No logic lives here beyond that mapping.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::backup;
use crate::error::RegistryError;
use crate::scan;
use crate::store::{NewTestResult, ProjectUpdate, RegistryStore};

/// Shared handler state: the single writer process owns the store.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<RegistryStore>>,
}

impl AppState {
    pub fn new(store: RegistryStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryStore> {
        self.store.lock().expect("registry store mutex poisoned")
    }
}

struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RegistryError::DuplicatePath(_) => StatusCode::CONFLICT,
            RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
            RegistryError::PathMissing(_) | RegistryError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            RegistryError::Io(_) | RegistryError::Serialize(_) | RegistryError::Http(_) => {
                error!("internal registry error: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).patch(patch_project).delete(delete_project),
        )
        .route(
            "/api/projects/{id}/tests",
            get(list_tests).post(create_test),
        )
        .route(
            "/api/projects/{id}/ports",
            get(list_ports).post(create_port),
        )
        .route(
            "/api/projects/{id}/jenkins-jobs",
            get(list_jenkins_jobs).post(upsert_jenkins_job),
        )
        .route(
            "/api/projects/{id}/results",
            get(list_results).post(create_result),
        )
        .route("/api/projects/{id}/scan", post(scan_one))
        .route("/api/scan", post(scan_everything))
        .route("/api/tags", get(list_tags))
        .route("/api/settings", get(list_settings))
        .route(
            "/api/settings/{key}",
            get(get_setting).put(put_setting),
        )
        .route("/api/backup", get(export_backup))
        .route("/api/backup/restore", post(restore_backup))
        .with_state(state)
}

/// Bind-and-serve with graceful shutdown. When `port_file` is given, the
/// bound port is published there as plain decimal text and removed again on
/// clean shutdown.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    ct: CancellationToken,
    port_file: Option<PathBuf>,
) -> io::Result<()> {
    let addr = listener.local_addr()?;
    info!("registry API listening on http://{addr}");

    if let Some(path) = &port_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, addr.port().to_string())?;
    }

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await;

    if let Some(path) = &port_file {
        let _ = std::fs::remove_file(path);
    }

    result
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
struct NewProject {
    name: String,
    path: String,
}

async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
    if body.name.is_empty() || body.path.is_empty() {
        return Err(RegistryError::InvalidInput("name and path are required".into()).into());
    }
    let project = state.lock().add_project(&body.name, &body.path)?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[derive(Deserialize)]
struct ProjectsQuery {
    #[serde(default)]
    path: Option<String>,
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectsQuery>,
) -> impl IntoResponse {
    let store = state.lock();
    match query.path {
        Some(path) => Json(store.project_by_path(&path).into_iter().collect::<Vec<_>>()),
        None => Json(store.projects()),
    }
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .lock()
        .project(id)
        .ok_or_else(|| RegistryError::not_found("project", id))?;
    Ok(Json(project))
}

async fn patch_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ProjectUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.lock().update_project(id, update)?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.lock().remove_project(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct NewTest {
    file_path: String,
    #[serde(default)]
    framework: Option<String>,
}

async fn create_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewTest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.lock();
    if store.project(id).is_none() {
        return Err(RegistryError::not_found("project", id).into());
    }
    let test = store.add_test(id, &body.file_path, body.framework.as_deref())?;
    Ok((StatusCode::CREATED, Json(test)))
}

async fn list_tests(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    Json(state.lock().tests_by_project(id))
}

#[derive(Deserialize)]
struct NewPort {
    port: u16,
    #[serde(default)]
    script_name: Option<String>,
    config_source: String,
}

async fn create_port(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewPort>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.lock();
    if store.project(id).is_none() {
        return Err(RegistryError::not_found("project", id).into());
    }
    let port =
        store.add_project_port(id, body.port, body.script_name.as_deref(), &body.config_source)?;
    Ok((StatusCode::CREATED, Json(port)))
}

async fn list_ports(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    Json(state.lock().ports_by_project(id))
}

#[derive(Deserialize)]
struct NewJenkinsJob {
    job_name: String,
    job_url: String,
    #[serde(default)]
    last_build_status: Option<String>,
    #[serde(default)]
    last_build_number: Option<i64>,
}

async fn upsert_jenkins_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewJenkinsJob>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.lock();
    if store.project(id).is_none() {
        return Err(RegistryError::not_found("project", id).into());
    }
    let job = store.upsert_jenkins_job(
        id,
        &body.job_name,
        &body.job_url,
        body.last_build_status.as_deref(),
        body.last_build_number,
    )?;
    Ok((StatusCode::CREATED, Json(job)))
}

async fn list_jenkins_jobs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    Json(state.lock().jenkins_jobs_by_project(id))
}

#[derive(Deserialize)]
struct NewResultBody {
    script_name: String,
    #[serde(default)]
    framework: Option<String>,
    #[serde(default)]
    passed: i64,
    #[serde(default)]
    failed: i64,
    #[serde(default)]
    skipped: i64,
    #[serde(default)]
    total: i64,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    coverage: Option<f64>,
    #[serde(default)]
    raw_output: Option<String>,
}

async fn create_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewResultBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.lock();
    if store.project(id).is_none() {
        return Err(RegistryError::not_found("project", id).into());
    }
    let result = store.add_test_result(NewTestResult {
        project_id: id,
        script_name: body.script_name,
        framework: body.framework,
        passed: body.passed,
        failed: body.failed,
        skipped: body.skipped,
        total: body.total,
        duration: body.duration,
        coverage: body.coverage,
        raw_output: body.raw_output,
    })?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn list_results(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    Json(state.lock().results_by_project(id))
}

async fn scan_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.lock();
    let outcome = scan::scan_project(&mut store, id)?;
    Ok(Json(outcome))
}

async fn scan_everything(State(state): State<AppState>) -> impl IntoResponse {
    let mut store = state.lock();
    Json(scan::scan_all(&mut store))
}

async fn list_tags(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.lock().all_tags())
}

async fn list_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.lock().all_settings())
}

async fn get_setting(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.lock().setting(&key) {
        Some(value) => Json(json!({ "key": key, "value": value })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no such setting: {key}") })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct SettingBody {
    value: String,
}

async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<SettingBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.lock().set_setting(&key, &body.value)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_backup(State(state): State<AppState>) -> impl IntoResponse {
    Json(backup::export(&state.lock()))
}

async fn restore_backup(
    State(state): State<AppState>,
    Json(raw): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    backup::restore(&mut state.lock(), raw)?;
    Ok(StatusCode::NO_CONTENT)
}
