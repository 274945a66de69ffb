//! Integration test for the HTTP surface and the remote registry
//! personality.
//!
//! Starts the API on a random port with a tempdir-backed store, then drives
//! it through `RemoteRegistry` and raw requests.

use std::net::SocketAddr;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use testdeck::api::{self, AppState};
use testdeck::error::RegistryError;
use testdeck::registry::Registry;
use testdeck::remote::RemoteRegistry;
use testdeck::store::RegistryStore;

struct TestServer {
    addr: SocketAddr,
    ct: CancellationToken,
    handle: Option<std::thread::JoinHandle<()>>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("registry.json")).unwrap();
        let port_file = dir.path().join("api.port");

        let ct = CancellationToken::new();
        let (tx, rx) = std::sync::mpsc::channel();

        let handle = std::thread::spawn({
            let ct = ct.clone();
            move || {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async move {
                    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                    tx.send(listener.local_addr().unwrap()).unwrap();
                    api::serve(listener, AppState::new(store), ct, Some(port_file))
                        .await
                        .unwrap();
                });
            }
        });

        let addr = rx.recv().unwrap();
        Self {
            addr,
            ct,
            handle: Some(handle),
            _dir: dir,
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn port_file(&self) -> std::path::PathBuf {
        self._dir.path().join("api.port")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.ct.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn jest_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"devDependencies": {"jest": "^29.0.0"}}"#,
    )
    .unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/app.test.ts"), "").unwrap();
    dir
}

#[test]
fn project_crud_over_http() {
    let server = TestServer::start();
    let mut remote = RemoteRegistry::new(server.base_url());

    let project = remote.add_project("app", "/tmp/http-app").unwrap();
    assert_eq!(project.id, 1);

    // Duplicate path comes back as the typed conflict.
    let err = remote.add_project("other", "/tmp/http-app").unwrap_err();
    assert!(matches!(err, RegistryError::DuplicatePath(_)));

    let by_path = remote.project_by_path("/tmp/http-app").unwrap();
    assert_eq!(by_path.map(|p| p.id), Some(project.id));
    assert!(remote.project_by_path("/tmp/elsewhere").unwrap().is_none());

    let update = testdeck::store::ProjectUpdate {
        tags: Some(vec!["web".into(), "api".into()]),
        ..Default::default()
    };
    let updated = remote.update_project(project.id, update).unwrap();
    assert_eq!(updated.tags.len(), 2);
    assert_eq!(remote.all_tags().unwrap(), vec!["api", "web"]);

    remote.remove_project(project.id).unwrap();
    assert!(remote.project(project.id).unwrap().is_none());
    // Idempotent delete.
    remote.remove_project(project.id).unwrap();
}

#[test]
fn nested_entities_over_http() {
    let server = TestServer::start();
    let mut remote = RemoteRegistry::new(server.base_url());
    let project = remote.add_project("app", "/tmp/nested-app").unwrap();

    let test = remote
        .add_test(project.id, "src/a.test.ts", Some("jest"))
        .unwrap();
    let again = remote
        .add_test(project.id, "src/a.test.ts", Some("vitest"))
        .unwrap();
    assert_eq!(test.id, again.id);
    assert_eq!(again.framework.as_deref(), Some("vitest"));

    let port = remote
        .add_project_port(project.id, 3000, Some("dev"), "package.json")
        .unwrap();
    assert_eq!(remote.ports_by_project(project.id).unwrap(), vec![port]);

    let job = remote
        .upsert_jenkins_job(project.id, "app-ci", "http://jenkins/app", Some("SUCCESS"), Some(7))
        .unwrap();
    assert_eq!(job.last_build_number, Some(7));

    remote
        .add_test_result(testdeck::store::NewTestResult {
            project_id: project.id,
            script_name: "test".into(),
            framework: Some("jest".into()),
            passed: 3,
            failed: 1,
            skipped: 0,
            total: 4,
            duration: Some(2.2),
            coverage: None,
            raw_output: None,
        })
        .unwrap();
    assert_eq!(remote.results_by_project(project.id).unwrap().len(), 1);

    // Nested writes against an unknown project are 404 → NotFound.
    let err = remote.add_test(999, "x.test.ts", None).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }));
}

#[test]
fn scan_over_http() {
    let server = TestServer::start();
    let mut remote = RemoteRegistry::new(server.base_url());
    let fixture = jest_fixture();

    let project = remote
        .add_project("fixture", &fixture.path().to_string_lossy())
        .unwrap();

    let outcome = remote.scan_project(project.id).unwrap();
    assert_eq!(outcome.tests_found, 1);
    assert_eq!(outcome.tests[0].framework.as_deref(), Some("jest"));
    assert!(outcome.project.last_scanned.unwrap() > 0);

    // A second project with a dead path is skipped by scan-all.
    remote.add_project("gone", "/nonexistent/root").unwrap();
    let outcomes = remote.scan_all().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].project.id, project.id);
}

#[test]
fn settings_and_backup_over_http() {
    let server = TestServer::start();
    let mut remote = RemoteRegistry::new(server.base_url());

    assert_eq!(remote.setting("theme").unwrap(), None);
    remote.set_setting("theme", "dark").unwrap();
    assert_eq!(remote.setting("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(remote.all_settings().unwrap().len(), 1);

    remote.add_project("app", "/tmp/backup-app").unwrap();

    let client = reqwest::blocking::Client::new();
    let envelope: serde_json::Value = client
        .get(format!("{}/api/backup", server.base_url()))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert!(testdeck::backup::is_valid_envelope(&envelope));

    // A junk envelope is rejected with 400.
    let resp = client
        .post(format!("{}/api/backup/restore", server.base_url()))
        .json(&serde_json::json!({ "data": {} }))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);

    // The real envelope restores cleanly.
    let resp = client
        .post(format!("{}/api/backup/restore", server.base_url()))
        .json(&envelope)
        .send()
        .unwrap();
    assert_eq!(resp.status(), 204);
    assert_eq!(remote.projects().unwrap().len(), 1);
}

#[test]
fn port_file_is_published_while_serving() {
    let server = TestServer::start();

    // The port file is written just after bind; poll briefly for it.
    let path = server.port_file();
    let mut contents = None;
    for _ in 0..50 {
        if let Ok(c) = std::fs::read_to_string(&path) {
            contents = Some(c);
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    let contents = contents.expect("port file never appeared");
    assert_eq!(contents.parse::<u16>().unwrap(), server.addr.port());
    assert!(Path::new(&path).exists());
}
