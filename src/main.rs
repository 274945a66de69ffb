//! Testdeck CLI: serve the registry API or work the registry directly.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use testdeck::api::{self, AppState};
use testdeck::scan;
use testdeck::store::RegistryStore;

/// Local registry of project directories, test frameworks, tests and ports.
#[derive(Parser, Debug)]
#[command(name = "testdeck")]
struct Cli {
    /// Registry document location (defaults to the per-user data dir).
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API; other consumers find it via the port file.
    Serve {
        /// Host address to bind.
        #[arg(long)]
        host: Option<String>,
        /// Port to bind; 0 picks a free port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Register a project directory.
    Add { name: String, path: PathBuf },
    /// List registered projects.
    List,
    /// Scan one project (by id) or every project.
    Scan {
        #[arg(long)]
        project: Option<i64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (stderr, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_writer(stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let registry_path = resolve_registry_path(cli.registry)?;
    let mut store = RegistryStore::open(&registry_path)
        .with_context(|| format!("opening registry at {}", registry_path.display()))?;

    match cli.command {
        Command::Serve { host, port } => serve(store, host, port)?,
        Command::Add { name, path } => {
            let path = path
                .canonicalize()
                .with_context(|| format!("resolving {}", path.display()))?;
            let project = store.add_project(&name, &path.to_string_lossy())?;
            println!("added project {} (id {})", project.name, project.id);
        }
        Command::List => {
            for p in store.projects() {
                let framework = p.framework.as_deref().unwrap_or("-");
                println!("{:>4}  {:<24} {:<12} {}", p.id, p.name, framework, p.path);
            }
        }
        Command::Scan { project } => match project {
            Some(id) => {
                let outcome = scan::scan_project(&mut store, id)?;
                println!(
                    "{}: {} test file(s) found",
                    outcome.project.name, outcome.tests_found
                );
            }
            None => {
                for outcome in scan::scan_all(&mut store) {
                    println!(
                        "{}: {} test file(s) found",
                        outcome.project.name, outcome.tests_found
                    );
                }
            }
        },
    }

    Ok(())
}

fn resolve_registry_path(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    let config = testdeck::config::load();
    if let Some(path) = config.registry_path {
        return Ok(path);
    }
    testdeck::paths::registry_file()
        .ok_or_else(|| anyhow::anyhow!("cannot resolve registry path (is HOME set?)"))
}

fn serve(store: RegistryStore, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let config = testdeck::config::load();
    let host = host.unwrap_or(config.host);
    let port = port.unwrap_or(config.port);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;

        let ct = CancellationToken::new();
        tokio::spawn({
            let ct = ct.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutting down...");
                    ct.cancel();
                }
            }
        });

        api::serve(listener, AppState::new(store), ct, testdeck::paths::port_file()).await?;
        Ok(())
    })
}
