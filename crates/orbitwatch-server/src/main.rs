//! OrbitWatch — orbital-object catalog server.

use std::path::PathBuf;
use std::sync::Arc;

use orbitwatch_core::OrbitWatchConfig;
use orbitwatch_runtime::HttpFetcher;
use orbitwatch_server::{build_router, worker, AppState};
use orbitwatch_store::CatalogStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("ORBITWATCH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn build_state(config: OrbitWatchConfig) -> anyhow::Result<Arc<AppState>> {
    let store = CatalogStore::open(&config.data_paths.catalog)
        .map_err(|e| anyhow::anyhow!("Failed to open catalog store: {}", e))?;
    let propagator = orbitwatch_propagate::create_propagator();
    let fetcher = HttpFetcher::new(config.fetch)
        .map_err(|e| anyhow::anyhow!("Failed to create fetcher: {}", e))?;
    Ok(Arc::new(AppState::new(
        config,
        store,
        propagator,
        Arc::new(fetcher),
    )))
}

fn parse_count(arg: Option<&String>, what: &str) -> Option<usize> {
    let raw = arg?;
    match raw.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("Invalid {} count: {}", what, raw);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "refresh" => {
                let config = OrbitWatchConfig::from_env(resolve_data_dir())?;
                let debris = parse_count(args.get(2), "debris");
                let satellite = parse_count(args.get(3), "satellite");
                let state = build_state(config)?;
                let limits = state.limits_with(&[("debris", debris), ("satellite", satellite)]);

                match state.orchestrator.refresh(&limits).await {
                    Ok(report) => {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                        return Ok(());
                    }
                    Err(e) => {
                        eprintln!("Refresh failed: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            "--help" | "-h" | "help" => {
                println!("OrbitWatch — orbital-object catalog server");
                println!();
                println!("Usage: orbitwatch [command]");
                println!();
                println!("Commands:");
                println!("  (none)                        Start the server");
                println!("  refresh [debris] [satellite]  Refresh the catalog once and exit");
                println!("  help                          Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'orbitwatch help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = OrbitWatchConfig::from_env(&data_dir)?;
    let port = config.port;
    let state = build_state(config)?;

    // Serve whatever the store already holds until the first refresh.
    match state.orchestrator.reload().await {
        Ok(summary) => info!(
            "Startup snapshot {}: {} objects ({} excluded)",
            summary.version,
            summary.objects,
            summary.excluded.len()
        ),
        Err(e) => warn!("Startup snapshot failed, serving empty catalog: {}", e),
    }

    worker::start_refresh_worker(state.clone());

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("OrbitWatch server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
