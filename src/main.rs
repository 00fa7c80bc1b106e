use std::sync::Arc;

use tracing::{error, info};

use docshare::{AppState, Config, Database, FsBlobStore, WebServer};

/// Config file read from the working directory.
const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = docshare::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        docshare::logging::init_console_only(&config.logging.level);
    }

    info!("docshare - document sharing service");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> docshare::Result<()> {
    let db = Database::open(&config.database.path).await?;

    let blobs = FsBlobStore::new(&config.storage.path)?;
    info!("Blob store at {}", blobs.base_path().display());

    let state = AppState::new(Arc::new(db.clone()), Arc::new(blobs))
        .with_public_base_url(config.web.public_base_url.clone());

    let server = WebServer::new(&config.web, state)?;
    server.run().await?;

    db.close().await;
    Ok(())
}
