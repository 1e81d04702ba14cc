//! `sealfield-server`: HTTP front end for field-level encryption.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured logging.
//! 3. Build the process [`KeyMaterial`](sealfield::KeyMaterial) once; it is never re-read.
//! 4. Load field definitions into the [`FieldRegistry`].
//! 5. Spawn the definition refresh task.
//! 6. Build the Axum router and serve.

mod config;
mod registry;
mod server;
mod telemetry;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use config::Config;
use registry::FieldRegistry;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        use_hkdf = cfg.use_hkdf,
        process_keys = cfg.key_list().len(),
        "sealfield-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. Key material
    // -----------------------------------------------------------------------
    let material = cfg.key_material();

    // -----------------------------------------------------------------------
    // 4. Field registry
    // -----------------------------------------------------------------------
    let fields_path = PathBuf::from(&cfg.fields_path);
    let field_registry = FieldRegistry::new();
    registry::load_all(&fields_path, &material, &field_registry).await?;

    // -----------------------------------------------------------------------
    // 5. Background tasks
    // -----------------------------------------------------------------------
    let _field_refresh = registry::refresh_task(
        fields_path,
        cfg.field_refresh_interval_secs,
        material,
        field_registry.clone(),
    );

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(field_registry));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
