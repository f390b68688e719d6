use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=debug,claims_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = server::config::load_config();
    server::health::record_start_time();

    let state = match server::db::AppState::from_config(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize document storage: {e}");
            std::process::exit(1);
        }
    };
    match config.server.storage_dir.as_deref() {
        Some(dir) => tracing::info!(dir, "Storing documents on disk"),
        None => tracing::info!("Storing documents in memory"),
    }

    let app = server::build_router(state, config.server.max_upload_bytes);

    let listener = match tokio::net::TcpListener::bind(&config.server.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.server.bind_addr, "Failed to bind: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %config.server.bind_addr, "Claims server listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}
