mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use reel_api::storage::Storage;
use reel_api::token::TokenKeys;
use reel_api::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reel=debug,reel_api=debug,reel_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = reel_db::Database::open(&config.db_path)?;
    let storage = Storage::new(config.storage_dir.clone(), config.public_base_url.clone()).await?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens: TokenKeys::new(&config.jwt_secret, config.token_ttl),
        storage,
        default_cover_url: config.default_cover_url.clone(),
        request_timeout: config.request_timeout,
    });

    let app = reel_api::router(state, config.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Reel server listening on {}", addr);
    info!("Serving uploads from {} at {}", config.storage_dir.display(), config.public_base_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("SIGTERM handler unavailable: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
