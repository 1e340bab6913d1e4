//! HTTP front end of vizport.
//!
//! [`routes::router`] builds the axum application around an
//! [`AppState`]; [`run`] adds configuration, the TTL sweeper and graceful
//! shutdown on top.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod state;
pub mod sweeper;
pub mod telemetry;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;

pub use config::Config;
pub use routes::router;
pub use state::AppState;

/// Serve until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).await?;
    let shutdown = CancellationToken::new();

    let sweeper = match (state.store(), config.store_ttl()) {
        (Some(store), Some(ttl)) => Some(sweeper::spawn_sweeper(
            store,
            ttl,
            config.sweep_interval(),
            shutdown.child_token(),
        )),
        _ => None,
    };

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!(
        listen = %config.listen,
        public_url = %config.public_url,
        style = ?config.reference_style,
        "vizport listening"
    );

    let signal = shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            tracing::info!("shutting down");
            signal.cancel();
        })
        .await
        .context("serving http")?;

    shutdown.cancel();
    if let Some(sweeper) = sweeper {
        sweeper.await.context("joining sweeper")?;
    }
    Ok(())
}
