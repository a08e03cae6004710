#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! SpamShield HTTP service: configuration, shared context, and the axum router.

/// TOML configuration and command-line overrides.
pub mod config;
/// Application context shared by all handlers.
pub mod context;
/// HTTP error kinds and their JSON rendering.
pub mod error;
/// Request handlers.
pub mod handlers;
/// Router assembly.
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

pub use config::{ConfigOverrides, ServiceConfig};
pub use context::AppContext;
pub use error::ApiError;
pub use routes::router;

/// Binds `ctx.config().bind` and serves until Ctrl-C.
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let bind = ctx.config().bind.clone();
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(
        %bind,
        model_trained = ctx.model_trained(),
        data_loaded = ctx.data_loaded(),
        "spam detection api listening"
    );
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
