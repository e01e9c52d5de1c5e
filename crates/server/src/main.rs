//! Channel server entry point (§6 "Server command surface").
//!
//! Parses one channel's configuration and credentials, binds one port, and
//! serves it until shutdown. Startup misconfiguration (a missing credential)
//! is an `anyhow`-reported non-zero exit, per §6 "Exit codes"; runtime
//! failures never exit the process; they surface as `error` control frames
//! from within a session (§7).

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use voice_translate_config::{ServerArgs, ServerSettings};
use voice_translate_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    let log_json = args.log_json;
    let settings: ServerSettings = args
        .try_into()
        .context("startup configuration error (missing required credential)")?;

    init_tracing(log_json);

    tracing::info!(
        channel = %settings.channel.channel,
        source_locale = %settings.channel.source_locale,
        target_lang = %settings.channel.target_lang,
        bind_host = %settings.bind_host,
        bind_port = settings.bind_port,
        "starting channel server"
    );

    let metrics_handle = init_metrics();
    let addr = SocketAddr::new(
        settings
            .bind_host
            .parse()
            .context("invalid --bind-host")?,
        settings.bind_port,
    );

    let state = AppState::new(settings, metrics_handle);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server loop exited with error")?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    if log_json {
        subscriber.with(tracing_subscriber::fmt::layer().json().boxed()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().boxed()).init();
    }
}
