//! Edge client entry point (§6 "Edge command surface").
//!
//! Opens the capture and playback devices, connects to the channel
//! server, and runs until the transport closes or the process is signaled
//! to stop. Capture-device failures are retried with a short backoff
//! (§4.1, §10.6) up to a small retry budget before the process gives up
//! and exits non-zero.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use voice_translate_config::{EdgeArgs, EdgeSettings};
use voice_translate_edge::{capture, playback::PlaybackSink, transport};

const MAX_CAPTURE_RETRIES: u32 = 5;
const CAPTURE_RETRY_BACKOFF: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = EdgeArgs::parse();
    let log_json = args.log_json;
    let settings: EdgeSettings = args.into();

    init_tracing(log_json);
    tracing::info!(
        url = %settings.url,
        capture_device = %settings.capture_device,
        playback_device = %settings.playback_device,
        "starting edge client"
    );

    let ws = transport::connect(&settings.url)
        .await
        .context("failed to connect to channel server")?;
    let (sink, stream) = ws.split();

    let playback = Arc::new(
        PlaybackSink::start(&settings.playback_device, settings.audio_format)
            .context("failed to open playback device")?,
    );

    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<String>();

    let mut capture_stream = capture::start(
        &settings.capture_device,
        settings.audio_format,
        settings.chunk_ms,
        chunk_tx.clone(),
        error_tx.clone(),
    )
    .context("failed to open capture device")?;

    let uplink = tokio::spawn(transport::run_uplink(sink, chunk_rx));
    let downlink = tokio::spawn(transport::run_downlink(stream, playback));

    let mut retries = 0u32;
    tokio::select! {
        _ = downlink => {
            tracing::info!("downlink closed, shutting down");
        }
        _ = async {
            loop {
                let Some(error) = error_rx.recv().await else { break };
                tracing::warn!(error, retries, "capture stream failed, reopening after backoff");
                if retries >= MAX_CAPTURE_RETRIES {
                    tracing::error!("capture device retry budget exhausted, giving up");
                    break;
                }
                retries += 1;
                tokio::time::sleep(CAPTURE_RETRY_BACKOFF).await;
                match capture::start(
                    &settings.capture_device,
                    settings.audio_format,
                    settings.chunk_ms,
                    chunk_tx.clone(),
                    error_tx.clone(),
                ) {
                    Ok(stream) => {
                        capture_stream = stream;
                        retries = 0;
                    }
                    Err(e) => tracing::warn!(error = %e, "capture device reopen failed"),
                }
            }
        } => {
            tracing::info!("capture recovery loop ended, shutting down");
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    drop(capture_stream);
    uplink.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
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
