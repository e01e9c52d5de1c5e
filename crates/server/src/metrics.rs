//! Prometheus metrics export (§10.4 of the expanded spec).
//!
//! The counters and histograms themselves are recorded inline in
//! `session.rs` via the `metrics` facade macros; this module only installs
//! the global recorder and exposes its rendered text on `/metrics`. This is
//! ambient observability, not the out-of-scope "quota accounting across
//! sessions" — nothing here is keyed per-credential or enforced against.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the process-global Prometheus recorder. Must be called exactly
/// once, before any `metrics::counter!`/`histogram!`/`gauge!` call, which in
/// practice means first thing in `main`.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus metrics recorder")
}

pub async fn metrics_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
) -> impl IntoResponse {
    state.metrics_handle.render()
}
