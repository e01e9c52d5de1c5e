//! Per-channel WebSocket session server (§4.8–§4.9, §6 "Server command
//! surface").
//!
//! One bound port serves one channel: a fixed source locale, target
//! language, and voice, shared by every connection the port accepts (§9
//! "one session per port is the simplest reading and is assumed here").
//! `state` holds that fixed configuration and the two stateless provider
//! clients; `session` is the per-connection Session Controller; `websocket`
//! and `http` wire both into an `axum` router.

pub mod error;
pub mod http;
pub mod metrics;
pub mod session;
pub mod state;
pub mod websocket;

pub use error::SessionError;
pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;
