//! Edge-side error type (§10.2).
//!
//! Mirrors `voice_translate_providers::ProviderError` in shape: one
//! `thiserror` enum for every fallible boundary this binary touches, so
//! `main` has a single type to match on when deciding whether a failure is
//! a startup error (non-zero exit) or a runtime condition to retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("audio device error: {0}")]
    Device(String),

    #[error("capture stream error: {0}")]
    Capture(String),

    #[error("playback stream error: {0}")]
    Playback(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<cpal::DevicesError> for EdgeError {
    fn from(err: cpal::DevicesError) -> Self {
        EdgeError::Device(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for EdgeError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        EdgeError::Device(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for EdgeError {
    fn from(err: cpal::BuildStreamError) -> Self {
        EdgeError::Device(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for EdgeError {
    fn from(err: cpal::PlayStreamError) -> Self {
        EdgeError::Device(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for EdgeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        EdgeError::Transport(err.to_string())
    }
}
