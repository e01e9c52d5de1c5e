//! The one error type every adapter in this crate converts into.
//!
//! Variants map close to 1:1 onto the §7 error table entries that are
//! provider-facing (`TranslationFailed`, `SynthesisFailed`,
//! `RecognizerFailed`); the session layer in `voice-translate-server`
//! decides what each variant means for the session FSM.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("provider protocol error: {0}")]
    Protocol(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<ProviderError> for voice_translate_core::CoreError {
    fn from(err: ProviderError) -> Self {
        voice_translate_core::CoreError::Provider(err.to_string())
    }
}
