//! Session-lifecycle error type (§7 "Error Handling Design").
//!
//! Every variant here maps 1:1 onto a row of the error table: its
//! `Recovery` column is not encoded in the type itself (that lives in
//! `session::SessionController`, which is the only code that decides what
//! to do about a failure) but the variant names are kept identical to the
//! table's `Kind` column so the two stay easy to cross-reference.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport closed")]
    TransportClosed,

    #[error("recognizer failed: {0}")]
    RecognizerFailed(String),

    #[error("translation failed: {0}")]
    TranslationFailed(String),

    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("capture device unavailable")]
    CapturePermanent,

    #[error("{queue} queue overflowed")]
    QueueOverflow { queue: &'static str },
}

impl From<voice_translate_providers::ProviderError> for SessionError {
    fn from(err: voice_translate_providers::ProviderError) -> Self {
        SessionError::RecognizerFailed(err.to_string())
    }
}

impl From<SessionError> for axum::http::StatusCode {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::TransportClosed => axum::http::StatusCode::BAD_REQUEST,
            SessionError::RecognizerFailed(_) => axum::http::StatusCode::BAD_GATEWAY,
            SessionError::TranslationFailed(_) => axum::http::StatusCode::BAD_GATEWAY,
            SessionError::SynthesisFailed(_) => axum::http::StatusCode::BAD_GATEWAY,
            SessionError::CapturePermanent => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            SessionError::QueueOverflow { .. } => axum::http::StatusCode::TOO_MANY_REQUESTS,
        }
    }
}
