//! Crate-local error type.
//!
//! `CoreError` only covers failures that can happen constructing or
//! validating the data types in this crate. Provider I/O errors live in
//! `voice-translate-providers::ProviderError`; session-lifecycle errors
//! live in `voice-translate-server::SessionError`. Keeping those separate
//! means this crate's dependents each see only the error variants relevant
//! to them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed control frame: {0}")]
    MalformedControlFrame(#[from] serde_json::Error),

    #[error("PCM payload length {len} is not a multiple of the sample frame size {frame_size}")]
    MisalignedPcm { len: usize, frame_size: usize },

    /// Carries a provider-adapter failure across the `traits` seam.
    ///
    /// The trait definitions in this crate can't name
    /// `voice_translate_providers::ProviderError` directly without an
    /// upward dependency, so adapters flatten their richer error into this
    /// variant's message. Callers that need the original variant match on
    /// the concrete `ProviderError` before it crosses the trait boundary.
    #[error("provider error: {0}")]
    Provider(String),
}
