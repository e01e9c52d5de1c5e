//! Translation seam (§4.6 "Translation Stage").
//!
//! One request in, one result out — the provider contract here really is
//! synchronous request/response (a REST POST), so the trait stays that
//! simple rather than inventing a streaming shape nothing needs.

use async_trait::async_trait;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_locale` into `target_lang`.
    ///
    /// Implementations must not retry internally beyond what the provider
    /// contract documents (§6.2) — retry policy belongs to the caller,
    /// which knows the session-level consequences of a stalled pipeline.
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_lang: &str,
    ) -> Result<String, crate::error::CoreError>;
}
