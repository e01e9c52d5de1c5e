//! Speech synthesis seam (§4.7 "Synthesis Stage").
//!
//! The provider contract (§6.3) allows two shapes in practice — a
//! push-callback stream of audio frames, or a one-shot WAV buffer — but
//! callers only ever want one thing: an ordered stream of PCM frames for
//! one utterance, terminated by an explicit end marker or a single error.
//! Adapters that only get a one-shot buffer from their provider still
//! expose it through this same streaming trait by chunking it themselves
//! (see `providers::tts::TtsAdapter::one_shot`), so the Session Controller
//! never has to branch on provider shape.

use crate::session::SynthesisFrame;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Either a frame or the terminal condition of a synthesis stream.
#[derive(Debug, Clone)]
pub enum SynthesisEvent {
    Frame(SynthesisFrame),
    /// The provider reported a failure partway through. No further frames
    /// follow; the Session Controller treats this like a Stage 5 failure
    /// (§7 "Stage-local failures") even though synthesis had started.
    Error(String),
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text` in `voice` and return an ordered stream of frames
    /// for `sequence`, ending with a frame where `is_last` is true, or a
    /// single `SynthesisEvent::Error`.
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        sequence: u64,
    ) -> Result<BoxStream<'static, SynthesisEvent>, crate::error::CoreError>;
}
