//! Per-session data model (§3 of the spec).
//!
//! A `Session` (owned exclusively by the accepting server instance, per
//! spec) is not itself modeled as a struct here — its lifecycle and state
//! machine live in `voice-translate-server::session::SessionController`,
//! since that's where the behavior is. What belongs in this shared crate
//! is the data that flows *through* a session: its static configuration,
//! and the `Utterance` / `TranslationResult` / `SynthesisFrame` trio that
//! moves from recognition to translation to synthesis, one at a time.

use crate::audio::AudioFormat;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Opaque per-connection identifier, used only for logging/metrics labels.
pub type SessionId = uuid::Uuid;

/// Static per-channel configuration, fixed at session creation and never
/// mutated afterwards (§3 "Session" attributes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Human-readable channel label, e.g. "ES" or "EN".
    pub channel: String,
    /// BCP-47 source locale, e.g. "es-ES".
    pub source_locale: String,
    /// Target language primary tag, e.g. "en".
    pub target_lang: String,
    /// Synthesis voice identifier understood by the TTS provider.
    pub voice: String,
    /// PCM format shared by uplink capture and downlink synthesis.
    pub audio_format: AudioFormat,
}

/// A finalized, trimmed, non-empty source-language utterance (§3).
///
/// `sequence` is assigned when the utterance is dequeued by the Session
/// Controller (not at recognition time) — see §4.8: "sequence numbers are
/// assigned on dequeue."
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub sequence: u64,
}

/// The target-language string produced from an `Utterance`. Inherits its
/// sequence number so downstream stages never need a side lookup.
#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub text: String,
    pub sequence: u64,
}

/// One chunk of synthesized PCM for a given utterance sequence.
///
/// `is_last` marks the boundary the Session Controller uses to decide when
/// to clear `SpeakingFlag` and send `tts_end` (§3 invariant 1, §4.8).
#[derive(Debug, Clone)]
pub struct SynthesisFrame {
    pub sequence: u64,
    pub bytes: Arc<[u8]>,
    pub is_last: bool,
}

impl SynthesisFrame {
    pub fn frame(sequence: u64, bytes: Vec<u8>) -> Self {
        Self { sequence, bytes: bytes.into(), is_last: false }
    }

    pub fn last(sequence: u64, bytes: Vec<u8>) -> Self {
        Self { sequence, bytes: bytes.into(), is_last: true }
    }
}

/// The echo-suppression gate (§3 "SpeakingFlag", §4.8 "Echo interlock").
///
/// Written only by the Session Controller; read from the recognizer
/// callback path, which may run on a provider-owned thread — `SeqCst` is
/// used rather than a weaker ordering because this flag is the one piece
/// of state shared across that thread boundary, and the cost of a stray
/// false-negative (a hallucinated echo utterance reaching the queue) is an
/// audible audio artifact, not just a logging nit.
#[derive(Debug, Clone, Default)]
pub struct SpeakingFlag(Arc<AtomicBool>);

impl SpeakingFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaking_flag_defaults_clear() {
        let flag = SpeakingFlag::new();
        assert!(!flag.is_set());
        flag.set();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
    }

    #[test]
    fn speaking_flag_clones_share_state() {
        let flag = SpeakingFlag::new();
        let clone = flag.clone();
        flag.set();
        assert!(clone.is_set());
    }
}
