//! Raw linear PCM audio types.
//!
//! Everything in this bridge stays in raw, headerless, interleaved signed
//! 16-bit little-endian PCM end to end — there is no resampling stage,
//! because the session format is fixed at session-creation time and both
//! endpoints are expected to honor it (§3, §4.1 of the spec this is built
//! against).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The PCM format negotiated for a session. Fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl AudioFormat {
    pub const DEFAULT: Self = Self {
        sample_rate: 16_000,
        bits_per_sample: 16,
        channels: 1,
    };

    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize) / 8
    }

    /// Byte length of a chunk of the given duration at this format.
    pub fn chunk_bytes(&self, chunk_ms: u32) -> usize {
        (self.sample_rate as usize * chunk_ms as usize / 1000)
            * self.channels as usize
            * self.bytes_per_sample()
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An immutable chunk of raw PCM bytes, as produced by the Audio Edge and
/// consumed by the Recognizer Adapter (or, on the downlink, produced by the
/// Synthesis Stage and consumed by the Audio Sink Sequencer).
///
/// Cheap to clone: the byte payload is reference-counted.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub bytes: Arc<[u8]>,
}

impl AudioChunk {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for AudioChunk {
    fn from(v: Vec<u8>) -> Self {
        Self { bytes: v.into() }
    }
}
