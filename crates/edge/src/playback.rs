//! Audio Sink Sequencer (§4.9, client side).
//!
//! A single persistent output stream services both wire shapes the
//! Synthesis Stage can produce: raw PCM frames (the streaming path) are
//! appended to the ring buffer as-is; a RIFF/WAV buffer (the one-shot
//! fallback, identified by its magic bytes) is decoded first. Routing both
//! through the same ring buffer is what gives the "no overlap" guarantee
//! for free — there is only ever one sink to write into.

use std::collections::VecDeque;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use parking_lot::Mutex;

use voice_translate_core::AudioFormat;

use crate::device;
use crate::error::EdgeError;

/// Bound on buffered-but-unplayed samples, sized generously above one
/// synthesis utterance so a slow playback device can't grow memory
/// unboundedly (§8 property 5, "bounded memory").
const MAX_BUFFERED_SAMPLES: usize = 16 * 16_000; // ~16s at 16kHz mono

pub struct PlaybackSink {
    buffer: Arc<Mutex<VecDeque<i16>>>,
    channels: u16,
    _stream: cpal::Stream,
}

impl PlaybackSink {
    pub fn start(device_id: &str, format: AudioFormat) -> Result<Self, EdgeError> {
        let device = device::find_output(device_id)?;
        let config = StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let buffer = Arc::new(Mutex::new(VecDeque::<i16>::new()));
        let callback_buffer = buffer.clone();

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [i16], _| {
                let mut buf = callback_buffer.lock();
                for sample in data.iter_mut() {
                    *sample = buf.pop_front().unwrap_or(0);
                }
            },
            move |err| {
                // §7 PlaybackFailed: drop current frames, keep the session
                // alive. The next `push` simply resumes filling the buffer.
                tracing::warn!(error = %err, "playback stream error");
            },
            None,
        )?;

        stream.play()?;

        Ok(Self { buffer, channels: format.channels, _stream: stream })
    }

    /// Appends one downlink binary frame's samples to the playback queue.
    pub fn push(&self, bytes: &[u8]) {
        let samples = if is_riff_wav(bytes) {
            decode_wav(bytes, self.channels())
        } else {
            decode_raw_pcm(bytes)
        };

        let mut buf = self.buffer.lock();
        buf.extend(samples);
        if buf.len() > MAX_BUFFERED_SAMPLES {
            let overflow = buf.len() - MAX_BUFFERED_SAMPLES;
            tracing::warn!(overflow, "playback buffer overflow, dropping oldest samples");
            buf.drain(..overflow);
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn is_riff_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn decode_raw_pcm(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Decodes a one-shot WAV buffer (§4.7 fallback path) into samples for the
/// playback ring buffer. There is no resampling/remixing stage (§3), so a
/// WAV whose own channel count disagrees with the sink's configured output
/// is logged rather than silently interleaved wrong.
fn decode_wav(bytes: &[u8], expected_channels: u16) -> Vec<i16> {
    match hound::WavReader::new(std::io::Cursor::new(bytes)) {
        Ok(mut reader) => {
            let wav_channels = reader.spec().channels;
            if wav_channels != expected_channels {
                tracing::warn!(
                    wav_channels,
                    expected_channels,
                    "WAV playback buffer channel count does not match the open output stream"
                );
            }
            reader.samples::<i16>().filter_map(Result::ok).collect()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode WAV playback buffer");
            Vec::new()
        }
    }
}
