//! Audio Edge capture half (§4.1).
//!
//! Opens the capture device in interleaved signed-16-bit PCM at the
//! session's format and hands off fixed-size chunks as they accumulate.
//! `cpal`'s callback runs on a device-owned thread, never the Tokio
//! runtime, so it only ever does a bounded `Vec` push and an unbounded
//! channel send — nothing that can block.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tokio::sync::mpsc;

use voice_translate_core::AudioFormat;

use crate::device;
use crate::error::EdgeError;

/// Owns the live input stream. Audio stops the instant this is dropped.
pub struct CaptureStream {
    _stream: cpal::Stream,
}

/// Starts capturing from `device_id`, sending one `Vec<u8>` of raw PCM per
/// `chunk_ms` worth of audio to `chunk_tx`. Stream-level failures (device
/// unplugged, driver error) are reported on `error_tx` rather than by
/// panicking the audio thread — `main` decides whether to retry (§4.1
/// "capture device read returns empty... retry with short backoff").
pub fn start(
    device_id: &str,
    format: AudioFormat,
    chunk_ms: u32,
    chunk_tx: mpsc::UnboundedSender<Vec<u8>>,
    error_tx: mpsc::UnboundedSender<String>,
) -> Result<CaptureStream, EdgeError> {
    let device = device::find_input(device_id)?;
    let config = StreamConfig {
        channels: format.channels,
        sample_rate: cpal::SampleRate(format.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let chunk_bytes = format.chunk_bytes(chunk_ms);
    let mut pending: Vec<u8> = Vec::with_capacity(chunk_bytes * 2);

    let supported = device
        .supported_input_configs()
        .map_err(|e| EdgeError::Device(e.to_string()))?
        .find(|c| c.sample_format() == SampleFormat::I16)
        .map(|_| SampleFormat::I16)
        .unwrap_or(SampleFormat::F32);

    let stream = match supported {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| {
                for sample in data {
                    pending.extend_from_slice(&sample.to_le_bytes());
                }
                flush_complete_chunks(&mut pending, chunk_bytes, &chunk_tx);
            },
            move |err| {
                tracing::warn!(error = %err, "capture stream error");
                let _ = error_tx.send(err.to_string());
            },
            None,
        )?,
        _ => device.build_input_stream(
            &config,
            move |data: &[f32], _| {
                for sample in data {
                    let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    pending.extend_from_slice(&pcm.to_le_bytes());
                }
                flush_complete_chunks(&mut pending, chunk_bytes, &chunk_tx);
            },
            move |err| {
                tracing::warn!(error = %err, "capture stream error");
                let _ = error_tx.send(err.to_string());
            },
            None,
        )?,
    };

    stream.play()?;
    Ok(CaptureStream { _stream: stream })
}

fn flush_complete_chunks(
    pending: &mut Vec<u8>,
    chunk_bytes: usize,
    chunk_tx: &mpsc::UnboundedSender<Vec<u8>>,
) {
    while pending.len() >= chunk_bytes {
        let chunk: Vec<u8> = pending.drain(..chunk_bytes).collect();
        // The session's ingress buffer applies the real backpressure (§4.3);
        // this send can only fail once the session has already torn down,
        // at which point dropping the chunk is correct.
        let _ = chunk_tx.send(chunk);
    }
}
