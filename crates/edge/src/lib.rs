//! Audio Edge client (§4.1, §4.9, §6 "Edge command surface").
//!
//! Bridges one physical capture/playback device pair to one channel
//! server's WebSocket session: `capture` turns microphone audio into
//! uplink binary frames, `transport` owns the WebSocket connection, and
//! `playback` sequences downlink frames onto the output device without
//! overlap.

pub mod capture;
pub mod device;
pub mod error;
pub mod playback;
pub mod transport;

pub use error::EdgeError;
