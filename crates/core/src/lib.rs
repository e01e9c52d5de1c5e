//! Shared types and trait seams for the speech translation bridge.
//!
//! This crate has no I/O of its own. It defines:
//! - the wire-level audio/control types shared by the server and edge binaries (`audio`, `control`)
//! - the per-session data model (`session`)
//! - the trait seams a provider adapter must implement (`traits`)
//! - the one error type those seams return (`error`)

pub mod audio;
pub mod control;
pub mod error;
pub mod session;
pub mod traits;

pub use audio::{AudioFormat, AudioChunk};
pub use control::ControlFrame;
pub use error::CoreError;
pub use session::{ChannelConfig, SessionId, SpeakingFlag, SynthesisFrame, TranslationResult, Utterance};
pub use traits::{RecognizerEvent, SpeechToText, SynthesisEvent, TextToSpeech, Translator};
