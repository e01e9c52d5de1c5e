//! Cloud provider adapters implementing the `voice-translate-core` trait
//! seams: [`stt::SttAdapter`] for speech recognition, [`translate::TranslateAdapter`]
//! for text translation, and [`tts::TtsAdapter`] for speech synthesis.

pub mod error;
pub mod stt;
pub mod translate;
pub mod tts;

pub use error::ProviderError;
pub use stt::SttAdapter;
pub use translate::TranslateAdapter;
pub use tts::TtsAdapter;
