//! Provider trait seams (§4.4, §4.6, §4.7 of the spec).
//!
//! Each provider adapter crate (`voice-translate-providers`) implements
//! these against a specific vendor API. The Session Controller and tests
//! depend only on these traits, never on a concrete provider.

mod speech;
mod translate;
mod synthesis;

pub use speech::{RecognizerEvent, SpeechToText};
pub use translate::Translator;
pub use synthesis::{SynthesisEvent, TextToSpeech};
