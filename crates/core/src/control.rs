//! The JSON control-frame protocol exchanged over the server↔edge transport.
//!
//! One enum, tagged on `type`, matches §4.2 of the spec byte for byte so
//! that the server and edge (and tests, which construct these directly)
//! never drift out of sync on field names.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlFrame {
    /// Sent once, server→client, right after session initialization.
    Ready { channel: String },
    /// Sent server→client per finalized utterance.
    Stt { text: String },
    /// Sent server→client once translation succeeds.
    Translate { text: String },
    /// Synthesis boundary marker: the binary frames that follow (until
    /// `TtsEnd`) belong to the utterance just announced.
    TtsStart,
    /// Synthesis boundary marker: no more binary frames for this utterance.
    TtsEnd,
    /// Non-fatal stage failure. The session remains open.
    Error { error: String },
    /// The recognizer reported a cancellation (provider session dropped).
    SttCanceled { reason: String },
}

impl ControlFrame {
    pub fn to_json(&self) -> String {
        // Control frames are constructed internally from valid data; a
        // serialization failure here would be a programming error, not a
        // runtime condition callers should handle.
        serde_json::to_string(self).expect("ControlFrame must serialize")
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_frame_matches_wire_shape() {
        let frame = ControlFrame::Ready { channel: "ES".into() };
        assert_eq!(frame.to_json(), r#"{"type":"ready","channel":"ES"}"#);
    }

    #[test]
    fn error_frame_round_trips() {
        let frame = ControlFrame::Error { error: "boom".into() };
        let json = frame.to_json();
        let back = ControlFrame::from_json(&json).unwrap();
        assert_eq!(frame, back);
    }

    #[test]
    fn stt_and_translate_use_text_field() {
        let stt = ControlFrame::Stt { text: "hola mundo".into() };
        assert_eq!(stt.to_json(), r#"{"type":"stt","text":"hola mundo"}"#);

        let translate = ControlFrame::Translate { text: "hello world".into() };
        assert_eq!(
            translate.to_json(),
            r#"{"type":"translate","text":"hello world"}"#
        );
    }
}
